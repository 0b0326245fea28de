//! Property tests for per-key aggregation.

use proptest::prelude::*;
use sortplot::data::schema::{IO_OPERATIONS, M, TIME_SECONDS};
use sortplot::data::{DataLoader, ResultTable, TableSchema};
use sortplot::stats::Aggregator;
use std::collections::BTreeSet;

fn table(rows: &[(f64, u32, f64)]) -> ResultTable {
    let mut csv = String::from("m,IO_operations,time_seconds\n");
    for (m, io, t) in rows {
        csv.push_str(&format!("{m},{io},{t}\n"));
    }
    DataLoader::parse_csv("generated.csv", &csv, &TableSchema::sweep()).expect("valid table")
}

fn row() -> impl Strategy<Value = (f64, u32, f64)> {
    (
        prop::sample::select(vec![0.5, 1.0, 2.0, 10.0, 64.0, 1024.0]),
        0u32..1_000_000,
        0.0f64..100.0,
    )
}

proptest! {
    #[test]
    fn groups_cover_every_row_once(rows in prop::collection::vec(row(), 0..60)) {
        let series = Aggregator::mean_by(&table(&rows), M).unwrap();

        let distinct: BTreeSet<u64> = rows.iter().map(|r| r.0.to_bits()).collect();
        prop_assert_eq!(series.len(), distinct.len());
        prop_assert_eq!(series.groups().iter().map(|g| g.count).sum::<usize>(), rows.len());

        let keys = series.keys();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn means_lie_within_group_bounds(rows in prop::collection::vec(row(), 1..60)) {
        let series = Aggregator::mean_by(&table(&rows), M).unwrap();
        let io = series.means(IO_OPERATIONS).unwrap();

        for (group, mean) in series.groups().iter().zip(io) {
            let values: Vec<f64> = rows
                .iter()
                .filter(|r| r.0 == group.key)
                .map(|r| f64::from(r.1))
                .collect();
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(mean >= lo - 1e-6 && mean <= hi + 1e-6);
        }
    }

    #[test]
    fn aggregation_is_deterministic(rows in prop::collection::vec(row(), 0..40)) {
        let table = table(&rows);
        let first = Aggregator::mean_by(&table, M).unwrap();
        let second = Aggregator::mean_by(&table, M).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn unique_keys_are_reproduced(
        keys in prop::collection::btree_set(1u32..10_000, 0..30),
        io in 0u32..1_000_000,
        time in 0.0f64..100.0,
    ) {
        let rows: Vec<(f64, u32, f64)> = keys
            .iter()
            .map(|&k| (f64::from(k), io + k, time + f64::from(k)))
            .collect();
        let series = Aggregator::mean_by(&table(&rows), M).unwrap();

        let expected_io: Vec<f64> = rows.iter().map(|r| f64::from(r.1)).collect();
        let expected_time: Vec<f64> = rows.iter().map(|r| r.2).collect();
        prop_assert_eq!(series.keys(), rows.iter().map(|r| r.0).collect::<Vec<_>>());
        prop_assert_eq!(series.means(IO_OPERATIONS).unwrap(), expected_io);
        prop_assert_eq!(series.means(TIME_SECONDS).unwrap(), expected_time);
    }
}
