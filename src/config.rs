//! Report configuration: where result files are read from and charts go.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed file layout of a report run, relative to `root`.
///
/// Fields left out when deserializing take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub root: PathBuf,
    pub arity_input: PathBuf,
    pub arity_chart: PathBuf,
    pub quicksort_input: PathBuf,
    pub mergesort_input: PathBuf,
    pub graphics_dir: PathBuf,
    /// Pixel size of the arity chart.
    pub arity_chart_size: (u32, u32),
    /// Pixel size of each sweep chart.
    pub sweep_chart_size: (u32, u32),
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            arity_input: PathBuf::from("results/arity_results.txt"),
            arity_chart: PathBuf::from("results/arity_plot.png"),
            quicksort_input: PathBuf::from("results/quicksort_results.csv"),
            mergesort_input: PathBuf::from("results/mergesort_results.csv"),
            graphics_dir: PathBuf::from("results/graphics"),
            arity_chart_size: (1000, 600),
            sweep_chart_size: (1200, 600),
        }
    }
}

impl ReportConfig {
    /// Default layout under another directory.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn arity_input_path(&self) -> PathBuf {
        self.resolve(&self.arity_input)
    }

    pub fn arity_chart_path(&self) -> PathBuf {
        self.resolve(&self.arity_chart)
    }

    pub fn quicksort_input_path(&self) -> PathBuf {
        self.resolve(&self.quicksort_input)
    }

    pub fn mergesort_input_path(&self) -> PathBuf {
        self.resolve(&self.mergesort_input)
    }

    pub fn graphics_path(&self, file: &str) -> PathBuf {
        self.resolve(&self.graphics_dir).join(file)
    }
}
