//! Static Chart Renderer
//! Draws line charts into an RGB buffer with plotters and persists them as PNG.
//!
//! Layout:
//! 1. Optional caption centered on top
//! 2. Cartesian plot, linear x-axis, linear or logarithmic y-axis
//! 3. One line per series with its own color and marker
//! 4. Legend box (upper right) when more than one series is drawn

use image::{ImageError, ImageFormat, RgbImage};
use plotters::coord::ranged1d::{Ranged, ValueFormatter};
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::register_font;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, info};

/// Shipped with the crate so output never depends on host fonts.
const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
const FONT_FAMILY: &str = "sans-serif";

// Series colors, cycled in supply order
const PALETTE: [RGBColor; 4] = [
    RGBColor(91, 155, 213), // Blue
    RGBColor(237, 125, 49), // Orange
    RGBColor(112, 173, 71), // Green
    RGBColor(155, 89, 182), // Purple
];

const MARKER_SIZE: i32 = 5;
/// Fraction of the data span added on each side of an axis.
const AXIS_PADDING: f64 = 0.05;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("series `{series}` has point ({x}, {y}) outside the {scale} y-axis domain: {reason}")]
    InvalidScaleDomain {
        series: String,
        x: f64,
        y: f64,
        scale: YScale,
        reason: &'static str,
    },
    #[error("failed to draw chart: {0}")]
    Draw(String),
    #[error("failed to encode chart image: {0}")]
    Encode(String),
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YScale {
    #[default]
    Linear,
    Log,
}

impl fmt::Display for YScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YScale::Linear => write!(f, "linear"),
            YScale::Log => write!(f, "logarithmic"),
        }
    }
}

/// Point marker, assigned by series position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
    Cross,
}

impl Marker {
    const CYCLE: [Marker; 4] = [Marker::Circle, Marker::Square, Marker::Triangle, Marker::Cross];

    pub fn for_index(idx: usize) -> Self {
        Self::CYCLE[idx % Self::CYCLE.len()]
    }
}

/// A named line of `(x, y)` points, drawn in the given order.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Everything about a chart except its data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub y_scale: YScale,
    pub grid: bool,
    /// Width and height in pixels.
    pub size: (u32, u32),
}

impl ChartSpec {
    pub fn new(x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: None,
            x_label: x_label.into(),
            y_label: y_label.into(),
            y_scale: YScale::Linear,
            grid: false,
            size: (1200, 600),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_grid(mut self, grid: bool) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_y_scale(mut self, scale: YScale) -> Self {
        self.y_scale = scale;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render `series` with `spec` and write the PNG to `path`.
    ///
    /// The target is replaced atomically: the image is written to a temporary
    /// file next to it and renamed over it only once fully encoded. Nothing
    /// touches the filesystem if validation or drawing fails.
    pub fn render(spec: &ChartSpec, series: &[Series], path: &Path) -> Result<(), RenderError> {
        Self::validate(spec, series)?;

        let (width, height) = spec.size;
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        Self::draw(spec, series, &mut buffer)?;

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Encode("pixel buffer does not match chart size".into()))?;
        Self::persist(&img, path)?;

        info!(
            path = %path.display(),
            series = series.len(),
            scale = %spec.y_scale,
            "chart written"
        );
        Ok(())
    }

    /// Reject coordinates the axis cannot show.
    pub fn validate(spec: &ChartSpec, series: &[Series]) -> Result<(), RenderError> {
        for s in series {
            for &(x, y) in &s.points {
                let reason = if !x.is_finite() || !y.is_finite() {
                    Some("coordinates must be finite")
                } else if spec.y_scale == YScale::Log && y <= 0.0 {
                    Some("log scale requires y > 0")
                } else {
                    None
                };

                if let Some(reason) = reason {
                    return Err(RenderError::InvalidScaleDomain {
                        series: s.name.clone(),
                        x,
                        y,
                        scale: spec.y_scale,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// Padded axis range covering `values`. Falls back to a fixed range when
    /// there is nothing to show.
    pub fn axis_range(values: impl IntoIterator<Item = f64>, scale: YScale) -> Range<f64> {
        let (min, max) = values
            .into_iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });

        if min > max {
            return match scale {
                YScale::Linear => 0.0..1.0,
                YScale::Log => 1.0..10.0,
            };
        }

        match scale {
            YScale::Linear => {
                if min == max {
                    let half = if min == 0.0 { 1.0 } else { min.abs() * 0.5 };
                    (min - half)..(max + half)
                } else {
                    let pad = (max - min) * AXIS_PADDING;
                    (min - pad)..(max + pad)
                }
            }
            YScale::Log => {
                if min == max {
                    (min / 2.0)..(max * 2.0)
                } else {
                    let (lo, hi) = (min.ln(), max.ln());
                    let pad = (hi - lo) * AXIS_PADDING;
                    (lo - pad).exp()..(hi + pad).exp()
                }
            }
        }
    }

    fn draw(spec: &ChartSpec, series: &[Series], buffer: &mut [u8]) -> Result<(), RenderError> {
        ensure_font()?;

        let x_range = Self::axis_range(
            series.iter().flat_map(|s| s.points.iter().map(|p| p.0)),
            YScale::Linear,
        );
        let y_range = Self::axis_range(
            series.iter().flat_map(|s| s.points.iter().map(|p| p.1)),
            spec.y_scale,
        );
        debug!(?x_range, ?y_range, "axis ranges");

        let root = BitMapBackend::with_buffer(buffer, spec.size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90);
        if let Some(title) = &spec.title {
            builder.caption(title, (FONT_FAMILY, 28));
        }

        match spec.y_scale {
            YScale::Linear => {
                let chart = builder
                    .build_cartesian_2d(x_range, y_range)
                    .map_err(draw_err)?;
                Self::draw_lines(chart, spec, series)?;
            }
            YScale::Log => {
                let chart = builder
                    .build_cartesian_2d(x_range, y_range.log_scale())
                    .map_err(draw_err)?;
                Self::draw_lines(chart, spec, series)?;
            }
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }

    fn draw_lines<'a, Y>(
        mut chart: ChartContext<'a, BitMapBackend<'a>, Cartesian2d<RangedCoordf64, Y>>,
        spec: &ChartSpec,
        series: &[Series],
    ) -> Result<(), RenderError>
    where
        Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
    {
        {
            let mut mesh = chart.configure_mesh();
            mesh.x_desc(spec.x_label.as_str())
                .y_desc(spec.y_label.as_str())
                .label_style((FONT_FAMILY, 16).into_font())
                .axis_desc_style((FONT_FAMILY, 20).into_font());
            if !spec.grid {
                mesh.disable_mesh();
            }
            mesh.draw().map_err(draw_err)?;
        }

        for (idx, s) in series.iter().enumerate() {
            let color = PALETTE[idx % PALETTE.len()];
            chart
                .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))
                .map_err(draw_err)?
                .label(s.name.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            Self::draw_markers(&mut chart, Marker::for_index(idx), &s.points, color)?;
            debug!(series = %s.name, points = s.points.len(), "series drawn");
        }

        if series.len() > 1 {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font((FONT_FAMILY, 16).into_font())
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(draw_err)?;
        }

        Ok(())
    }

    fn draw_markers<'a, Y>(
        chart: &mut ChartContext<'a, BitMapBackend<'a>, Cartesian2d<RangedCoordf64, Y>>,
        marker: Marker,
        points: &[(f64, f64)],
        color: RGBColor,
    ) -> Result<(), RenderError>
    where
        Y: Ranged<ValueType = f64>,
    {
        match marker {
            Marker::Circle => chart.draw_series(
                points
                    .iter()
                    .map(|&p| Circle::new(p, MARKER_SIZE, color.filled())),
            ),
            Marker::Square => chart.draw_series(points.iter().map(|&p| {
                EmptyElement::at(p)
                    + Rectangle::new(
                        [(-MARKER_SIZE, -MARKER_SIZE), (MARKER_SIZE, MARKER_SIZE)],
                        color.filled(),
                    )
            })),
            Marker::Triangle => chart.draw_series(
                points
                    .iter()
                    .map(|&p| TriangleMarker::new(p, MARKER_SIZE + 1, color.filled())),
            ),
            Marker::Cross => chart.draw_series(
                points
                    .iter()
                    .map(|&p| Cross::new(p, MARKER_SIZE, color.stroke_width(2))),
            ),
        }
        .map_err(draw_err)?;
        Ok(())
    }

    fn persist(img: &RgbImage, path: &Path) -> Result<(), RenderError> {
        let target = path.display().to_string();
        let write_failure = |source: io::Error| RenderError::WriteFailure {
            path: target.clone(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(write_failure)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".sortplot-")
            .suffix(".png")
            .tempfile_in(&dir)
            .map_err(write_failure)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            img.write_to(&mut writer, ImageFormat::Png)
                .map_err(|e| image_err(&target, e))?;
            writer.flush().map_err(write_failure)?;
        }
        // Temp files are owner-only; the chart keeps the mode of the file it
        // replaces, or the usual 0644 when new.
        let permissions = match fs::metadata(path) {
            Ok(meta) => Some(meta.permissions()),
            Err(_) => default_permissions(),
        };
        if let Some(permissions) = permissions {
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(write_failure)?;
        }
        tmp.as_file().sync_all().map_err(write_failure)?;
        tmp.persist(path).map_err(|e| write_failure(e.error))?;
        Ok(())
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

/// I/O errors raised while encoding are write failures, not codec failures.
fn image_err(path: &str, err: ImageError) -> RenderError {
    match err {
        ImageError::IoError(source) => RenderError::WriteFailure {
            path: path.to_string(),
            source,
        },
        other => RenderError::Encode(other.to_string()),
    }
}

fn draw_err<E: fmt::Display>(err: E) -> RenderError {
    RenderError::Draw(err.to_string())
}

fn ensure_font() -> Result<(), RenderError> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA)
                .map_err(|_| "bundled font rejected".to_string())
        })
        .clone()
        .map_err(RenderError::Draw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn markers_cycle_in_supply_order() {
        assert_eq!(Marker::for_index(0), Marker::Circle);
        assert_eq!(Marker::for_index(1), Marker::Square);
        assert_eq!(Marker::for_index(4), Marker::Circle);
    }

    #[rstest]
    #[case(vec![], YScale::Linear, 0.0..1.0)]
    #[case(vec![], YScale::Log, 1.0..10.0)]
    #[case(vec![0.0, 0.0], YScale::Linear, -1.0..1.0)]
    #[case(vec![4.0], YScale::Linear, 2.0..6.0)]
    #[case(vec![10.0, 0.0], YScale::Linear, -0.5..10.5)]
    #[case(vec![8.0], YScale::Log, 4.0..16.0)]
    fn axis_ranges(#[case] values: Vec<f64>, #[case] scale: YScale, #[case] expected: Range<f64>) {
        let range = StaticChartRenderer::axis_range(values, scale);
        assert!((range.start - expected.start).abs() < 1e-9, "{range:?}");
        assert!((range.end - expected.end).abs() < 1e-9, "{range:?}");
    }

    #[test]
    fn log_range_pads_in_log_space() {
        let range = StaticChartRenderer::axis_range(vec![10.0, 1000.0], YScale::Log);
        assert!(range.start > 0.0 && range.start < 10.0);
        assert!(range.end > 1000.0);
        assert!(((10.0f64.ln() - range.start.ln()) - (range.end.ln() - 1000.0f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn log_scale_rejects_zero() {
        let spec = ChartSpec::new("m", "I/Os (log)").with_y_scale(YScale::Log);
        let series = [Series::new("Quicksort", vec![(1.0, 5.0), (2.0, 0.0)])];
        let err = StaticChartRenderer::validate(&spec, &series).unwrap_err();
        match err {
            RenderError::InvalidScaleDomain { series, x, y, .. } => {
                assert_eq!(series, "Quicksort");
                assert_eq!((x, y), (2.0, 0.0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn linear_scale_accepts_zero_and_negatives() {
        let spec = ChartSpec::new("m", "I/Os");
        let series = [Series::new("Quicksort", vec![(1.0, 0.0), (2.0, -3.0)])];
        assert!(StaticChartRenderer::validate(&spec, &series).is_ok());
    }

    #[test]
    fn io_errors_while_encoding_are_write_failures() {
        let err = image_err("ios.png", ImageError::IoError(io::Error::other("disk full")));
        match err {
            RenderError::WriteFailure { path, source } => {
                assert_eq!(path, "ios.png");
                assert_eq!(source.to_string(), "disk full");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let spec = ChartSpec::new("m", "I/Os");
        let series = [Series::new("Mergesort", vec![(f64::NAN, 1.0)])];
        assert!(matches!(
            StaticChartRenderer::validate(&spec, &series),
            Err(RenderError::InvalidScaleDomain { .. })
        ));
    }
}
