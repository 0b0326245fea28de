//! Charts module - static chart rendering

mod renderer;

pub use renderer::{ChartSpec, Marker, RenderError, Series, StaticChartRenderer, YScale};
