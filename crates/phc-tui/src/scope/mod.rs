//! Waveform visualizer: analyser node, canvas sizing, and the chart mapping.

pub mod analyser;
pub mod waveform;

use ratatui::{
    style::{Color, Style},
    symbols::Marker,
    widgets::{Axis, Dataset, GraphType},
};

pub enum Dimension {
    X,
    Y,
}

#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub marker_type: Marker,
    pub color: Color,
    pub axis_color: Color,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            marker_type: Marker::Braille,
            color: Color::White,
            axis_color: Color::DarkGray,
        }
    }
}

/// Drawing surface in sub-cell dots. Braille packs 2×4 dots per cell, which
/// plays the role of the device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

pub const DOTS_PER_CELL_X: u16 = 2;
pub const DOTS_PER_CELL_Y: u16 = 4;

impl CanvasSize {
    pub fn for_area(cols: u16, rows: u16) -> Self {
        Self {
            width: f64::from(cols * DOTS_PER_CELL_X),
            height: f64::from(rows * DOTS_PER_CELL_Y),
        }
    }
}

pub trait DisplayMode {
    fn axis(&self, cfg: &GraphConfig, size: CanvasSize, dimension: Dimension) -> Axis<'_>;
    fn process(&mut self, cfg: &GraphConfig, size: CanvasSize, data: &[u8]) -> Vec<DataSet>;
}

pub struct DataSet {
    pub data: Vec<(f64, f64)>,
    pub marker_type: Marker,
    pub graph_type: GraphType,
    pub color: Color,
}

impl<'a> From<&'a DataSet> for Dataset<'a> {
    fn from(ds: &'a DataSet) -> Dataset<'a> {
        Dataset::default()
            .marker(ds.marker_type)
            .graph_type(ds.graph_type)
            .style(Style::default().fg(ds.color))
            .data(&ds.data)
    }
}
