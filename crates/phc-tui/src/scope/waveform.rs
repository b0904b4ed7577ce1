use ratatui::{
    style::Style,
    widgets::{Axis, GraphType},
};

use super::{CanvasSize, DataSet, Dimension, DisplayMode, GraphConfig};

/// Line waveform across the full canvas width, closed at mid-height on the
/// right edge.
#[derive(Debug, Default)]
pub struct Waveform;

/// Map time-domain bytes to canvas points: sample `i` at
/// `x = i * width / len`, `y = (b / 128) * height / 2`.
pub fn waveform_points(data: &[u8], size: CanvasSize) -> Vec<(f64, f64)> {
    let mut pts = Vec::with_capacity(data.len() + 1);
    if data.is_empty() {
        return pts;
    }
    let slice_width = size.width / data.len() as f64;
    let mut x = 0.0;
    for &b in data {
        let v = f64::from(b) / 128.0;
        pts.push((x, v * size.height / 2.0));
        x += slice_width;
    }
    pts.push((size.width, size.height / 2.0));
    pts
}

impl DisplayMode for Waveform {
    fn axis(&self, cfg: &GraphConfig, size: CanvasSize, dimension: Dimension) -> Axis<'_> {
        let bounds = match dimension {
            Dimension::X => [0.0, size.width],
            Dimension::Y => [0.0, size.height],
        };
        Axis::default()
            .style(Style::default().fg(cfg.axis_color))
            .bounds(bounds)
    }

    fn process(&mut self, cfg: &GraphConfig, size: CanvasSize, data: &[u8]) -> Vec<DataSet> {
        vec![DataSet {
            data: waveform_points(data, size),
            marker_type: cfg.marker_type,
            graph_type: GraphType::Line,
            color: cfg.color,
        }]
    }
}
