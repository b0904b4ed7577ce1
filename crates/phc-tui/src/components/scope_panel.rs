use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{Block, Chart, Dataset},
    Frame,
};

use crate::app_state::AppState;
use crate::audio::SharedAnalyser;
use crate::scope::{waveform::Waveform, CanvasSize, DataSet, Dimension, DisplayMode, GraphConfig};

/// Waveform strip fed from the shared analyser.
///
/// `capture()` is called once per draw-loop frame; `draw()` only renders the
/// last capture, so nothing moves while the loop is cancelled.
pub struct ScopePanel {
    analyser: SharedAnalyser,
    waveform: Waveform,
    graph_cfg: GraphConfig,
    bytes: Vec<u8>,
}

impl ScopePanel {
    pub fn new(analyser: SharedAnalyser) -> Self {
        let len = analyser
            .lock()
            .map(|a| a.frequency_bin_count())
            .unwrap_or(crate::scope::analyser::FFT_SIZE / 2);
        Self {
            analyser,
            waveform: Waveform,
            graph_cfg: GraphConfig::default(),
            bytes: vec![128; len],
        }
    }

    /// Copy the analyser's current time-domain bytes.
    pub fn capture(&mut self) {
        if let Ok(a) = self.analyser.lock() {
            a.byte_time_domain(&mut self.bytes);
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let palette = &state.palette;
        self.graph_cfg.color = palette.visualizer;
        self.graph_cfg.axis_color = palette.bg;

        let size = CanvasSize::for_area(area.width, area.height);
        let datasets: Vec<DataSet> = self.waveform.process(&self.graph_cfg, size, &self.bytes);
        let ratatui_datasets: Vec<Dataset> = datasets.iter().map(|ds| ds.into()).collect();

        let x_axis = self.waveform.axis(&self.graph_cfg, size, Dimension::X);
        let y_axis = self.waveform.axis(&self.graph_cfg, size, Dimension::Y);

        let chart = Chart::new(ratatui_datasets)
            .block(Block::default().style(Style::default().bg(palette.bg)))
            .x_axis(x_axis)
            .y_axis(y_axis);

        frame.render_widget(chart, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::analyser::Analyser;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_capture_reads_analyser() {
        let analyser = Arc::new(Mutex::new(Analyser::default()));
        let mut panel = ScopePanel::new(Arc::clone(&analyser));
        assert_eq!(panel.bytes.len(), 128);
        assert!(panel.bytes.iter().all(|&b| b == 128));

        analyser.lock().unwrap().push(&[1.0; 256]);
        // Not visible until the next frame captures it.
        assert_eq!(panel.bytes[0], 128);
        panel.capture();
        assert!(panel.bytes.iter().all(|&b| b == 255));
    }
}
