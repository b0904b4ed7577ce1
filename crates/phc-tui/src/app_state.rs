//! AppState — shared read-only data passed to all components during render/event.
//!
//! Components read this but never mutate it.
//! The App event-loop is the only thing that writes to AppState.

use phc_core::pipeline::MetadataPipeline;
use phc_core::theme::Theme;

use crate::player::Player;
use crate::theme::Palette;

/// Metadata feed connection as last reported by the subscription task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedStatus {
    #[default]
    Closed,
    Connecting,
    Open,
    Reconnecting,
}

impl FeedStatus {
    pub fn label(self) -> &'static str {
        match self {
            FeedStatus::Closed => "offline",
            FeedStatus::Connecting => "connecting",
            FeedStatus::Open => "live",
            FeedStatus::Reconnecting => "reconnecting",
        }
    }
}

pub struct AppState {
    pub pipeline: MetadataPipeline,
    pub player: Player,
    pub theme: Theme,
    pub palette: Palette,
    pub feed_status: FeedStatus,
    /// Braille spinner frame, advanced on the UI tick.
    pub spinner_frame: usize,
    /// Full-height now-playing layout.
    pub expanded: bool,
}

impl AppState {
    pub fn new(pipeline: MetadataPipeline, player: Player, theme: Theme) -> Self {
        Self {
            pipeline,
            player,
            theme,
            palette: Palette::from(theme),
            feed_status: FeedStatus::Closed,
            spinner_frame: 0,
            expanded: false,
        }
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.palette = Palette::from(theme);
    }
}

#[cfg(test)]
impl AppState {
    pub fn for_tests() -> Self {
        use phc_core::metadata::StationIdentity;
        Self::new(
            MetadataPipeline::new(StationIdentity::default(), phc_core::history::MAX_HISTORY),
            Player::new(0.6),
            Theme::default(),
        )
    }
}
