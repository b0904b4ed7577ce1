//! Stream-title parsing and the now-playing value.
//!
//! The feed carries one free-text field per message, usually
//! `"<artist> - <title>"`. Ad breaks and station idents come through the same
//! field, so parsing distinguishes a real track from a "connecting" state.

use serde::{Deserialize, Serialize};

use crate::config::StationConfig;

/// Artwork shown until the search API resolves a real cover.
pub const DEFAULT_ALBUM_ART: &str = "https://www.svgrepo.com/show/512532/music-1005.svg";

/// Title shown while the feed has nothing playable.
pub const CONNECTING_TITLE: &str = "Connecting...";

const SEPARATOR: &str = " - ";

/// What the player displays as the current track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlaying {
    pub artist: String,
    pub title: String,
    pub album_art_url: String,
}

impl Default for NowPlaying {
    /// Disconnected placeholder: blank text, default artwork.
    fn default() -> Self {
        Self {
            artist: String::new(),
            title: String::new(),
            album_art_url: DEFAULT_ALBUM_ART.to_string(),
        }
    }
}

impl NowPlaying {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            album_art_url: DEFAULT_ALBUM_ART.to_string(),
        }
    }

    /// True when nothing has been committed yet.
    pub fn is_blank(&self) -> bool {
        self.artist.is_empty() && self.title.is_empty()
    }

    pub fn has_default_art(&self) -> bool {
        self.album_art_url == DEFAULT_ALBUM_ART
    }
}

/// The station's identity as it appears in the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationIdentity {
    pub name: String,
    pub short_name: String,
    pub ad_marker: String,
}

impl Default for StationIdentity {
    fn default() -> Self {
        Self::from(&StationConfig::default())
    }
}

impl From<&StationConfig> for StationIdentity {
    fn from(cfg: &StationConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            short_name: cfg.short_name.clone(),
            ad_marker: cfg.ad_marker.clone(),
        }
    }
}

/// Result of parsing one raw stream title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTitle {
    /// Empty title, ad break or station ident. Never committed.
    Connecting,
    Track(NowPlaying),
}

impl ParsedTitle {
    /// Displayable value; the connecting state renders as the station
    /// placeholder.
    pub fn to_now_playing(&self, station: &StationIdentity) -> NowPlaying {
        match self {
            Self::Connecting => NowPlaying::new(station.short_name.clone(), CONNECTING_TITLE),
            Self::Track(np) => np.clone(),
        }
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }
}

/// Parse a raw stream title into artist/title.
///
/// `"A - B - C"` yields artist `A` and title `B - C`. Without a separator the
/// whole string is used for both fields.
pub fn parse_stream_title(raw: &str, station: &StationIdentity) -> ParsedTitle {
    if raw.trim().is_empty()
        || (!station.ad_marker.is_empty() && raw.contains(&station.ad_marker))
        || (!station.name.is_empty() && raw.contains(&station.name))
    {
        return ParsedTitle::Connecting;
    }

    let (head, tail) = match raw.split_once(SEPARATOR) {
        Some((head, tail)) => (head, Some(tail)),
        None => (raw, None),
    };

    let artist = match head.trim() {
        "" => station.short_name.clone(),
        a => a.to_string(),
    };
    let title = match tail.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => raw.trim().to_string(),
    };

    ParsedTitle::Track(NowPlaying::new(artist, title))
}
