//! Metadata ingestion: feed message → dedup → parse → commit → enrichment key.
//!
//! The pipeline is a plain state holder driven by the UI loop. It never awaits;
//! the caller owns the debounce timer and the lookups, and hands results back
//! through [`MetadataPipeline::apply_enrichment`].

use chrono::Local;
use serde::Deserialize;
use thiserror::Error;

use crate::enrich::Enrichment;
use crate::history::History;
use crate::metadata::{parse_stream_title, NowPlaying, ParsedTitle, StationIdentity};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed feed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// JSON carried in each feed message's `data` field.
#[derive(Debug, Deserialize)]
pub struct FeedEnvelope {
    #[serde(rename = "streamTitle")]
    pub stream_title: Option<String>,
}

/// A lookup to run once the debounce elapses, keyed by what was playing when
/// it was scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichRequest {
    pub search_term: String,
    pub title: String,
    pub artist: String,
}

/// What one enrichment result changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteBack {
    pub now_playing_art: bool,
    pub history_art: usize,
    pub history_details: usize,
}

impl WriteBack {
    pub fn changed(&self) -> bool {
        self.now_playing_art || self.history_art > 0 || self.history_details > 0
    }
}

#[derive(Debug)]
pub struct MetadataPipeline {
    station: StationIdentity,
    /// Latest accepted raw title, pending processing.
    stream_title: Option<String>,
    /// Raw title whose commit has completed.
    last_processed: Option<String>,
    now_playing: NowPlaying,
    history: History,
}

impl MetadataPipeline {
    pub fn new(station: StationIdentity, history_limit: usize) -> Self {
        Self {
            station,
            stream_title: None,
            last_processed: None,
            now_playing: NowPlaying::default(),
            history: History::new(history_limit),
        }
    }

    pub fn station(&self) -> &StationIdentity {
        &self.station
    }

    pub fn now_playing(&self) -> &NowPlaying {
        &self.now_playing
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn stream_title(&self) -> Option<&str> {
        self.stream_title.as_deref()
    }

    pub fn last_processed(&self) -> Option<&str> {
        self.last_processed.as_deref()
    }

    /// Accept one feed payload. `Ok(true)` when it carries a new raw title.
    ///
    /// Malformed payloads are rejected without touching dedup state.
    pub fn ingest(&mut self, data: &str) -> Result<bool, IngestError> {
        let envelope: FeedEnvelope = serde_json::from_str(data)?;
        let Some(raw) = envelope.stream_title.filter(|t| !t.is_empty()) else {
            return Ok(false);
        };
        if self.last_processed.as_deref() == Some(raw.as_str()) {
            return Ok(false);
        }
        self.stream_title = Some(raw);
        Ok(true)
    }

    /// Commit the pending raw title. Returns the lookup to debounce, if any.
    ///
    /// The connecting sentinel commits nothing and schedules nothing.
    pub fn process(&mut self) -> Option<EnrichRequest> {
        let raw = self.stream_title.clone()?;
        if self.last_processed.as_deref() == Some(raw.as_str()) {
            return None;
        }

        let track = match parse_stream_title(&raw, &self.station) {
            ParsedTitle::Connecting => {
                tracing::debug!("feed sentinel, not committing: {:?}", raw);
                return None;
            }
            ParsedTitle::Track(track) => track,
        };

        self.now_playing = track.clone();
        self.last_processed = Some(raw.clone());

        if let Some(id) = self
            .history
            .record(&track.title, &track.artist, Local::now())
        {
            tracing::info!("history {}: {} - {}", id, track.artist, track.title);
        }

        Some(EnrichRequest {
            search_term: raw,
            title: track.title,
            artist: track.artist,
        })
    }

    /// `ingest` followed by `process` when the payload was new.
    pub fn handle_message(&mut self, data: &str) -> Result<Option<EnrichRequest>, IngestError> {
        if self.ingest(data)? {
            Ok(self.process())
        } else {
            Ok(None)
        }
    }

    /// Apply a finished lookup against whatever is current now.
    pub fn apply_enrichment(&mut self, req: &EnrichRequest, found: &Enrichment) -> WriteBack {
        let mut wb = WriteBack::default();

        if let Some(url) = &found.artwork_url {
            if self.now_playing.title == req.title {
                self.now_playing.album_art_url = url.clone();
                wb.now_playing_art = true;
            }
            wb.history_art = self.history.apply_artwork(&req.title, url);
        }

        wb.history_details = self
            .history
            .apply_details(&req.title, &req.artist, found);

        wb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MAX_HISTORY;
    use crate::metadata::DEFAULT_ALBUM_ART;

    fn pipeline() -> MetadataPipeline {
        MetadataPipeline::new(StationIdentity::default(), MAX_HISTORY)
    }

    fn msg(title: &str) -> String {
        serde_json::json!({ "streamTitle": title }).to_string()
    }

    fn art(url: &str) -> Enrichment {
        Enrichment {
            artwork_url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_commit_track() {
        let mut p = pipeline();
        let req = p.handle_message(&msg("Artist - Song Title")).unwrap().unwrap();
        assert_eq!(req.title, "Song Title");
        assert_eq!(req.artist, "Artist");
        assert_eq!(req.search_term, "Artist - Song Title");
        assert_eq!(p.now_playing().title, "Song Title");
        assert_eq!(p.last_processed(), Some("Artist - Song Title"));
        assert_eq!(p.history().len(), 1);
    }

    #[test]
    fn test_repeated_raw_title_is_ignored() {
        let mut p = pipeline();
        p.handle_message(&msg("A - One")).unwrap();
        let before_np = p.now_playing().clone();
        let before_hist = p.history().entries().to_vec();

        assert!(p.handle_message(&msg("A - One")).unwrap().is_none());
        assert!(!p.ingest(&msg("A - One")).unwrap());
        assert!(p.process().is_none());

        assert_eq!(p.now_playing(), &before_np);
        assert_eq!(p.history().entries(), before_hist.as_slice());
    }

    #[test]
    fn test_sentinels_commit_nothing() {
        let mut p = pipeline();
        for raw in ["ADVERTISEMENT", "PHC Radio - Live", "Welcome to PHC Radio"] {
            assert!(p.handle_message(&msg(raw)).unwrap().is_none());
        }
        assert!(p.history().is_empty());
        assert!(p.now_playing().is_blank());
        assert!(p.last_processed().is_none());
    }

    #[test]
    fn test_whitespace_title_commits_nothing() {
        let mut p = pipeline();
        p.handle_message(&msg("A - One")).unwrap();
        assert!(p.ingest(&msg("   ")).unwrap());
        assert!(p.process().is_none());
        assert_eq!(p.now_playing().title, "One");
        assert_eq!(p.last_processed(), Some("A - One"));
        assert_eq!(p.history().len(), 1);
    }

    #[test]
    fn test_empty_or_missing_title_is_ignored() {
        let mut p = pipeline();
        assert!(!p.ingest(&msg("")).unwrap());
        assert!(!p.ingest(r#"{"other": 1}"#).unwrap());
        assert!(p.stream_title().is_none());
    }

    #[test]
    fn test_malformed_keeps_dedup_state() {
        let mut p = pipeline();
        p.handle_message(&msg("A - One")).unwrap();
        assert!(p.handle_message("not json").is_err());
        assert_eq!(p.last_processed(), Some("A - One"));
        assert!(p.handle_message(&msg("A - One")).unwrap().is_none());
    }

    #[test]
    fn test_same_song_reannounced_is_one_entry() {
        let mut p = pipeline();
        p.handle_message(&msg("A - One")).unwrap();
        // Different raw text, same parsed (title, artist).
        let req = p.handle_message(&msg("  A - One  ")).unwrap();
        assert!(req.is_some());
        assert_eq!(p.history().len(), 1);
    }

    #[test]
    fn test_history_bounded_under_volume() {
        let mut p = pipeline();
        for i in 0..100 {
            p.handle_message(&msg(&format!("Artist - Song {i}"))).unwrap();
        }
        assert_eq!(p.history().len(), MAX_HISTORY);
        assert_eq!(p.history().entries()[0].title, "Song 99");
    }

    #[test]
    fn test_stale_enrichment_spares_now_playing() {
        let mut p = pipeline();
        let first = p.handle_message(&msg("A - One")).unwrap().unwrap();
        p.handle_message(&msg("B - Two")).unwrap();
        p.handle_message(&msg("C - Three")).unwrap();

        let wb = p.apply_enrichment(&first, &art("https://img/one.jpg"));
        assert!(!wb.now_playing_art);
        assert_eq!(wb.history_art, 1);
        assert_eq!(p.now_playing().album_art_url, DEFAULT_ALBUM_ART);

        let one = p
            .history()
            .entries()
            .iter()
            .find(|e| e.title == "One")
            .unwrap();
        assert_eq!(one.album_art_url.as_deref(), Some("https://img/one.jpg"));
    }

    #[test]
    fn test_current_enrichment_updates_now_playing() {
        let mut p = pipeline();
        let req = p.handle_message(&msg("A - One")).unwrap().unwrap();
        let wb = p.apply_enrichment(
            &req,
            &Enrichment {
                artwork_url: Some("https://img/one.jpg".into()),
                genre: Some("Soul".into()),
                release_year: Some(1972),
                album_name: None,
            },
        );
        assert!(wb.changed());
        assert_eq!(p.now_playing().album_art_url, "https://img/one.jpg");
        let head = p.history().head().unwrap();
        assert_eq!(head.genre.as_deref(), Some("Soul"));
        assert_eq!(head.release_year, Some(1972));
    }

    #[test]
    fn test_enrichment_without_artwork_writes_no_artwork() {
        let mut p = pipeline();
        let req = p.handle_message(&msg("A - One")).unwrap().unwrap();
        let wb = p.apply_enrichment(&req, &Enrichment::default());
        assert!(!wb.now_playing_art);
        assert_eq!(wb.history_art, 0);
        assert_eq!(p.now_playing().album_art_url, DEFAULT_ALBUM_ART);
        assert!(p.history().head().unwrap().album_art_url.is_none());
    }
}
