use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::enrich::Enrichment;
use crate::metadata::DEFAULT_ALBUM_ART;

/// Most recent plays kept in memory.
pub const MAX_HISTORY: usize = 20;

/// Opaque, monotonically increasing entry id. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(u64);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: EntryId,
    pub title: String,
    pub artist: String,
    pub album_art_url: Option<String>,
    pub timestamp: Option<DateTime<Local>>,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub album_name: Option<String>,
}

impl HistoryEntry {
    pub fn matches(&self, title: &str, artist: &str) -> bool {
        self.title == title && self.artist == artist
    }

    /// Artwork may be replaced only while it is missing or the placeholder.
    fn has_placeholder_art(&self) -> bool {
        self.album_art_url
            .as_deref()
            .map_or(true, |url| url == DEFAULT_ALBUM_ART)
    }
}

/// Newest-first bounded play log.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    limit: usize,
    next_id: u64,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.clamp(1, MAX_HISTORY),
            next_id: 1,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn head(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    /// Prepend a play unless it repeats the head. Returns the new entry's id.
    pub fn record(
        &mut self,
        title: &str,
        artist: &str,
        timestamp: DateTime<Local>,
    ) -> Option<EntryId> {
        if self.head().is_some_and(|h| h.matches(title, artist)) {
            return None;
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;

        self.entries.insert(
            0,
            HistoryEntry {
                id,
                title: title.to_string(),
                artist: artist.to_string(),
                album_art_url: None,
                timestamp: Some(timestamp),
                genre: None,
                release_year: None,
                album_name: None,
            },
        );
        self.entries.truncate(self.limit);
        Some(id)
    }

    /// Set artwork on every entry with this title that has none yet.
    /// Returns how many entries changed.
    pub fn apply_artwork(&mut self, title: &str, url: &str) -> usize {
        let mut changed = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.title == title && e.has_placeholder_art())
        {
            entry.album_art_url = Some(url.to_string());
            changed += 1;
        }
        changed
    }

    /// Merge genre/year/album into entries matching title and artist.
    /// Fields absent from `details` keep their current value.
    pub fn apply_details(&mut self, title: &str, artist: &str, details: &Enrichment) -> usize {
        let mut changed = 0;
        for entry in self.entries.iter_mut().filter(|e| e.matches(title, artist)) {
            if let Some(genre) = &details.genre {
                entry.genre = Some(genre.clone());
            }
            if let Some(year) = details.release_year {
                entry.release_year = Some(year);
            }
            if let Some(album) = &details.album_name {
                entry.album_name = Some(album.clone());
            }
            changed += 1;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Local> {
        Local::now()
    }

    #[test]
    fn test_newest_first_and_bounded() {
        let mut h = History::default();
        for i in 0..45 {
            h.record(&format!("Song {i}"), "Artist", now());
        }
        assert_eq!(h.len(), MAX_HISTORY);
        assert_eq!(h.entries()[0].title, "Song 44");
        assert_eq!(h.entries()[MAX_HISTORY - 1].title, "Song 25");
    }

    #[test]
    fn test_head_repeat_is_skipped() {
        let mut h = History::default();
        assert!(h.record("Song", "Artist", now()).is_some());
        assert!(h.record("Song", "Artist", now()).is_none());
        assert_eq!(h.len(), 1);

        // Same title by a different artist is a new play.
        assert!(h.record("Song", "Other", now()).is_some());
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut h = History::default();
        let a = h.record("A", "x", now()).unwrap();
        let b = h.record("B", "x", now()).unwrap();
        let c = h.record("A", "x", now()).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_artwork_never_regresses() {
        let mut h = History::default();
        h.record("Song", "Artist", now());
        assert_eq!(h.apply_artwork("Song", "https://img/1.jpg"), 1);
        assert_eq!(h.apply_artwork("Song", "https://img/2.jpg"), 0);
        assert_eq!(
            h.entries()[0].album_art_url.as_deref(),
            Some("https://img/1.jpg")
        );
    }

    #[test]
    fn test_artwork_replaces_placeholder() {
        let mut h = History::default();
        h.record("Song", "Artist", now());
        h.entries[0].album_art_url = Some(DEFAULT_ALBUM_ART.to_string());
        assert_eq!(h.apply_artwork("Song", "https://img/1.jpg"), 1);
    }

    #[test]
    fn test_details_merge_per_field() {
        let mut h = History::default();
        h.record("Song", "Artist", now());
        h.apply_details(
            "Song",
            "Artist",
            &Enrichment {
                artwork_url: None,
                genre: Some("Rock".into()),
                release_year: Some(1999),
                album_name: Some("Album".into()),
            },
        );
        h.apply_details(
            "Song",
            "Artist",
            &Enrichment {
                artwork_url: None,
                genre: Some("Pop".into()),
                release_year: None,
                album_name: None,
            },
        );
        let e = &h.entries()[0];
        assert_eq!(e.genre.as_deref(), Some("Pop"));
        assert_eq!(e.release_year, Some(1999));
        assert_eq!(e.album_name.as_deref(), Some("Album"));
    }

    #[test]
    fn test_details_require_artist_match() {
        let mut h = History::default();
        h.record("Song", "Artist", now());
        let details = Enrichment {
            genre: Some("Jazz".into()),
            ..Default::default()
        };
        assert_eq!(h.apply_details("Song", "Someone Else", &details), 0);
        assert!(h.entries()[0].genre.is_none());
    }
}
