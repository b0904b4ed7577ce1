//! iTunes search lookups for artwork, genre, release year and album.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::Datelike;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::config::EnrichmentConfig;

const USER_AGENT: &str = concat!("phc-radio/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search API returned status {0}")]
    Status(reqwest::StatusCode),
}

/// Search response envelope: `{ "resultCount": n, "results": [...] }`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTrack {
    #[serde(rename = "artworkUrl100")]
    pub artwork_url_100: Option<String>,
    pub release_date: Option<String>,
    pub primary_genre_name: Option<String>,
    pub genre_name: Option<String>,
    pub collection_name: Option<String>,
}

/// What one lookup resolved. Every field is optional; absent fields never
/// clear existing data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub artwork_url: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub album_name: Option<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.artwork_url.is_none()
            && self.genre.is_none()
            && self.release_year.is_none()
            && self.album_name.is_none()
    }
}

impl From<SearchTrack> for Enrichment {
    fn from(track: SearchTrack) -> Self {
        Self {
            artwork_url: track.artwork_url_100.as_deref().map(upgrade_artwork),
            genre: track.primary_genre_name.or(track.genre_name),
            release_year: track.release_date.as_deref().and_then(release_year),
            album_name: track.collection_name,
        }
    }
}

fn qualifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy: "A (x) B (y)" drops everything from the first "(" to the last ")".
    RE.get_or_init(|| Regex::new(r"\(.*\)|\[.*\]").expect("static regex"))
}

/// Strip `(...)` / `[...]` qualifiers ("Remastered", "feat. X") before searching.
pub fn clean_search_term(term: &str) -> String {
    qualifier_re().replace_all(term, "").trim().to_string()
}

/// The API serves 100px thumbnails; the same path with 600x600 is the large cover.
pub fn upgrade_artwork(url: &str) -> String {
    url.replace("100x100", "600x600")
}

/// Year component of an ISO-8601 release date such as `2019-05-03T07:00:00Z`.
pub fn release_year(date: &str) -> Option<i32> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        return Some(dt.year());
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(d.year());
    }
    date.get(..4)?.parse().ok()
}

/// Thin client over the search endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ItunesClient {
    http: reqwest::Client,
    base_url: String,
}

impl ItunesClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EnrichError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(cfg: &EnrichmentConfig) -> Result<Self, EnrichError> {
        Self::new(cfg.search_url.clone(), Duration::from_secs(cfg.timeout_secs))
    }

    /// Look up the best match for `term`. `Ok(None)` when the API has no result.
    pub async fn lookup(&self, term: &str) -> Result<Option<Enrichment>, EnrichError> {
        let term = clean_search_term(term);
        tracing::debug!("itunes lookup: {:?}", term);

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("term", term.as_str()), ("entity", "song"), ("limit", "1")])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EnrichError::Status(response.status()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results.into_iter().next().map(Enrichment::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_search_term() {
        assert_eq!(clean_search_term("Artist - Song (Remastered)"), "Artist - Song");
        assert_eq!(clean_search_term("Artist - Song [Live]"), "Artist - Song");
        assert_eq!(clean_search_term("Plain"), "Plain");
        // Greedy match swallows text between two groups.
        assert_eq!(clean_search_term("A (x) B (y) C"), "A  C");
    }

    #[test]
    fn test_upgrade_artwork() {
        assert_eq!(
            upgrade_artwork("https://is1.mzstatic.com/image/100x100bb.jpg"),
            "https://is1.mzstatic.com/image/600x600bb.jpg"
        );
        assert_eq!(upgrade_artwork("https://x/other.jpg"), "https://x/other.jpg");
    }

    #[test]
    fn test_release_year() {
        assert_eq!(release_year("2019-05-03T07:00:00Z"), Some(2019));
        assert_eq!(release_year("1987-11-02"), Some(1987));
        assert_eq!(release_year("2001"), Some(2001));
        assert_eq!(release_year("soon"), None);
    }

    #[test]
    fn test_extract_from_response() {
        let body = r#"{
            "resultCount": 1,
            "results": [{
                "artworkUrl100": "https://img/100x100bb.jpg",
                "releaseDate": "2011-01-24T08:00:00Z",
                "genreName": "Indie",
                "collectionName": "The Album"
            }]
        }"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        let e = Enrichment::from(resp.results.into_iter().next().unwrap());
        assert_eq!(e.artwork_url.as_deref(), Some("https://img/600x600bb.jpg"));
        assert_eq!(e.genre.as_deref(), Some("Indie"));
        assert_eq!(e.release_year, Some(2011));
        assert_eq!(e.album_name.as_deref(), Some("The Album"));
    }

    #[test]
    fn test_primary_genre_wins() {
        let track = SearchTrack {
            artwork_url_100: None,
            release_date: None,
            primary_genre_name: Some("Rock".into()),
            genre_name: Some("Alternative".into()),
            collection_name: None,
        };
        let e = Enrichment::from(track);
        assert_eq!(e.genre.as_deref(), Some("Rock"));
        assert!(e.artwork_url.is_none());
    }

    #[test]
    fn test_empty_results() {
        let resp: SearchResponse = serde_json::from_str(r#"{"resultCount":0,"results":[]}"#).unwrap();
        assert!(resp.results.is_empty());
    }
}
