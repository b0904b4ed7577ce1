use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

/// Environment variable overriding `feed.metadata_url`.
pub const ENV_METADATA_URL: &str = "PHC_METADATA_URL";
/// Environment variable overriding `stream.stream_url`.
pub const ENV_STREAM_URL: &str = "PHC_STREAM_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// How the station names itself in the metadata feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    /// Self-identification string; titles containing it are station idents.
    #[serde(default = "default_station_name")]
    pub name: String,
    /// Artist shown for idents and for titles without an artist segment.
    #[serde(default = "default_station_short_name")]
    pub short_name: String,
    /// Marker the station puts in the title during ad breaks.
    #[serde(default = "default_ad_marker")]
    pub ad_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,
    /// Delay before reconnecting after the feed drops. The server may
    /// override it with an SSE `retry:` field.
    #[serde(default = "default_reconnect_ms")]
    pub reconnect_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_url")]
    pub stream_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// JSON key/value file holding the theme preference.
    #[serde(default = "default_storage_file")]
    pub storage_file: PathBuf,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: default_station_name(),
            short_name: default_station_short_name(),
            ad_marker: default_ad_marker(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            metadata_url: default_metadata_url(),
            reconnect_ms: default_reconnect_ms(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            stream_url: default_stream_url(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            debounce_ms: default_debounce_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            history_limit: default_history_limit(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            storage_file: default_storage_file(),
        }
    }
}

fn default_station_name() -> String {
    "PHC Radio".to_string()
}

fn default_station_short_name() -> String {
    "PHC".to_string()
}

fn default_ad_marker() -> String {
    "ADVERTISEMENT".to_string()
}

fn default_metadata_url() -> String {
    "https://api.zeno.fm/mounts/metadata/subscribe/qnozhn4xig7uv".to_string()
}

fn default_reconnect_ms() -> u64 {
    3000
}

fn default_stream_url() -> String {
    "https://stream.zeno.fm/qnozhn4xig7uv".to_string()
}

fn default_search_url() -> String {
    "https://itunes.apple.com/search".to_string()
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_volume() -> f32 {
    0.6
}

fn default_history_limit() -> usize {
    crate::history::MAX_HISTORY
}

fn default_storage_file() -> PathBuf {
    platform::data_dir().join("storage.json")
}

impl Config {
    /// Load `config.toml`, writing the defaults on first run, then apply
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Apply `PHC_*` overrides. Empty values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_METADATA_URL) {
            self.feed.metadata_url = url;
        }
        if let Some(url) = non_empty(ENV_STREAM_URL) {
            self.stream.stream_url = url;
        }
    }
}
