//! Configuration management
//!
//! Every credential and per-source knob is carried by these structs and
//! handed to adapter constructors explicitly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "almanac.db".to_string(), pool_size: 8 }
    }
}

/// Orchestration-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Publish progress snapshots for runs started from this process.
    #[serde(default)]
    pub broadcast_enabled: bool,
    /// Buffered snapshots per observer before the slowest one lags.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// Persist structured log entries in addition to tracing output.
    #[serde(default = "default_true")]
    pub log_to_database: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            broadcast_enabled: false,
            broadcast_capacity: default_broadcast_capacity(),
            log_to_database: true,
        }
    }
}

/// Per-source configuration. A missing section disables that source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub fitness: Option<FitnessConfig>,
    pub workouts: Option<WorkoutsConfig>,
    pub scrobbles: Option<ScrobblesConfig>,
    pub playlists: Option<PlaylistsConfig>,
    pub listening_stats: Option<ListeningStatsConfig>,
    pub books: Option<BooksConfig>,
    pub feeds: Option<FeedsConfig>,
}

/// Activity tracker daily summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessConfig {
    pub base_url: String,
    pub access_token: String,
    /// Trailing days re-synced each run to catch late edits.
    #[serde(default = "default_overlap_days")]
    pub overlap_days: u32,
    /// Earliest date ever requested.
    pub floor_date: NaiveDate,
    #[serde(default)]
    pub request_delay_ms: u64,
}

/// Activity tracker workouts with deletion detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutsConfig {
    pub base_url: String,
    pub access_token: String,
    /// Only workouts started within this many days are compared.
    #[serde(default = "default_recency_days")]
    pub recency_days: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Music-scrobble listening history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrobblesConfig {
    pub base_url: String,
    pub api_key: String,
    pub user: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub request_delay_ms: u64,
}

/// Streaming-service playlists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistsConfig {
    pub base_url: String,
    pub access_token: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Scrobble-service chart matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListeningStatsConfig {
    pub base_url: String,
    pub api_key: String,
    pub user: String,
    #[serde(default = "default_stat_periods")]
    pub periods: Vec<String>,
    #[serde(default = "default_top_limit")]
    pub limit: u32,
}

/// Book-cataloging shelves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksConfig {
    pub base_url: String,
    pub api_key: String,
    pub user_id: String,
    #[serde(default = "default_shelves")]
    pub shelves: Vec<String>,
}

/// RSS feed subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    pub urls: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_broadcast_capacity() -> usize {
    64
}

fn default_overlap_days() -> u32 {
    7
}

fn default_recency_days() -> u32 {
    30
}

fn default_page_size() -> u32 {
    50
}

fn default_top_limit() -> u32 {
    10
}

fn default_stat_periods() -> Vec<String> {
    ["7day", "1month", "12month", "overall"].iter().map(ToString::to_string).collect()
}

fn default_shelves() -> Vec<String> {
    ["read", "currently-reading", "to-read"].iter().map(ToString::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.database.path, "almanac.db");
        assert_eq!(config.database.pool_size, 8);
        assert!(!config.sync.broadcast_enabled);
        assert!(config.sync.log_to_database);
        assert!(config.sources.fitness.is_none());
    }

    #[test]
    fn source_sections_fill_in_strategy_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sources.fitness]
            base_url = "https://tracker.example"
            access_token = "tok"
            floor_date = "2023-01-01"

            [sources.listening_stats]
            base_url = "https://scrobbles.example"
            api_key = "key"
            user = "listener"
            "#,
        )
        .unwrap();

        let fitness = config.sources.fitness.unwrap();
        assert_eq!(fitness.overlap_days, 7);
        assert_eq!(fitness.floor_date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());

        let stats = config.sources.listening_stats.unwrap();
        assert_eq!(stats.periods, vec!["7day", "1month", "12month", "overall"]);
        assert_eq!(stats.limit, 10);
    }
}
