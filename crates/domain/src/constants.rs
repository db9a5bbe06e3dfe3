//! Sync engine constants
//!
//! Centralized location for the numeric policies shared by the orchestrator,
//! the matching utilities, and the adapters.

// Progress broadcasting
/// Broadcast a progress snapshot after every N processed items.
pub const BROADCAST_EVERY_N_ITEMS: u64 = 5;
/// Percentages that trigger a broadcast the first time they are crossed.
pub const BROADCAST_MILESTONES: [u8; 3] = [25, 50, 75];
/// Highest percentage reported while a run is still in flight.
pub const MAX_RUNNING_PERCENTAGE: u8 = 99;

// Fuzzy matching
pub const EDIT_DISTANCE_MATCH_THRESHOLD: f64 = 0.90;
pub const WORD_OVERLAP_MATCH_THRESHOLD: f64 = 0.50;
/// Articles dropped from the front (or trailing ", the") of titles.
pub const LEADING_ARTICLES: [&str; 3] = ["the", "a", "an"];

// Log categories
pub const LOG_CATEGORY_SYNC: &str = "sync";
pub const LOG_CATEGORY_AUTH: &str = "auth";
pub const LOG_CATEGORY_SYSTEM: &str = "system";

// Run metadata keys
pub const METADATA_RETRY_OF: &str = "retry_of";
pub const METADATA_DELETED_COUNT: &str = "deleted_count";
pub const METADATA_WINDOW_START: &str = "window_start";
pub const METADATA_WINDOW_END: &str = "window_end";
pub const METADATA_PLAYED_THROUGH: &str = "played_through";

// Source identifiers
pub const SOURCE_FITNESS: &str = "fitness";
pub const SOURCE_WORKOUTS: &str = "workouts";
pub const SOURCE_SCROBBLES: &str = "scrobbles";
pub const SOURCE_PLAYLISTS: &str = "playlists";
pub const SOURCE_LISTENING_STATS: &str = "listening_stats";
pub const SOURCE_BOOKS: &str = "books";
pub const SOURCE_FEEDS: &str = "feeds";

/// Every source the workspace ships an adapter for.
pub const ALL_SOURCES: [&str; 7] = [
    SOURCE_FITNESS,
    SOURCE_WORKOUTS,
    SOURCE_SCROBBLES,
    SOURCE_PLAYLISTS,
    SOURCE_LISTENING_STATS,
    SOURCE_BOOKS,
    SOURCE_FEEDS,
];
