//! Local records written by the source adapters
//!
//! Each struct is the locally stored shape of one upstream item. Adapters
//! compare a freshly fetched record against the stored one to decide
//! between created, updated, and skipped.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One calendar day of activity totals. Keyed by `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub steps: u32,
    pub distance_meters: f64,
    pub active_minutes: u32,
    pub calories: u32,
}

impl DailyActivity {
    /// A day with no recorded movement at all.
    pub fn is_empty(&self) -> bool {
        self.steps == 0 && self.active_minutes == 0 && self.distance_meters <= 0.0
    }
}

/// A single recorded workout. Keyed by the upstream `external_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub external_id: String,
    pub activity_type: String,
    pub name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: u32,
    pub distance_meters: Option<f64>,
    pub calories: Option<u32>,
}

/// A played track. Upstream offers no id, so the natural key is
/// `(played_at, artist, track)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listen {
    pub played_at: DateTime<Utc>,
    pub artist: String,
    pub track: String,
    pub album: Option<String>,
}

/// A playlist and the change marker the upstream attaches to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub external_id: String,
    pub name: String,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub track_count: u32,
    pub snapshot_id: String,
}

/// One ranked row of a top-N chart. Keyed by `(category, period, rank)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub category: String,
    pub period: String,
    pub rank: u32,
    pub name: String,
    pub artist: Option<String>,
    pub play_count: u64,
}

/// A shelved book. Upstream ids are unreliable, so books are deduplicated
/// by fuzzy title and author matching and carry a local id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub shelf: String,
    pub rating: Option<u8>,
    pub date_read: Option<NaiveDate>,
}

impl Book {
    pub fn new(title: impl Into<String>, author: Option<String>, shelf: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            author,
            shelf: shelf.into(),
            rating: None,
            date_read: None,
        }
    }

    /// Whether the user-facing fields differ, ignoring the local id.
    pub fn differs_from(&self, other: &Self) -> bool {
        self.shelf != other.shelf
            || self.rating != other.rating
            || self.date_read != other.date_read
            || self.author != other.author
    }
}

/// An entry of a subscribed feed. Keyed by `(feed_url, guid)`, where the
/// guid falls back to the entry link when the feed omits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub feed_url: String,
    pub guid: String,
    pub title: String,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
}
