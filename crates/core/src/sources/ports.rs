//! Port interfaces for per-source record storage
//!
//! Each adapter owns one of these stores. Upserts are keyed by the record's
//! natural key, so replaying the same upstream data never duplicates rows.

use almanac_domain::{
    Book, ChartEntry, DailyActivity, FeedEntry, Listen, Playlist, Result, Workout,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Daily activity totals keyed by date
#[async_trait]
pub trait DailyActivityStore: Send + Sync {
    /// Newest day stored locally
    async fn latest_date(&self) -> Result<Option<NaiveDate>>;

    /// Load the totals for one day
    async fn get(&self, date: NaiveDate) -> Result<Option<DailyActivity>>;

    /// Insert or replace the totals for a day
    async fn upsert(&self, day: &DailyActivity) -> Result<()>;
}

/// Workouts keyed by upstream id
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    async fn get(&self, external_id: &str) -> Result<Option<Workout>>;

    async fn upsert(&self, workout: &Workout) -> Result<()>;

    /// Ids of workouts that started at or after `since`
    async fn ids_started_since(&self, since: DateTime<Utc>) -> Result<Vec<String>>;

    /// Remove workouts by id, returning how many rows went away
    async fn delete(&self, external_ids: &[String]) -> Result<usize>;
}

/// Listening history keyed by `(played_at, artist, track)`
#[async_trait]
pub trait ListenStore: Send + Sync {
    async fn exists(&self, listen: &Listen) -> Result<bool>;

    async fn insert(&self, listen: &Listen) -> Result<()>;
}

/// Playlists keyed by upstream id
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn get(&self, external_id: &str) -> Result<Option<Playlist>>;

    async fn upsert(&self, playlist: &Playlist) -> Result<()>;
}

/// Chart rows keyed by `(category, period, rank)`
#[async_trait]
pub trait ChartStore: Send + Sync {
    async fn get(&self, category: &str, period: &str, rank: u32) -> Result<Option<ChartEntry>>;

    async fn upsert(&self, entry: &ChartEntry) -> Result<()>;
}

/// Shelved books, matched by title rather than id
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every stored book, for fuzzy matching
    async fn all(&self) -> Result<Vec<Book>>;

    async fn insert(&self, book: &Book) -> Result<()>;

    /// Overwrite the stored book with the same local id
    async fn update(&self, book: &Book) -> Result<()>;
}

/// Feed entries keyed by `(feed_url, guid)`
#[async_trait]
pub trait FeedEntryStore: Send + Sync {
    async fn get(&self, feed_url: &str, guid: &str) -> Result<Option<FeedEntry>>;

    async fn upsert(&self, entry: &FeedEntry) -> Result<()>;
}
