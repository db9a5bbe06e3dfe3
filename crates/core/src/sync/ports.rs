//! Port interfaces for sync runs
//!
//! These traits define the boundaries between the orchestrator and the
//! infrastructure that fetches items, stores runs, records logs, and
//! delivers live progress.

use almanac_domain::{ItemOutcome, LogRecord, Result, SyncRun, SyncRunSnapshot};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Free-form per-run metadata (window bounds, deletion counts, retry links).
pub type RunMetadata = Map<String, Value>;

/// Items pulled lazily from a source whose size is not known up front.
///
/// An `Err` element aborts the run the same way a failed fetch does.
pub type ItemStream<T> = BoxStream<'static, Result<T>>;

/// What [`SourceAdapter::fetch_items`] hands back to the orchestrator.
pub enum FetchedItems<T> {
    /// A finite batch; the run's `total_items` is set to its length.
    Sized(Vec<T>),
    /// A lazily produced sequence; `total_items` stays unknown.
    Lazy(ItemStream<T>),
}

impl<T> From<Vec<T>> for FetchedItems<T> {
    fn from(items: Vec<T>) -> Self {
        Self::Sized(items)
    }
}

/// Contract every external source implements.
///
/// The orchestrator calls `fetch_items` once, then `process_item` once per
/// item, strictly in sequence. Adapters must keep `process_item`
/// idempotent: a repeated run over unchanged upstream data yields only
/// `Skipped` outcomes and no duplicate records.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The upstream item handed from `fetch_items` to `process_item`.
    type Item: Send + Sync + 'static;

    /// Short stable identifier such as `"fitness"` or `"books"`.
    fn source_type(&self) -> &str;

    /// Retrieve the items to process.
    ///
    /// Errors here (authentication, transport, malformed payloads) fail the
    /// whole run.
    async fn fetch_items(&self) -> Result<FetchedItems<Self::Item>>;

    /// Apply one item to local storage.
    ///
    /// An `Err` is recorded as a `Failed` outcome for this item only; the
    /// run continues with the next item.
    async fn process_item(&self, item: &Self::Item) -> Result<ItemOutcome>;

    /// Human-readable label used in per-item log lines.
    fn describe_item(&self, _item: &Self::Item, ordinal: u64) -> String {
        format!("Item #{ordinal}")
    }

    /// Hook invoked after the last item and before the run completes.
    ///
    /// Deletion-aware adapters remove stale local records here and note the
    /// count in `metadata`. An `Err` fails the run.
    async fn after_items(&self, _metadata: &mut RunMetadata) -> Result<()> {
        Ok(())
    }
}

/// Persistence for sync runs.
///
/// Counter updates go through [`record_outcome`](Self::record_outcome) so
/// that the outcome counter and `processed_items` change in one atomic
/// write.
#[async_trait]
pub trait SyncRunRepository: Send + Sync {
    /// Insert a new run
    async fn create(&self, run: &SyncRun) -> Result<()>;

    /// Load a run by id
    async fn get(&self, id: Uuid) -> Result<Option<SyncRun>>;

    /// Move a run to `running` and stamp its start time
    async fn mark_running(&self, id: Uuid, started_at: DateTime<Utc>) -> Result<()>;

    /// Record the number of items the run will process
    async fn set_total(&self, id: Uuid, total: u64) -> Result<()>;

    /// Increment the outcome counter and `processed_items` together
    async fn record_outcome(&self, id: Uuid, outcome: ItemOutcome) -> Result<()>;

    /// Replace the run's metadata
    async fn update_metadata(&self, id: Uuid, metadata: &RunMetadata) -> Result<()>;

    /// Move a run to `completed` and stamp its completion time
    async fn mark_completed(&self, id: Uuid, completed_at: DateTime<Utc>) -> Result<()>;

    /// Move a run to `failed` with the given error message
    async fn mark_failed(&self, id: Uuid, error: &str, completed_at: DateTime<Utc>)
        -> Result<()>;

    /// Most recent runs first, optionally filtered by source
    async fn list_recent(&self, source_type: Option<&str>, limit: usize) -> Result<Vec<SyncRun>>;

    /// The newest completed run for a source
    async fn latest_completed(&self, source_type: &str) -> Result<Option<SyncRun>>;
}

/// Destination for structured log records.
///
/// Callers in the sync path treat failures as non-fatal.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append a single record
    async fn append(&self, record: LogRecord) -> Result<()>;
}

/// Best-effort delivery of progress snapshots to live observers.
///
/// Publishing never blocks on subscribers, and a failed publish never
/// affects the run.
pub trait StatusBroadcaster: Send + Sync {
    /// Publish a snapshot on the run's channel
    fn publish(&self, snapshot: SyncRunSnapshot) -> Result<()>;
}
