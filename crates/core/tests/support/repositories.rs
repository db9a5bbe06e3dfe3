//! In-memory mocks for the sync run, log, and broadcast ports

use std::collections::HashMap;
use std::sync::Arc;

use almanac_core::{LogSink, RunMetadata, StatusBroadcaster, SyncRunRepository};
use almanac_domain::{
    AlmanacError, ItemOutcome, LogLevel, LogRecord, Result as DomainResult, SyncRun,
    SyncRunSnapshot, SyncStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

/// In-memory `SyncRunRepository` with optional write failures.
#[derive(Default, Clone)]
pub struct MockSyncRunRepository {
    runs: Arc<Mutex<HashMap<Uuid, SyncRun>>>,
    fail_record_after: Arc<Mutex<Option<u64>>>,
    recorded: Arc<Mutex<u64>>,
}

impl MockSyncRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `record_outcome` fail once `successes` calls have gone through.
    pub fn fail_record_after(self, successes: u64) -> Self {
        *self.fail_record_after.lock() = Some(successes);
        self
    }

    pub fn stored(&self, id: Uuid) -> Option<SyncRun> {
        self.runs.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    /// Every stored run, oldest first.
    pub fn list_all(&self) -> Vec<SyncRun> {
        let mut runs: Vec<SyncRun> = self.runs.lock().values().cloned().collect();
        runs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        runs
    }

    fn with_run<T>(&self, id: Uuid, f: impl FnOnce(&mut SyncRun) -> DomainResult<T>) -> DomainResult<T> {
        let mut runs = self.runs.lock();
        let run = runs
            .get_mut(&id)
            .ok_or_else(|| AlmanacError::NotFound(format!("sync run {id}")))?;
        f(run)
    }
}

#[async_trait]
impl SyncRunRepository for MockSyncRunRepository {
    async fn create(&self, run: &SyncRun) -> DomainResult<()> {
        self.runs.lock().insert(run.id, run.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<SyncRun>> {
        Ok(self.stored(id))
    }

    async fn mark_running(&self, id: Uuid, started_at: DateTime<Utc>) -> DomainResult<()> {
        self.with_run(id, |run| run.start(started_at))
    }

    async fn set_total(&self, id: Uuid, total: u64) -> DomainResult<()> {
        self.with_run(id, |run| {
            run.set_total(total);
            Ok(())
        })
    }

    async fn record_outcome(&self, id: Uuid, outcome: ItemOutcome) -> DomainResult<()> {
        let mut recorded = self.recorded.lock();
        if let Some(limit) = *self.fail_record_after.lock() {
            if *recorded >= limit {
                return Err(AlmanacError::Database("disk I/O error".into()));
            }
        }
        *recorded += 1;
        self.with_run(id, |run| {
            run.record(outcome);
            Ok(())
        })
    }

    async fn update_metadata(&self, id: Uuid, metadata: &RunMetadata) -> DomainResult<()> {
        self.with_run(id, |run| {
            run.metadata = metadata.clone();
            Ok(())
        })
    }

    async fn mark_completed(&self, id: Uuid, completed_at: DateTime<Utc>) -> DomainResult<()> {
        self.with_run(id, |run| run.complete(completed_at))
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        completed_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.with_run(id, |run| run.fail(error, completed_at))
    }

    async fn list_recent(
        &self,
        source_type: Option<&str>,
        limit: usize,
    ) -> DomainResult<Vec<SyncRun>> {
        let mut runs: Vec<SyncRun> = self
            .runs
            .lock()
            .values()
            .filter(|run| source_type.map_or(true, |source| run.source_type == source))
            .cloned()
            .collect();
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs.truncate(limit);
        Ok(runs)
    }

    async fn latest_completed(&self, source_type: &str) -> DomainResult<Option<SyncRun>> {
        Ok(self
            .list_recent(Some(source_type), usize::MAX)
            .await?
            .into_iter()
            .find(|run| run.status == SyncStatus::Completed))
    }
}

/// Collects log records; can be told to reject every write.
#[derive(Default, Clone)]
pub struct MemoryLogSink {
    records: Arc<Mutex<Vec<LogRecord>>>,
    failing: bool,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|record| record.message.clone()).collect()
    }

    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records.lock().iter().filter(|record| record.level == level).cloned().collect()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn append(&self, record: LogRecord) -> DomainResult<()> {
        if self.failing {
            return Err(AlmanacError::Database("log table is locked".into()));
        }
        self.records.lock().push(record);
        Ok(())
    }
}

/// Records every published snapshot; can be told to reject publishes.
#[derive(Default, Clone)]
pub struct RecordingBroadcaster {
    snapshots: Arc<Mutex<Vec<SyncRunSnapshot>>>,
    failing: bool,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn snapshots(&self) -> Vec<SyncRunSnapshot> {
        self.snapshots.lock().clone()
    }

    pub fn processed_counts(&self) -> Vec<u64> {
        self.snapshots.lock().iter().map(|snapshot| snapshot.processed_items).collect()
    }
}

impl StatusBroadcaster for RecordingBroadcaster {
    fn publish(&self, snapshot: SyncRunSnapshot) -> DomainResult<()> {
        if self.failing {
            return Err(AlmanacError::Network("no subscribers".into()));
        }
        self.snapshots.lock().push(snapshot);
        Ok(())
    }
}
