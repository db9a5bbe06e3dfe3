//! Sync orchestrator - drives one run of one source adapter

use std::sync::Arc;

use almanac_domain::constants::{LOG_CATEGORY_SYNC, METADATA_RETRY_OF};
use almanac_domain::{
    AlmanacError, ItemOutcome, LogLevel, LogRecord, Result, SyncRun, SyncRunSnapshot, SyncStatus,
};
use chrono::Utc;
use futures::StreamExt;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use super::cadence::{BroadcastCadence, BroadcastTrigger};
use super::ports::{FetchedItems, LogSink, SourceAdapter, StatusBroadcaster, SyncRunRepository};

/// Runs a [`SourceAdapter`] to completion while keeping a [`SyncRun`]
/// record, its log, and any live observers up to date.
///
/// Items are processed one at a time in the order the adapter yields them.
/// A failing item is logged and counted but never stops the run; a failing
/// fetch, post-processing hook, or run-store write does.
pub struct SyncOrchestrator<A: SourceAdapter> {
    adapter: A,
    runs: Arc<dyn SyncRunRepository>,
    logs: Arc<dyn LogSink>,
    broadcaster: Option<Arc<dyn StatusBroadcaster>>,
    broadcast_enabled: bool,
    cadence: BroadcastCadence,
    existing_run: Option<SyncRun>,
    owner_id: Option<String>,
}

impl<A: SourceAdapter> SyncOrchestrator<A> {
    pub fn new(adapter: A, runs: Arc<dyn SyncRunRepository>, logs: Arc<dyn LogSink>) -> Self {
        Self {
            adapter,
            runs,
            logs,
            broadcaster: None,
            broadcast_enabled: false,
            cadence: BroadcastCadence::default(),
            existing_run: None,
            owner_id: None,
        }
    }

    /// Resume a previously created run instead of creating a new one.
    ///
    /// Only a `pending` run is adopted. Any other status starts a fresh run
    /// whose metadata points back at this one.
    #[must_use]
    pub fn with_run(mut self, run: SyncRun) -> Self {
        self.existing_run = Some(run);
        self
    }

    /// Publish progress snapshots through `broadcaster` when `enabled`.
    #[must_use]
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn StatusBroadcaster>, enabled: bool) -> Self {
        self.broadcaster = Some(broadcaster);
        self.broadcast_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_cadence(mut self, cadence: BroadcastCadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Owner recorded on runs this orchestrator creates.
    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Execute one run and return its final state.
    ///
    /// On failure the run is marked `failed` with the error message before
    /// the error is returned to the caller.
    #[instrument(skip(self), fields(source = %self.adapter.source_type()))]
    pub async fn perform(&mut self) -> Result<SyncRun> {
        let mut run = self.prepare_run().await?;

        match self.execute(&mut run).await {
            Ok(()) => {
                info!(run_id = %run.id, summary = %run.summary(), "sync run completed");
                Ok(run)
            }
            Err(err) => {
                self.fail_run(&mut run, &err).await;
                Err(err)
            }
        }
    }

    async fn prepare_run(&mut self) -> Result<SyncRun> {
        let source_type = self.adapter.source_type().to_string();

        match self.existing_run.take() {
            Some(existing) if existing.source_type != source_type => {
                Err(AlmanacError::InvalidInput(format!(
                    "run {} belongs to source '{}', not '{}'",
                    existing.id, existing.source_type, source_type
                )))
            }
            Some(mut existing) if existing.status == SyncStatus::Pending => {
                existing.interactive = existing.interactive || self.broadcast_enabled;
                if self.runs.get(existing.id).await?.is_none() {
                    self.runs.create(&existing).await?;
                }
                debug!(run_id = %existing.id, "adopting pending sync run");
                Ok(existing)
            }
            Some(previous) => {
                let mut run = self.new_run(source_type);
                run.metadata.insert(METADATA_RETRY_OF.into(), json!(previous.id.to_string()));
                self.runs.create(&run).await?;
                info!(
                    previous_run = %previous.id,
                    previous_status = %previous.status,
                    run_id = %run.id,
                    "previous run is not pending; starting a fresh run"
                );
                Ok(run)
            }
            None => {
                let run = self.new_run(source_type);
                self.runs.create(&run).await?;
                Ok(run)
            }
        }
    }

    fn new_run(&self, source_type: String) -> SyncRun {
        let run = SyncRun::new(source_type, self.broadcast_enabled);
        match &self.owner_id {
            Some(owner) => run.with_owner(owner.clone()),
            None => run,
        }
    }

    async fn execute(&self, run: &mut SyncRun) -> Result<()> {
        let source_type = self.adapter.source_type().to_string();
        self.log(run, LogLevel::Info, format!("Starting {source_type} sync"), Value::Null).await;

        let started_at = Utc::now();
        run.start(started_at)?;
        self.runs.mark_running(run.id, started_at).await?;
        self.broadcast(run, BroadcastTrigger::Started);

        match self.adapter.fetch_items().await? {
            FetchedItems::Sized(items) => {
                let total = items.len() as u64;
                run.set_total(total);
                self.runs.set_total(run.id, total).await?;
                self.log(
                    run,
                    LogLevel::Info,
                    format!("Found {total} items to process"),
                    json!({ "total_items": total }),
                )
                .await;
                self.broadcast(run, BroadcastTrigger::ItemsFetched);

                for (index, item) in items.iter().enumerate() {
                    self.process_one(run, item, index as u64 + 1).await?;
                }
            }
            FetchedItems::Lazy(mut stream) => {
                self.log(run, LogLevel::Info, "Processing unknown count of items", Value::Null)
                    .await;
                self.broadcast(run, BroadcastTrigger::ItemsFetched);

                let mut ordinal = 0;
                while let Some(next) = stream.next().await {
                    let item = next?;
                    ordinal += 1;
                    self.process_one(run, &item, ordinal).await?;
                }
            }
        }

        let mut metadata = run.metadata.clone();
        self.adapter.after_items(&mut metadata).await?;
        if metadata != run.metadata {
            self.runs.update_metadata(run.id, &metadata).await?;
            run.metadata = metadata;
        }

        let mut completed = run.clone();
        let completed_at = Utc::now();
        completed.complete(completed_at)?;
        self.runs.mark_completed(run.id, completed_at).await?;
        *run = completed;

        self.log(
            run,
            LogLevel::Success,
            format!("Completed {source_type} sync: {}", run.summary()),
            json!({
                "processed_items": run.processed_items,
                "created_count": run.created_count,
                "updated_count": run.updated_count,
                "skipped_count": run.skipped_count,
                "failed_count": run.failed_count,
            }),
        )
        .await;
        self.broadcast(run, BroadcastTrigger::Completed);
        Ok(())
    }

    async fn process_one(&self, run: &mut SyncRun, item: &A::Item, ordinal: u64) -> Result<()> {
        let description = self.adapter.describe_item(item, ordinal);

        let outcome = match self.adapter.process_item(item).await {
            Ok(outcome) => {
                self.log(
                    run,
                    outcome.log_level(),
                    format!("{description}: {outcome}"),
                    json!({ "ordinal": ordinal, "outcome": outcome }),
                )
                .await;
                outcome
            }
            Err(err) => {
                warn!(run_id = %run.id, ordinal, error = %err, "sync item failed");
                self.log(
                    run,
                    LogLevel::Error,
                    format!("Failed to process {description}: {err}"),
                    json!({ "ordinal": ordinal, "error": err.to_string() }),
                )
                .await;
                ItemOutcome::Failed
            }
        };

        let before = run.progress_percentage();
        run.record(outcome);
        self.runs.record_outcome(run.id, outcome).await?;
        let after = run.progress_percentage();

        let percentages = run.total_items.map(|_| (before, after));
        for trigger in self.cadence.item_triggers(run.processed_items, percentages) {
            self.broadcast(run, trigger);
        }
        Ok(())
    }

    async fn fail_run(&self, run: &mut SyncRun, err: &AlmanacError) {
        let message = err.to_string();
        let failed_at = Utc::now();

        match run.fail(message.clone(), failed_at) {
            Ok(()) => {
                if let Err(store_err) = self.runs.mark_failed(run.id, &message, failed_at).await {
                    error!(run_id = %run.id, error = %store_err, "failed to persist sync failure");
                }
            }
            Err(state_err) => {
                error!(run_id = %run.id, error = %state_err, "sync run cannot be marked failed");
            }
        }

        error!(run_id = %run.id, error = %message, "sync run failed");
        self.log(
            run,
            LogLevel::Error,
            format!("Sync failed: {message}"),
            json!({ "error": err }),
        )
        .await;
        self.broadcast(run, BroadcastTrigger::Failed);
    }

    async fn log(
        &self,
        run: &SyncRun,
        level: LogLevel,
        message: impl Into<String>,
        payload: Value,
    ) {
        let record =
            LogRecord::new(LOG_CATEGORY_SYNC, level, message).for_run(run.id).with_payload(payload);
        if let Err(err) = self.logs.append(record).await {
            debug!(run_id = %run.id, error = %err, "dropping sync log record");
        }
    }

    fn broadcast(&self, run: &SyncRun, trigger: BroadcastTrigger) {
        if !run.interactive {
            return;
        }
        let Some(broadcaster) = &self.broadcaster else {
            return;
        };
        if let Err(err) = broadcaster.publish(SyncRunSnapshot::from(&*run)) {
            debug!(run_id = %run.id, ?trigger, error = %err, "dropping progress broadcast");
        }
    }
}
