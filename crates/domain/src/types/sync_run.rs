//! Persisted progress/state entity for one sync execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::outcome::ItemOutcome;
use crate::constants::MAX_RUNNING_PERCENTAGE;
use crate::errors::{AlmanacError, Result};

/// Lifecycle state of a [`SyncRun`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

crate::impl_domain_status_conversions!(SyncStatus {
    Pending => "pending",
    Running => "running",
    Completed => "completed",
    Failed => "failed",
});

impl SyncStatus {
    /// Transitions only move `pending → running → {completed | failed}`.
    /// A run that fails during setup may go straight from `pending` to
    /// `failed`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One execution of one source's sync.
///
/// Counter invariant: `created + updated + skipped + failed == processed`.
/// The only way to move a counter is [`SyncRun::record`], which bumps both
/// sides together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
    pub id: Uuid,
    pub source_type: String,
    pub status: SyncStatus,
    pub total_items: Option<u64>,
    pub processed_items: u64,
    pub created_count: u64,
    pub updated_count: u64,
    pub failed_count: u64,
    pub skipped_count: u64,
    pub error_message: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub interactive: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SyncRun {
    /// Create a fresh `pending` run.
    pub fn new(source_type: impl Into<String>, interactive: bool) -> Self {
        Self {
            id: Uuid::now_v7(),
            source_type: source_type.into(),
            status: SyncStatus::Pending,
            total_items: None,
            processed_items: 0,
            created_count: 0,
            updated_count: 0,
            failed_count: 0,
            skipped_count: 0,
            error_message: None,
            metadata: Map::new(),
            interactive,
            started_at: None,
            completed_at: None,
            owner_id: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Move `pending → running` and stamp `started_at`.
    pub fn start(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(SyncStatus::Running)?;
        self.started_at = Some(at);
        Ok(())
    }

    /// Move `running → completed` and stamp `completed_at`.
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.transition(SyncStatus::Completed)?;
        self.completed_at = Some(at);
        Ok(())
    }

    /// Move to `failed`, recording the error message.
    pub fn fail(&mut self, message: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
        self.transition(SyncStatus::Failed)?;
        self.error_message = Some(message.into());
        self.completed_at = Some(at);
        Ok(())
    }

    fn transition(&mut self, next: SyncStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(AlmanacError::InvalidState(format!(
                "sync run {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }

    /// Record the size reported by the adapter.
    pub fn set_total(&mut self, total: u64) {
        self.total_items = Some(total);
    }

    /// Count one processed item under its outcome.
    pub fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Created => self.created_count += 1,
            ItemOutcome::Updated => self.updated_count += 1,
            ItemOutcome::Skipped => self.skipped_count += 1,
            ItemOutcome::Failed => self.failed_count += 1,
        }
        self.processed_items += 1;
    }

    /// `0` when the total is unknown or zero, `100` once completed, otherwise
    /// the floored percentage capped at 99.
    pub fn progress_percentage(&self) -> u8 {
        if self.status == SyncStatus::Completed {
            return 100;
        }
        match self.total_items {
            Some(total) if total > 0 => percentage_of(self.processed_items, total),
            _ => 0,
        }
    }

    /// Sum of the four outcome counters.
    pub fn outcome_total(&self) -> u64 {
        self.created_count + self.updated_count + self.skipped_count + self.failed_count
    }

    /// Whether the counter invariants hold.
    pub fn counters_consistent(&self) -> bool {
        let within_total = self.total_items.map_or(true, |total| self.processed_items <= total);
        self.outcome_total() == self.processed_items && within_total
    }

    /// Duration between start and completion, when both are known.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.completed_at? - self.started_at?)
    }

    /// One-line counter summary used in the completion log entry.
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} skipped, {} failed",
            self.created_count, self.updated_count, self.skipped_count, self.failed_count
        )
    }
}

/// Floored `processed / total * 100`, capped at the running maximum.
pub(crate) fn percentage_of(processed: u64, total: u64) -> u8 {
    let raw = processed.saturating_mul(100) / total;
    let capped = raw.min(u64::from(MAX_RUNNING_PERCENTAGE));
    u8::try_from(capped).unwrap_or(MAX_RUNNING_PERCENTAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(total: Option<u64>) -> SyncRun {
        let mut run = SyncRun::new("fitness", false);
        run.start(Utc::now()).unwrap();
        if let Some(total) = total {
            run.set_total(total);
        }
        run
    }

    #[test]
    fn new_run_starts_pending_with_zero_counters() {
        let run = SyncRun::new("books", true);
        assert_eq!(run.status, SyncStatus::Pending);
        assert_eq!(run.total_items, None);
        assert_eq!(run.outcome_total(), 0);
        assert!(run.interactive);
        assert!(run.counters_consistent());
    }

    #[test]
    fn status_never_moves_backward() {
        let mut run = running(None);
        run.complete(Utc::now()).unwrap();

        assert!(run.start(Utc::now()).is_err());
        assert!(run.fail("late", Utc::now()).is_err());
        assert_eq!(run.status, SyncStatus::Completed);
    }

    #[test]
    fn pending_run_cannot_complete_without_starting() {
        let mut run = SyncRun::new("feeds", false);
        let err = run.complete(Utc::now()).unwrap_err();
        assert!(matches!(err, AlmanacError::InvalidState(_)));
    }

    #[test]
    fn fail_records_message_and_completion_time() {
        let mut run = running(None);
        run.fail("token expired", Utc::now()).unwrap();
        assert_eq!(run.status, SyncStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some("token expired"));
        assert!(run.completed_at.is_some());
    }

    #[test]
    fn record_keeps_counter_sum_equal_to_processed() {
        let mut run = running(Some(4));
        for outcome in [
            ItemOutcome::Created,
            ItemOutcome::Updated,
            ItemOutcome::Skipped,
            ItemOutcome::Failed,
        ] {
            run.record(outcome);
            assert!(run.counters_consistent());
        }
        assert_eq!(run.processed_items, 4);
        assert_eq!(run.summary(), "1 created, 1 updated, 1 skipped, 1 failed");
    }

    #[test]
    fn percentage_is_zero_without_total() {
        let mut run = running(None);
        run.record(ItemOutcome::Created);
        assert_eq!(run.progress_percentage(), 0);

        let mut empty = running(Some(0));
        empty.record(ItemOutcome::Created);
        assert_eq!(empty.progress_percentage(), 0);
    }

    #[test]
    fn percentage_is_floored_and_capped_while_running() {
        let mut run = running(Some(13));
        run.record(ItemOutcome::Created);
        assert_eq!(run.progress_percentage(), 7);

        let mut run = running(Some(2));
        run.record(ItemOutcome::Created);
        run.record(ItemOutcome::Created);
        assert_eq!(run.progress_percentage(), 99);

        run.complete(Utc::now()).unwrap();
        assert_eq!(run.progress_percentage(), 100);
    }

    #[test]
    fn percentage_is_monotonic_over_a_run() {
        let mut run = running(Some(13));
        let mut last = run.progress_percentage();
        for _ in 0..13 {
            run.record(ItemOutcome::Skipped);
            let current = run.progress_percentage();
            assert!(current >= last);
            assert!(current <= 99);
            last = current;
        }
        run.complete(Utc::now()).unwrap();
        assert_eq!(run.progress_percentage(), 100);
    }

    #[test]
    fn status_parses_from_storage_strings() {
        assert_eq!("running".parse::<SyncStatus>().unwrap(), SyncStatus::Running);
        assert!("stalled".parse::<SyncStatus>().is_err());
        assert!(SyncStatus::Failed.is_terminal());
        assert!(!SyncStatus::Running.is_terminal());
    }
}
