//! Progress snapshot published to live observers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sync_run::{SyncRun, SyncStatus};

/// Point-in-time view of a [`SyncRun`] suitable for pub/sub delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRunSnapshot {
    pub run_id: Uuid,
    pub source_type: String,
    pub status: SyncStatus,
    pub processed_items: u64,
    pub total_items: Option<u64>,
    pub percentage: u8,
    pub created_count: u64,
    pub updated_count: u64,
    pub skipped_count: u64,
    pub failed_count: u64,
    pub error_message: Option<String>,
}

impl From<&SyncRun> for SyncRunSnapshot {
    fn from(run: &SyncRun) -> Self {
        Self {
            run_id: run.id,
            source_type: run.source_type.clone(),
            status: run.status,
            processed_items: run.processed_items,
            total_items: run.total_items,
            percentage: run.progress_percentage(),
            created_count: run.created_count,
            updated_count: run.updated_count,
            skipped_count: run.skipped_count,
            failed_count: run.failed_count,
            error_message: run.error_message.clone(),
        }
    }
}
