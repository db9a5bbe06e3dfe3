use std::sync::Arc;

use almanac_core::sources::WorkoutStore;
use almanac_core::sync::strategies::{DeletionPlan, SeenKeys};
use almanac_core::{FetchedItems, RunMetadata, SourceAdapter};
use almanac_domain::config::WorkoutsConfig;
use almanac_domain::constants::{METADATA_DELETED_COUNT, SOURCE_WORKOUTS};
use almanac_domain::{ItemOutcome, Result, Workout};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::json;
use tracing::info;

use super::client::WorkoutsClient;
use crate::http::HttpClient;

/// Deletion-aware workout sync.
///
/// Ids are collected while items are processed. Once every item has been
/// seen, local workouts inside the same window that were not reported are
/// deleted and counted in the run metadata.
pub struct WorkoutsAdapter {
    client: WorkoutsClient,
    store: Arc<dyn WorkoutStore>,
    recency: Duration,
    now: Option<DateTime<Utc>>,
    since: Mutex<Option<DateTime<Utc>>>,
    seen: SeenKeys<String>,
}

impl WorkoutsAdapter {
    pub fn new(config: &WorkoutsConfig, http: HttpClient, store: Arc<dyn WorkoutStore>) -> Self {
        Self {
            client: WorkoutsClient::new(config, http),
            store,
            recency: Duration::days(i64::from(config.recency_days)),
            now: None,
            since: Mutex::new(None),
            seen: SeenKeys::new(),
        }
    }

    /// Pin the current time used to compute the recency window.
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

#[async_trait]
impl SourceAdapter for WorkoutsAdapter {
    type Item = Workout;

    fn source_type(&self) -> &str {
        SOURCE_WORKOUTS
    }

    async fn fetch_items(&self) -> Result<FetchedItems<Workout>> {
        let since = self.now.unwrap_or_else(Utc::now) - self.recency;
        *self.since.lock() = Some(since);
        self.seen.take();

        let workouts = self.client.workouts_since(since).await?;
        Ok(FetchedItems::Sized(workouts.into_iter().map(Workout::from).collect()))
    }

    async fn process_item(&self, workout: &Workout) -> Result<ItemOutcome> {
        self.seen.insert(workout.external_id.clone());

        let outcome = match self.store.get(&workout.external_id).await? {
            Some(stored) if stored == *workout => return Ok(ItemOutcome::Skipped),
            Some(_) => ItemOutcome::Updated,
            None => ItemOutcome::Created,
        };
        self.store.upsert(workout).await?;
        Ok(outcome)
    }

    fn describe_item(&self, workout: &Workout, _ordinal: u64) -> String {
        let label = workout.name.as_deref().unwrap_or(&workout.activity_type);
        format!("{label} on {}", workout.started_at.date_naive())
    }

    async fn after_items(&self, metadata: &mut RunMetadata) -> Result<()> {
        let Some(since) = *self.since.lock() else {
            return Ok(());
        };

        let local = self.store.ids_started_since(since).await?;
        let seen: Vec<String> = self.seen.take().into_iter().collect();
        let plan = DeletionPlan::compute(&local, &seen);

        let stale: Vec<String> = plan.deleted.into_iter().collect();
        let deleted = if stale.is_empty() { 0 } else { self.store.delete(&stale).await? };
        if deleted > 0 {
            info!(deleted, "removed workouts no longer reported upstream");
        }

        metadata.insert(METADATA_DELETED_COUNT.into(), json!(deleted));
        Ok(())
    }
}
