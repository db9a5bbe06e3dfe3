use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use almanac_core::sources::DailyActivityStore;
use almanac_core::sync::strategies::SyncWindow;
use almanac_core::{FetchedItems, RunMetadata, SourceAdapter};
use almanac_domain::config::FitnessConfig;
use almanac_domain::constants::{METADATA_WINDOW_END, METADATA_WINDOW_START, SOURCE_FITNESS};
use almanac_domain::{DailyActivity, ItemOutcome, Result};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use parking_lot::Mutex;
use serde_json::json;
use tracing::info;

use super::client::FitnessClient;
use crate::http::HttpClient;

/// Days requested per API call.
const DAYS_PER_REQUEST: u64 = 31;

/// Date-windowed sync of daily activity totals.
///
/// Every day in the window becomes one item, including days the tracker
/// does not report; those arrive as empty days and are skipped.
pub struct FitnessAdapter {
    client: FitnessClient,
    store: Arc<dyn DailyActivityStore>,
    overlap_days: u32,
    floor_date: NaiveDate,
    request_delay: Duration,
    today: Option<NaiveDate>,
    window: Mutex<Option<SyncWindow>>,
}

impl FitnessAdapter {
    pub fn new(config: &FitnessConfig, http: HttpClient, store: Arc<dyn DailyActivityStore>) -> Self {
        Self {
            client: FitnessClient::new(config, http),
            store,
            overlap_days: config.overlap_days,
            floor_date: config.floor_date,
            request_delay: Duration::from_millis(config.request_delay_ms),
            today: None,
            window: Mutex::new(None),
        }
    }

    /// Pin the end of the window instead of using the current date.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    async fn fetch_window(&self, window: SyncWindow) -> Result<HashMap<NaiveDate, DailyActivity>> {
        let mut by_date = HashMap::with_capacity(window.len());
        let mut chunk_start = window.start;

        while chunk_start <= window.end {
            let chunk_end = chunk_start
                .checked_add_days(Days::new(DAYS_PER_REQUEST - 1))
                .map_or(window.end, |end| end.min(window.end));

            for summary in self.client.daily_summaries(chunk_start, chunk_end).await? {
                if window.contains(summary.date) {
                    by_date.insert(summary.date, DailyActivity::from(summary));
                }
            }

            match chunk_end.succ_opt() {
                Some(next) if next <= window.end => {
                    chunk_start = next;
                    if !self.request_delay.is_zero() {
                        tokio::time::sleep(self.request_delay).await;
                    }
                }
                _ => break,
            }
        }

        Ok(by_date)
    }
}

fn empty_day(date: NaiveDate) -> DailyActivity {
    DailyActivity { date, steps: 0, distance_meters: 0.0, active_minutes: 0, calories: 0 }
}

#[async_trait]
impl SourceAdapter for FitnessAdapter {
    type Item = DailyActivity;

    fn source_type(&self) -> &str {
        SOURCE_FITNESS
    }

    async fn fetch_items(&self) -> Result<FetchedItems<DailyActivity>> {
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let last_known = self.store.latest_date().await?;
        let window = SyncWindow::compute(last_known, self.overlap_days, self.floor_date, today);
        *self.window.lock() = Some(window);

        if window.is_empty() {
            info!(start = %window.start, end = %window.end, "fitness window is empty");
            return Ok(FetchedItems::Sized(Vec::new()));
        }

        let mut by_date = self.fetch_window(window).await?;
        let days = window
            .days()
            .map(|date| by_date.remove(&date).unwrap_or_else(|| empty_day(date)))
            .collect();
        Ok(FetchedItems::Sized(days))
    }

    async fn process_item(&self, day: &DailyActivity) -> Result<ItemOutcome> {
        if day.is_empty() {
            return Ok(ItemOutcome::Skipped);
        }

        let outcome = match self.store.get(day.date).await? {
            Some(stored) if stored == *day => return Ok(ItemOutcome::Skipped),
            Some(_) => ItemOutcome::Updated,
            None => ItemOutcome::Created,
        };
        self.store.upsert(day).await?;
        Ok(outcome)
    }

    fn describe_item(&self, day: &DailyActivity, _ordinal: u64) -> String {
        day.date.to_string()
    }

    async fn after_items(&self, metadata: &mut RunMetadata) -> Result<()> {
        if let Some(window) = *self.window.lock() {
            metadata.insert(METADATA_WINDOW_START.into(), json!(window.start.to_string()));
            metadata.insert(METADATA_WINDOW_END.into(), json!(window.end.to_string()));
        }
        Ok(())
    }
}
