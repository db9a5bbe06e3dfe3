use std::sync::Arc;

use almanac_core::sources::ChartStore;
use almanac_core::sync::strategies::{reduce_outcomes, FanOutTask};
use almanac_core::{FetchedItems, SourceAdapter};
use almanac_domain::config::ListeningStatsConfig;
use almanac_domain::constants::SOURCE_LISTENING_STATS;
use almanac_domain::{ChartEntry, ItemOutcome, Result};
use async_trait::async_trait;
use tracing::warn;

use super::client::ListeningStatsClient;
use crate::http::HttpClient;

pub const CHART_CATEGORIES: [&str; 3] = ["artists", "tracks", "albums"];

/// Fan-out sync of the top-chart matrix.
///
/// A cell's outcome is the strongest outcome among its rows. A row that
/// cannot be stored counts the whole cell as failed while the remaining
/// rows are still written.
pub struct ListeningStatsAdapter {
    client: ListeningStatsClient,
    store: Arc<dyn ChartStore>,
    periods: Vec<String>,
}

impl ListeningStatsAdapter {
    pub fn new(
        config: &ListeningStatsConfig,
        http: HttpClient,
        store: Arc<dyn ChartStore>,
    ) -> Self {
        Self {
            client: ListeningStatsClient::new(config, http),
            store,
            periods: config.periods.clone(),
        }
    }

    async fn store_row(&self, entry: &ChartEntry) -> Result<ItemOutcome> {
        let outcome = match self.store.get(&entry.category, &entry.period, entry.rank).await? {
            Some(stored) if stored == *entry => return Ok(ItemOutcome::Skipped),
            Some(_) => ItemOutcome::Updated,
            None => ItemOutcome::Created,
        };
        self.store.upsert(entry).await?;
        Ok(outcome)
    }
}

#[async_trait]
impl SourceAdapter for ListeningStatsAdapter {
    type Item = FanOutTask;

    fn source_type(&self) -> &str {
        SOURCE_LISTENING_STATS
    }

    async fn fetch_items(&self) -> Result<FetchedItems<FanOutTask>> {
        Ok(FetchedItems::Sized(FanOutTask::matrix(&CHART_CATEGORIES, &self.periods)))
    }

    async fn process_item(&self, task: &FanOutTask) -> Result<ItemOutcome> {
        let rows = self.client.top_chart(&task.category, &task.period).await?;

        let mut outcomes = Vec::with_capacity(rows.len());
        for row in &rows {
            let result = match row.to_entry(&task.category, &task.period) {
                Ok(entry) => self.store_row(&entry).await,
                Err(err) => Err(err),
            };
            outcomes.push(result.unwrap_or_else(|err| {
                warn!(cell = %task.label(), row = %row.name, error = %err, "chart row failed");
                ItemOutcome::Failed
            }));
        }

        Ok(reduce_outcomes(outcomes))
    }

    fn describe_item(&self, task: &FanOutTask, _ordinal: u64) -> String {
        task.label()
    }
}
