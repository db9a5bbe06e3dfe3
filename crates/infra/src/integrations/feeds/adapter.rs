use std::sync::Arc;

use almanac_core::sources::FeedEntryStore;
use almanac_core::{FetchedItems, SourceAdapter};
use almanac_domain::config::FeedsConfig;
use almanac_domain::constants::SOURCE_FEEDS;
use almanac_domain::{FeedEntry, ItemOutcome, Result};
use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use super::parser::parse_rss;
use crate::http::HttpClient;

/// Sync of every `<item>` across the configured feeds.
pub struct FeedsAdapter {
    http: HttpClient,
    urls: Vec<String>,
    store: Arc<dyn FeedEntryStore>,
}

impl FeedsAdapter {
    pub fn new(config: &FeedsConfig, http: HttpClient, store: Arc<dyn FeedEntryStore>) -> Self {
        Self { http, urls: config.urls.clone(), store }
    }
}

#[async_trait]
impl SourceAdapter for FeedsAdapter {
    type Item = FeedEntry;

    fn source_type(&self) -> &str {
        SOURCE_FEEDS
    }

    async fn fetch_items(&self) -> Result<FetchedItems<FeedEntry>> {
        let mut entries = Vec::new();
        for url in &self.urls {
            let xml = self.http.send_text(self.http.request(Method::GET, url)).await?;
            let parsed = parse_rss(url, &xml)?;
            debug!(feed = %url, entries = parsed.len(), "parsed feed");
            entries.extend(parsed);
        }
        Ok(FetchedItems::Sized(entries))
    }

    async fn process_item(&self, entry: &FeedEntry) -> Result<ItemOutcome> {
        let outcome = match self.store.get(&entry.feed_url, &entry.guid).await? {
            Some(stored) if stored == *entry => return Ok(ItemOutcome::Skipped),
            Some(_) => ItemOutcome::Updated,
            None => ItemOutcome::Created,
        };
        self.store.upsert(entry).await?;
        Ok(outcome)
    }

    fn describe_item(&self, entry: &FeedEntry, ordinal: u64) -> String {
        if entry.title.is_empty() {
            format!("Entry #{ordinal}")
        } else {
            entry.title.clone()
        }
    }
}
