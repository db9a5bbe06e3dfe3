//! Scripted source adapters

use std::collections::HashMap;
use std::sync::Arc;

use almanac_core::{FetchedItems, RunMetadata, SourceAdapter};
use almanac_domain::{AlmanacError, ItemOutcome, Result as DomainResult};
use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use serde_json::json;

/// What a scripted item does when processed.
#[derive(Debug, Clone)]
pub enum Step {
    Outcome(ItemOutcome),
    Error(String),
}

/// Adapter that replays a fixed script of item results.
#[derive(Clone)]
pub struct ScriptedAdapter {
    source_type: String,
    steps: Vec<(String, Step)>,
    lazy: bool,
    fetch_error: Option<AlmanacError>,
    stream_error_after: Option<usize>,
    after_error: Option<AlmanacError>,
    after_metadata: Option<(String, serde_json::Value)>,
    processed: Arc<Mutex<Vec<String>>>,
}

impl ScriptedAdapter {
    pub fn new(source_type: &str, steps: Vec<(String, Step)>) -> Self {
        Self {
            source_type: source_type.to_string(),
            steps,
            lazy: false,
            fetch_error: None,
            stream_error_after: None,
            after_error: None,
            after_metadata: None,
            processed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `count` items that all produce `outcome`.
    pub fn uniform(source_type: &str, count: usize, outcome: ItemOutcome) -> Self {
        let steps =
            (1..=count).map(|n| (format!("entry-{n}"), Step::Outcome(outcome))).collect();
        Self::new(source_type, steps)
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn failing_fetch(mut self, error: AlmanacError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    /// Lazy stream yields an error after `count` items.
    pub fn stream_error_after(mut self, count: usize) -> Self {
        self.lazy = true;
        self.stream_error_after = Some(count);
        self
    }

    pub fn failing_after_items(mut self, error: AlmanacError) -> Self {
        self.after_error = Some(error);
        self
    }

    pub fn with_after_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.after_metadata = Some((key.to_string(), value));
        self
    }

    pub fn processed(&self) -> Vec<String> {
        self.processed.lock().clone()
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    type Item = (String, Step);

    fn source_type(&self) -> &str {
        &self.source_type
    }

    async fn fetch_items(&self) -> DomainResult<FetchedItems<Self::Item>> {
        if let Some(error) = &self.fetch_error {
            return Err(error.clone());
        }
        if !self.lazy {
            return Ok(FetchedItems::Sized(self.steps.clone()));
        }

        let mut items: Vec<DomainResult<Self::Item>> = self.steps.iter().cloned().map(Ok).collect();
        if let Some(count) = self.stream_error_after {
            items.truncate(count);
            items.push(Err(AlmanacError::Network("connection reset while paging".into())));
        }
        Ok(FetchedItems::Lazy(Box::pin(stream::iter(items))))
    }

    async fn process_item(&self, item: &Self::Item) -> DomainResult<ItemOutcome> {
        let (name, step) = item;
        self.processed.lock().push(name.clone());
        match step {
            Step::Outcome(outcome) => Ok(*outcome),
            Step::Error(message) => Err(AlmanacError::Source(message.clone())),
        }
    }

    fn describe_item(&self, item: &Self::Item, _ordinal: u64) -> String {
        item.0.clone()
    }

    async fn after_items(&self, metadata: &mut RunMetadata) -> DomainResult<()> {
        if let Some(error) = &self.after_error {
            return Err(error.clone());
        }
        if let Some((key, value)) = &self.after_metadata {
            metadata.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Adapter backed by a keyed in-memory store, for idempotence checks.
///
/// Each upstream item is `(key, value)`; the store classifies it as
/// created, updated, or skipped.
#[derive(Clone, Default)]
pub struct KeyedStoreAdapter {
    upstream: Arc<Mutex<Vec<(String, String)>>>,
    store: Arc<Mutex<HashMap<String, String>>>,
}

impl KeyedStoreAdapter {
    pub fn new(upstream: &[(&str, &str)]) -> Self {
        let adapter = Self::default();
        adapter.set_upstream(upstream);
        adapter
    }

    pub fn set_upstream(&self, upstream: &[(&str, &str)]) {
        *self.upstream.lock() =
            upstream.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
    }

    pub fn stored(&self) -> HashMap<String, String> {
        self.store.lock().clone()
    }
}

#[async_trait]
impl SourceAdapter for KeyedStoreAdapter {
    type Item = (String, String);

    fn source_type(&self) -> &str {
        "playlists"
    }

    async fn fetch_items(&self) -> DomainResult<FetchedItems<Self::Item>> {
        Ok(self.upstream.lock().clone().into())
    }

    async fn process_item(&self, item: &Self::Item) -> DomainResult<ItemOutcome> {
        let (key, value) = item;
        let mut store = self.store.lock();
        let outcome = match store.get(key) {
            None => ItemOutcome::Created,
            Some(existing) if existing == value => ItemOutcome::Skipped,
            Some(_) => ItemOutcome::Updated,
        };
        store.insert(key.clone(), value.clone());
        Ok(outcome)
    }

    async fn after_items(&self, metadata: &mut RunMetadata) -> DomainResult<()> {
        metadata.insert("stored".into(), json!(self.store.lock().len()));
        Ok(())
    }
}
