use std::sync::Arc;
use std::time::Duration;

use almanac_core::sources::ListenStore;
use almanac_core::{FetchedItems, RunMetadata, SourceAdapter, SyncRunRepository};
use almanac_domain::config::ScrobblesConfig;
use almanac_domain::constants::{METADATA_PLAYED_THROUGH, SOURCE_SCROBBLES};
use almanac_domain::{AlmanacError, ItemOutcome, Listen, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use parking_lot::Mutex;
use serde_json::json;
use tracing::debug;

use super::client::{RecentTrack, ScrobblesClient};
use crate::http::HttpClient;

/// Incremental listening-history sync.
///
/// Each completed run records in its metadata the newest play it has
/// covered (`played_through`). The next run requests only plays after that
/// mark. A run that fails, or that completes with failed items, never moves
/// the mark forward, so a retry fetches the gap again and the already
/// stored plays come back as skipped.
///
/// Pages are fetched as the orchestrator consumes the stream, so a failing
/// page request fails the run after the earlier pages have been applied.
pub struct ScrobblesAdapter {
    client: ScrobblesClient,
    store: Arc<dyn ListenStore>,
    runs: Arc<dyn SyncRunRepository>,
    request_delay: Duration,
    mark: Mutex<PlayedThrough>,
}

/// High-water mark bookkeeping for one run.
#[derive(Debug, Default)]
struct PlayedThrough {
    previous: Option<DateTime<Utc>>,
    newest_applied: Option<DateTime<Utc>>,
    incomplete: bool,
}

impl PlayedThrough {
    fn starting_from(previous: Option<DateTime<Utc>>) -> Self {
        Self { previous, ..Self::default() }
    }

    fn applied(&mut self, played_at: DateTime<Utc>) {
        self.newest_applied = self.newest_applied.max(Some(played_at));
    }

    /// Mark to record once the run completes.
    fn next(&self) -> Option<DateTime<Utc>> {
        if self.incomplete {
            self.previous
        } else {
            self.previous.max(self.newest_applied)
        }
    }
}

impl ScrobblesAdapter {
    pub fn new(
        config: &ScrobblesConfig,
        http: HttpClient,
        store: Arc<dyn ListenStore>,
        runs: Arc<dyn SyncRunRepository>,
    ) -> Self {
        Self {
            client: ScrobblesClient::new(config, http),
            store,
            runs,
            request_delay: Duration::from_millis(config.request_delay_ms),
            mark: Mutex::new(PlayedThrough::default()),
        }
    }

    async fn previous_mark(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(run) = self.runs.latest_completed(SOURCE_SCROBBLES).await? else {
            return Ok(None);
        };
        Ok(run
            .metadata
            .get(METADATA_PLAYED_THROUGH)
            .and_then(serde_json::Value::as_i64)
            .and_then(|uts| DateTime::from_timestamp(uts, 0)))
    }

    async fn apply(&self, listen: &Listen) -> Result<ItemOutcome> {
        if self.store.exists(listen).await? {
            return Ok(ItemOutcome::Skipped);
        }
        self.store.insert(listen).await?;
        Ok(ItemOutcome::Created)
    }
}

struct PageCursor {
    next_page: Option<u32>,
}

#[async_trait]
impl SourceAdapter for ScrobblesAdapter {
    type Item = RecentTrack;

    fn source_type(&self) -> &str {
        SOURCE_SCROBBLES
    }

    async fn fetch_items(&self) -> Result<FetchedItems<RecentTrack>> {
        let previous = self.previous_mark().await?;
        *self.mark.lock() = PlayedThrough::starting_from(previous);
        debug!(played_through = ?previous, "requesting scrobbles after high-water mark");

        let from = previous.map(|mark| mark + chrono::Duration::seconds(1));
        let client = self.client.clone();
        let delay = self.request_delay;

        let pages = stream::try_unfold(PageCursor { next_page: Some(1) }, move |cursor| {
            let client = client.clone();
            async move {
                let Some(page) = cursor.next_page else {
                    return Ok(None);
                };
                if page > 1 && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                let history = client.recent_tracks(page, from).await?;
                let next_page = history.has_next.then_some(page + 1);
                Ok::<_, AlmanacError>(Some((history.tracks, PageCursor { next_page })))
            }
        });

        let tracks = pages
            .map_ok(|tracks| stream::iter(tracks.into_iter().map(Ok::<_, AlmanacError>)))
            .try_flatten();
        Ok(FetchedItems::Lazy(tracks.boxed()))
    }

    async fn process_item(&self, track: &RecentTrack) -> Result<ItemOutcome> {
        let Some(listen) = track.to_listen() else {
            return Ok(ItemOutcome::Skipped);
        };

        let outcome = self.apply(&listen).await;
        let mut mark = self.mark.lock();
        match &outcome {
            Ok(_) => mark.applied(listen.played_at),
            Err(_) => mark.incomplete = true,
        }
        outcome
    }

    fn describe_item(&self, track: &RecentTrack, _ordinal: u64) -> String {
        format!("{} - {}", track.artist.text, track.name)
    }

    async fn after_items(&self, metadata: &mut RunMetadata) -> Result<()> {
        if let Some(mark) = self.mark.lock().next() {
            metadata.insert(METADATA_PLAYED_THROUGH.into(), json!(mark.timestamp()));
        }
        Ok(())
    }
}
