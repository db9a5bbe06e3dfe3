use std::sync::Arc;

use almanac_core::sources::PlaylistStore;
use almanac_core::sync::strategies::classify_marker;
use almanac_core::{FetchedItems, SourceAdapter};
use almanac_domain::config::PlaylistsConfig;
use almanac_domain::constants::SOURCE_PLAYLISTS;
use almanac_domain::{ItemOutcome, Playlist, Result};
use async_trait::async_trait;

use super::client::PlaylistsClient;
use crate::http::HttpClient;

/// Full-collection playlist sync keyed on the snapshot marker.
pub struct PlaylistsAdapter {
    client: PlaylistsClient,
    store: Arc<dyn PlaylistStore>,
}

impl PlaylistsAdapter {
    pub fn new(config: &PlaylistsConfig, http: HttpClient, store: Arc<dyn PlaylistStore>) -> Self {
        Self { client: PlaylistsClient::new(config, http), store }
    }
}

#[async_trait]
impl SourceAdapter for PlaylistsAdapter {
    type Item = Playlist;

    fn source_type(&self) -> &str {
        SOURCE_PLAYLISTS
    }

    async fn fetch_items(&self) -> Result<FetchedItems<Playlist>> {
        Ok(FetchedItems::Sized(self.client.all_playlists().await?))
    }

    async fn process_item(&self, playlist: &Playlist) -> Result<ItemOutcome> {
        let stored = self.store.get(&playlist.external_id).await?;
        let marker = stored.as_ref().map(|p| p.snapshot_id.as_str());

        let outcome = classify_marker(marker, playlist.snapshot_id.as_str());
        if outcome != ItemOutcome::Skipped {
            self.store.upsert(playlist).await?;
        }
        Ok(outcome)
    }

    fn describe_item(&self, playlist: &Playlist, _ordinal: u64) -> String {
        playlist.name.clone()
    }
}
