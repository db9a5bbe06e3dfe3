use almanac_domain::config::PlaylistsConfig;
use almanac_domain::{Playlist, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use super::super::{bearer, endpoint};
use crate::http::HttpClient;

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    items: Vec<PlaylistObject>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistObject {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    owner: Option<OwnerObject>,
    tracks: TrackSummary,
    snapshot_id: String,
}

#[derive(Debug, Deserialize)]
struct OwnerObject {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackSummary {
    total: u32,
}

impl From<PlaylistObject> for Playlist {
    fn from(object: PlaylistObject) -> Self {
        Self {
            external_id: object.id,
            name: object.name,
            owner: object.owner.and_then(|owner| owner.display_name),
            description: object.description.filter(|d| !d.is_empty()),
            track_count: object.tracks.total,
            snapshot_id: object.snapshot_id,
        }
    }
}

/// Client for `GET /v1/me/playlists`, following `next` links.
pub struct PlaylistsClient {
    http: HttpClient,
    base_url: String,
    access_token: String,
    page_size: u32,
}

impl PlaylistsClient {
    pub fn new(config: &PlaylistsConfig, http: HttpClient) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            access_token: config.access_token.clone(),
            page_size: config.page_size.clamp(1, 50),
        }
    }

    /// Every playlist in the user's library.
    pub async fn all_playlists(&self) -> Result<Vec<Playlist>> {
        let mut playlists = Vec::new();
        let first = self
            .http
            .request(Method::GET, endpoint(&self.base_url, "v1/me/playlists"))
            .query(&[("limit", self.page_size.to_string()), ("offset", "0".to_string())]);
        let mut request = Some(first);

        while let Some(builder) = request.take() {
            let page: PlaylistPage = self
                .http
                .send_json(builder.header(AUTHORIZATION, bearer(&self.access_token)?))
                .await?;
            debug!(count = page.items.len(), "fetched playlists page");
            playlists.extend(page.items.into_iter().map(Playlist::from));
            request = page.next.map(|next| self.http.request(Method::GET, next));
        }

        Ok(playlists)
    }
}
