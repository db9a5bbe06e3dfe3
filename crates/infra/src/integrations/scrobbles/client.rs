use almanac_domain::config::ScrobblesConfig;
use almanac_domain::{Listen, Result};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::http::HttpClient;

/// One entry of `user.getrecenttracks`.
///
/// The track currently playing has no `date` and is flagged through
/// `@attr.nowplaying`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentTrack {
    pub name: String,
    pub artist: TextNode,
    #[serde(default)]
    pub album: Option<TextNode>,
    #[serde(default)]
    pub date: Option<PlayedAt>,
    #[serde(rename = "@attr", default)]
    pub attr: Option<NowPlaying>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextNode {
    #[serde(rename = "#text", default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayedAt {
    #[serde(deserialize_with = "string_number")]
    pub uts: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NowPlaying {
    #[serde(default)]
    pub nowplaying: Option<String>,
}

impl RecentTrack {
    pub fn is_now_playing(&self) -> bool {
        self.attr.as_ref().and_then(|attr| attr.nowplaying.as_deref()) == Some("true")
    }

    /// The listen this entry represents, if it has been scrobbled.
    pub fn to_listen(&self) -> Option<Listen> {
        if self.is_now_playing() {
            return None;
        }
        let played_at = DateTime::from_timestamp(self.date.as_ref()?.uts, 0)?;
        let album = self.album.as_ref().map(|album| album.text.clone()).filter(|s| !s.is_empty());
        Some(Listen {
            played_at,
            artist: self.artist.text.clone(),
            track: self.name.clone(),
            album,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RecentTracksEnvelope {
    recenttracks: RecentTracksPage,
}

#[derive(Debug, Deserialize)]
struct RecentTracksPage {
    #[serde(default)]
    track: Vec<RecentTrack>,
    #[serde(rename = "@attr")]
    attr: PageAttr,
}

#[derive(Debug, Deserialize)]
struct PageAttr {
    #[serde(deserialize_with = "string_number")]
    page: i64,
    #[serde(rename = "totalPages", deserialize_with = "string_number")]
    total_pages: i64,
}

/// One page of history plus whether another one follows.
#[derive(Debug)]
pub struct HistoryPage {
    pub tracks: Vec<RecentTrack>,
    pub has_next: bool,
}

/// Client for the scrobble service's `user.getrecenttracks` method.
#[derive(Clone)]
pub struct ScrobblesClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    user: String,
    page_size: u32,
}

impl ScrobblesClient {
    pub fn new(config: &ScrobblesConfig, http: HttpClient) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            user: config.user.clone(),
            page_size: config.page_size.max(1),
        }
    }

    /// Fetch page `page` (1-based) of plays after `from`, newest first.
    pub async fn recent_tracks(&self, page: u32, from: Option<DateTime<Utc>>) -> Result<HistoryPage> {
        debug!(page, "fetching scrobble history page");
        let mut query = vec![
            ("method", "user.getrecenttracks".to_string()),
            ("user", self.user.clone()),
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("limit", self.page_size.to_string()),
            ("page", page.to_string()),
        ];
        if let Some(from) = from {
            query.push(("from", from.timestamp().to_string()));
        }

        let request = self.http.request(Method::GET, &self.base_url).query(&query);
        let envelope: RecentTracksEnvelope = self.http.send_json(request).await?;
        let page = envelope.recenttracks;
        Ok(HistoryPage { has_next: page.attr.page < page.attr.total_pages, tracks: page.track })
    }
}

/// The API encodes numbers as strings; accept both.
fn string_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
