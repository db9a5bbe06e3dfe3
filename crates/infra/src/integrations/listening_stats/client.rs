use almanac_domain::config::ListeningStatsConfig;
use almanac_domain::{AlmanacError, ChartEntry, Result};
use reqwest::Method;
use serde::Deserialize;

use crate::http::HttpClient;

/// One ranked row of a top chart.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartItem {
    pub name: String,
    #[serde(default)]
    pub playcount: String,
    #[serde(default)]
    pub artist: Option<ArtistRef>,
    #[serde(rename = "@attr")]
    pub attr: RankAttr,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankAttr {
    pub rank: String,
}

impl ChartItem {
    pub fn to_entry(&self, category: &str, period: &str) -> Result<ChartEntry> {
        let rank = self.attr.rank.trim().parse().map_err(|_| {
            AlmanacError::Source(format!("invalid chart rank '{}' for {}", self.attr.rank, self.name))
        })?;
        Ok(ChartEntry {
            category: category.to_string(),
            period: period.to_string(),
            rank,
            name: self.name.clone(),
            artist: self.artist.as_ref().map(|artist| artist.name.clone()),
            play_count: self.playcount.trim().parse().unwrap_or(0),
        })
    }
}

/// Client for the `user.gettop{artists,tracks,albums}` methods.
pub struct ListeningStatsClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    user: String,
    limit: u32,
}

impl ListeningStatsClient {
    pub fn new(config: &ListeningStatsConfig, http: HttpClient) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            user: config.user.clone(),
            limit: config.limit.max(1),
        }
    }

    /// The top chart for `category` (`artists`, `tracks`, or `albums`) over
    /// `period`.
    pub async fn top_chart(&self, category: &str, period: &str) -> Result<Vec<ChartItem>> {
        let request = self.http.request(Method::GET, &self.base_url).query(&[
            ("method", format!("user.gettop{category}")),
            ("user", self.user.clone()),
            ("api_key", self.api_key.clone()),
            ("period", period.to_string()),
            ("limit", self.limit.to_string()),
            ("format", "json".to_string()),
        ]);

        // {"topartists": {"artist": [...], "@attr": {...}}}
        let body: serde_json::Value = self.http.send_json(request).await?;
        let chart = body
            .get(format!("top{category}"))
            .ok_or_else(|| AlmanacError::Source(format!("response has no top{category} chart")))?;

        match chart.get(category.trim_end_matches('s')) {
            None => Ok(Vec::new()),
            Some(rows) => serde_json::from_value(rows.clone())
                .map_err(|err| AlmanacError::Source(format!("malformed {category} chart: {err}"))),
        }
    }
}
