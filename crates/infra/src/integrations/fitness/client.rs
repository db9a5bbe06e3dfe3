use almanac_domain::config::FitnessConfig;
use almanac_domain::{DailyActivity, Result};
use chrono::NaiveDate;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use super::super::{bearer, endpoint};
use crate::http::HttpClient;

/// One day as reported by the tracker API.
#[derive(Debug, Clone, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    #[serde(default)]
    pub steps: u32,
    #[serde(default)]
    pub distance_meters: f64,
    #[serde(default)]
    pub active_minutes: u32,
    #[serde(default)]
    pub calories: u32,
}

impl From<DailySummary> for DailyActivity {
    fn from(summary: DailySummary) -> Self {
        Self {
            date: summary.date,
            steps: summary.steps,
            distance_meters: summary.distance_meters,
            active_minutes: summary.active_minutes,
            calories: summary.calories,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DailySummaryPage {
    days: Vec<DailySummary>,
}

/// Client for `GET /v1/activity/daily`.
pub struct FitnessClient {
    http: HttpClient,
    base_url: String,
    access_token: String,
}

impl FitnessClient {
    pub fn new(config: &FitnessConfig, http: HttpClient) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            access_token: config.access_token.clone(),
        }
    }

    /// Summaries for every day in `start..=end` that the tracker knows about.
    pub async fn daily_summaries(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySummary>> {
        debug!(%start, %end, "fetching daily activity");
        let request = self
            .http
            .request(Method::GET, endpoint(&self.base_url, "v1/activity/daily"))
            .header(AUTHORIZATION, bearer(&self.access_token)?)
            .query(&[("start", start.to_string()), ("end", end.to_string())]);

        let page: DailySummaryPage = self.http.send_json(request).await?;
        Ok(page.days)
    }
}
