use almanac_domain::config::WorkoutsConfig;
use almanac_domain::{Result, Workout};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use super::super::{bearer, endpoint};
use crate::http::HttpClient;

/// A workout as reported by the tracker API.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(default)]
    pub name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub duration_seconds: u32,
    #[serde(default)]
    pub distance_meters: Option<f64>,
    #[serde(default)]
    pub calories: Option<u32>,
}

impl From<WorkoutRecord> for Workout {
    fn from(record: WorkoutRecord) -> Self {
        Self {
            external_id: record.id,
            activity_type: record.activity_type,
            name: record.name,
            started_at: record.start_time,
            duration_seconds: record.duration_seconds,
            distance_meters: record.distance_meters,
            calories: record.calories,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkoutPage {
    workouts: Vec<WorkoutRecord>,
    #[serde(default)]
    has_more: bool,
}

/// Client for the paginated `GET /v1/workouts` endpoint.
pub struct WorkoutsClient {
    http: HttpClient,
    base_url: String,
    access_token: String,
    page_size: u32,
}

impl WorkoutsClient {
    pub fn new(config: &WorkoutsConfig, http: HttpClient) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            access_token: config.access_token.clone(),
            page_size: config.page_size.max(1),
        }
    }

    /// Every workout started at or after `since`, following pagination.
    pub async fn workouts_since(&self, since: DateTime<Utc>) -> Result<Vec<WorkoutRecord>> {
        let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut workouts = Vec::new();
        let mut page = 1_u32;

        loop {
            debug!(page, "fetching workouts page");
            let request = self
                .http
                .request(Method::GET, endpoint(&self.base_url, "v1/workouts"))
                .header(AUTHORIZATION, bearer(&self.access_token)?)
                .query(&[
                    ("since", since.clone()),
                    ("page", page.to_string()),
                    ("per_page", self.page_size.to_string()),
                ]);

            let body: WorkoutPage = self.http.send_json(request).await?;
            let fetched = body.workouts.len();
            workouts.extend(body.workouts);

            if !body.has_more || fetched == 0 {
                return Ok(workouts);
            }
            page += 1;
        }
    }
}
