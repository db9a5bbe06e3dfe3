use almanac_domain::config::BooksConfig;
use almanac_domain::Result;
use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use super::super::endpoint;
use crate::http::HttpClient;

/// A book as listed on one of the user's shelves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShelfBook {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub shelf: String,
    /// 1 to 5; `0` or absent means unrated.
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub read_at: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct ShelfPage {
    books: Vec<ShelfBook>,
}

/// Client for `GET /v1/users/{id}/shelves/{shelf}/books`.
pub struct BooksClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
    user_id: String,
}

impl BooksClient {
    pub fn new(config: &BooksConfig, http: HttpClient) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            user_id: config.user_id.clone(),
        }
    }

    /// Every book on `shelf`, tagged with the shelf name.
    pub async fn shelf(&self, shelf: &str) -> Result<Vec<ShelfBook>> {
        debug!(shelf, "fetching shelf");
        let path = format!("v1/users/{}/shelves/{shelf}/books", self.user_id);
        let request = self
            .http
            .request(Method::GET, endpoint(&self.base_url, &path))
            .query(&[("key", self.api_key.as_str())]);

        let page: ShelfPage = self.http.send_json(request).await?;
        Ok(page
            .books
            .into_iter()
            .map(|book| ShelfBook { shelf: shelf.to_string(), ..book })
            .collect())
    }
}
