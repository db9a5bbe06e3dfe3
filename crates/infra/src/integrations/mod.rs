//! External source integrations
//!
//! Each module pairs a thin API client with a [`SourceAdapter`] that maps
//! upstream records onto local storage. Adapters receive their
//! configuration, an [`HttpClient`], and their store explicitly.
//!
//! [`SourceAdapter`]: almanac_core::SourceAdapter
//! [`HttpClient`]: crate::http::HttpClient

pub mod books;
pub mod feeds;
pub mod fitness;
pub mod listening_stats;
pub mod playlists;
pub mod scrobbles;
pub mod workouts;

use almanac_domain::{AlmanacError, Result};
use reqwest::header::HeaderValue;

/// `Authorization: Bearer <token>` header value.
pub(crate) fn bearer(token: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| AlmanacError::Config("access token contains invalid header characters".into()))
}

/// Join a path onto a configured base URL.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
