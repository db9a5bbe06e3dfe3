//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Almanac
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AlmanacError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The remote source answered, but with something we cannot use
    /// (unexpected status, malformed payload).
    #[error("Source error: {0}")]
    Source(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AlmanacError {
    /// Whether retrying the failed operation later could plausibly succeed.
    ///
    /// The sync core never retries on its own; the task-queue layer that
    /// invokes a run consults this when deciding on backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Database(_))
    }
}

/// Result type alias for Almanac operations
pub type Result<T> = std::result::Result<T, AlmanacError>;
