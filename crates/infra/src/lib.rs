//! # Almanac Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - SQLite repositories for sync runs, logs, and per-source records
//! - Log sinks and the in-process progress broadcaster
//! - Configuration loading and the retrying HTTP client
//! - Source adapters for the external services
//!
//! ## Architecture
//! - Implements traits defined in `almanac-core`
//! - Depends on `almanac-common`, `almanac-domain`, and `almanac-core`
//! - Contains all "impure" code (I/O, network)

pub mod broadcast;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod logging;
pub mod services;

pub use broadcast::{ChannelBroadcaster, NoopBroadcaster};
pub use database::*;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use logging::{TeeLogSink, TracingLogSink};
pub use services::SyncService;
