//! # Almanac Domain
//!
//! Business domain types and models for the Almanac sync engine.
//!
//! This crate contains:
//! - Sync run state (`SyncRun`, `SyncStatus`, `ItemOutcome`)
//! - Structured log records (`LogRecord`, `LogLevel`)
//! - Locally stored source records (`DailyActivity`, `Book`, ...)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other Almanac crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
