//! # Almanac Core
//!
//! Pure orchestration logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - The sync orchestrator and its progress/broadcast rules
//! - Port interfaces (traits) for adapters, run storage, logging, and
//!   broadcasting
//! - Reusable adapter strategies (date windows, snapshot markers, deletion
//!   detection, fan-out reduction)
//! - Fuzzy matching utilities for sources without stable identifiers
//!
//! ## Architecture Principles
//! - Only depends on `almanac-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod matching;
pub mod sources;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use matching::{normalize, FuzzyMatcher, MatchRule};
pub use sync::ports::{
    FetchedItems, ItemStream, LogSink, RunMetadata, SourceAdapter, StatusBroadcaster,
    SyncRunRepository,
};
pub use sync::{BroadcastCadence, BroadcastTrigger, SyncOrchestrator};
