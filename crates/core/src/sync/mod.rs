//! Sync orchestration
//!
//! A run is driven by [`SyncOrchestrator`]: it asks a [`SourceAdapter`] for
//! items, processes them strictly in sequence, keeps the [`SyncRun`]
//! counters in step with storage, and publishes progress snapshots.
//!
//! [`SourceAdapter`]: ports::SourceAdapter
//! [`SyncRun`]: almanac_domain::SyncRun

pub mod cadence;
pub mod orchestrator;
pub mod ports;
pub mod strategies;

pub use cadence::{BroadcastCadence, BroadcastTrigger};
pub use orchestrator::SyncOrchestrator;
