//! Shared test helpers for `almanac-core` integration tests.
//!
//! In-memory implementations of the sync ports plus scripted adapters, so
//! orchestrator tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod adapters;
pub mod repositories;

pub use adapters::{KeyedStoreAdapter, ScriptedAdapter, Step};
pub use repositories::{MemoryLogSink, MockSyncRunRepository, RecordingBroadcaster};
