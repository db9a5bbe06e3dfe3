//! Music-scrobble listening history
//!
//! History is paged newest-first and can run to tens of thousands of plays,
//! so it is handed to the orchestrator as a lazy stream with no known total.

mod adapter;
mod client;

pub use adapter::ScrobblesAdapter;
pub use client::{RecentTrack, ScrobblesClient};
