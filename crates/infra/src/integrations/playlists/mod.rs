//! Streaming-service playlists
//!
//! The full collection is pulled on every run. Each playlist carries a
//! snapshot id that changes whenever its contents do, which decides
//! whether the stored copy needs rewriting.

mod adapter;
mod client;

pub use adapter::PlaylistsAdapter;
pub use client::PlaylistsClient;
