//! Service layer
//!
//! Wires configuration, storage, and source adapters together for callers
//! that start sync runs.

pub mod sync_service;

pub use sync_service::SyncService;
