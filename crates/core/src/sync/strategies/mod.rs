//! Reusable pieces for writing source adapters
//!
//! Each helper captures one way an upstream signals change:
//! - [`window`]: date-windowed fetch with an overlap for late edits
//! - [`snapshot`]: an opaque change marker per item
//! - [`deletion`]: set difference against what is stored locally
//! - [`fanout`]: one logical item expanded into several sub-requests

pub mod deletion;
pub mod fanout;
pub mod snapshot;
pub mod window;

pub use deletion::{DeletionPlan, SeenKeys};
pub use fanout::{reduce_outcomes, FanOutTask};
pub use snapshot::classify_marker;
pub use window::SyncWindow;
