//! Log sink implementations
//!
//! - [`TracingLogSink`]: forwards records to the process `tracing` subscriber
//! - [`TeeLogSink`]: fans one record out to several sinks
//!
//! The persistent sink lives with the other repositories as
//! [`SqliteLogRepository`](crate::database::SqliteLogRepository).

mod tee;
mod tracing_sink;

pub use tee::TeeLogSink;
pub use tracing_sink::TracingLogSink;
