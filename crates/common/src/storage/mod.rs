//! Storage primitives for the local SQLite database
//!
//! Provides an r2d2-backed connection pool, per-connection pragmas, and the
//! storage error type. Schema ownership stays with the application layer.

pub mod error;
pub mod sqlite;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use sqlite::{apply_connection_pragmas, PooledSqlite, SqlitePool, SqlitePoolConfig};
