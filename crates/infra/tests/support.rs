//! Shared fixtures for infra integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use almanac_core::{LogSink, StatusBroadcaster, SyncRunRepository};
use almanac_infra::database::{DbManager, SqliteLogRepository, SqliteSyncRunRepository};
use almanac_infra::{ChannelBroadcaster, HttpClient};
use tempfile::TempDir;

/// Temporary database with the schema applied. The file lives as long as
/// the value.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("almanac-test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn runs(&self) -> Arc<SqliteSyncRunRepository> {
        Arc::new(SqliteSyncRunRepository::new(Arc::clone(&self.manager)))
    }

    pub fn logs(&self) -> Arc<SqliteLogRepository> {
        Arc::new(SqliteLogRepository::new(Arc::clone(&self.manager)))
    }

    /// Number of rows in `table`.
    pub fn count(&self, table: &str) -> i64 {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count query should succeed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client with a short backoff so retry paths stay fast.
pub fn http_client() -> HttpClient {
    HttpClient::builder()
        .max_attempts(2)
        .base_backoff(Duration::from_millis(5))
        .timeout(Duration::from_secs(5))
        .build()
        .expect("http client should build")
}

/// Repository, sink, and broadcaster handles in the shape the orchestrator
/// expects.
pub struct Ports {
    pub runs: Arc<dyn SyncRunRepository>,
    pub logs: Arc<dyn LogSink>,
    pub broadcaster: Arc<dyn StatusBroadcaster>,
}

pub fn ports(db: &TestDatabase, broadcaster: &ChannelBroadcaster) -> Ports {
    Ports {
        runs: db.runs(),
        logs: db.logs(),
        broadcaster: Arc::new(broadcaster.clone()),
    }
}
