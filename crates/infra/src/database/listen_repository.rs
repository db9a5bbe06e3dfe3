//! Listening history keyed by `(played_at, artist, track)`.

use std::sync::Arc;

use almanac_core::sources::ListenStore;
use almanac_domain::{Listen, Result as DomainResult};
use async_trait::async_trait;
use rusqlite::params;
use tokio::task;

use super::manager::DbManager;
use super::sql::{map_sql_error, map_storage_error, to_millis};
use crate::errors::map_join_error;

pub struct SqliteListenRepository {
    db: Arc<DbManager>,
}

impl SqliteListenRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Number of stored plays.
    pub async fn count(&self) -> DomainResult<u64> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<u64> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM listens", [], |row| row.get(0))
                .map_err(map_sql_error)?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl ListenStore for SqliteListenRepository {
    async fn exists(&self, listen: &Listen) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);
        let listen = listen.clone();
        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT EXISTS (
                    SELECT 1 FROM listens WHERE played_at = ?1 AND artist = ?2 AND track = ?3
                 )",
                params![to_millis(listen.played_at), listen.artist, listen.track],
                |row| row.get(0),
            )
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn insert(&self, listen: &Listen) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let listen = listen.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.exec(
                "INSERT OR IGNORE INTO listens (played_at, artist, track, album)
                 VALUES (?1, ?2, ?3, ?4)",
                &[&to_millis(listen.played_at), &listen.artist, &listen.track, &listen.album],
            )
            .map(|_| ())
            .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }
}
