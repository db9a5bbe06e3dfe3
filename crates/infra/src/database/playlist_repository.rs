//! Playlists keyed by upstream id.

use std::sync::Arc;

use almanac_core::sources::PlaylistStore;
use almanac_domain::{Playlist, Result as DomainResult};
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::DbManager;
use super::sql::{column_u32, map_sql_error, map_storage_error, now_millis};
use crate::errors::map_join_error;

pub struct SqlitePlaylistRepository {
    db: Arc<DbManager>,
}

impl SqlitePlaylistRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlaylistStore for SqlitePlaylistRepository {
    async fn get(&self, external_id: &str) -> DomainResult<Option<Playlist>> {
        let db = Arc::clone(&self.db);
        let external_id = external_id.to_string();
        task::spawn_blocking(move || -> DomainResult<Option<Playlist>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT external_id, name, owner, description, track_count, snapshot_id
                 FROM playlists WHERE external_id = ?1",
                params![external_id],
                map_playlist_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, playlist: &Playlist) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let playlist = playlist.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.exec(
                "INSERT INTO playlists
                    (external_id, name, owner, description, track_count, snapshot_id, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (external_id) DO UPDATE SET
                    name = excluded.name,
                    owner = excluded.owner,
                    description = excluded.description,
                    track_count = excluded.track_count,
                    snapshot_id = excluded.snapshot_id,
                    updated_at = excluded.updated_at",
                &[
                    &playlist.external_id,
                    &playlist.name,
                    &playlist.owner,
                    &playlist.description,
                    &playlist.track_count,
                    &playlist.snapshot_id,
                    &now_millis(),
                ],
            )
            .map(|_| ())
            .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_playlist_row(row: &Row<'_>) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        external_id: row.get(0)?,
        name: row.get(1)?,
        owner: row.get(2)?,
        description: row.get(3)?,
        track_count: column_u32(row.get(4)?, 4)?,
        snapshot_id: row.get(5)?,
    })
}
