//! Top-N chart rows keyed by `(category, period, rank)`.

use std::sync::Arc;

use almanac_core::sources::ChartStore;
use almanac_domain::{ChartEntry, Result as DomainResult};
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::DbManager;
use super::sql::{column_u32, column_u64, map_sql_error, map_storage_error, now_millis, u64_to_i64};
use crate::errors::map_join_error;

pub struct SqliteChartRepository {
    db: Arc<DbManager>,
}

impl SqliteChartRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Every row of one chart, best rank first.
    pub async fn list(&self, category: &str, period: &str) -> DomainResult<Vec<ChartEntry>> {
        let db = Arc::clone(&self.db);
        let category = category.to_string();
        let period = period.to_string();
        task::spawn_blocking(move || -> DomainResult<Vec<ChartEntry>> {
            let conn = db.get_connection()?;
            conn.query_all(
                "SELECT category, period, rank, name, artist, play_count
                 FROM listening_stats WHERE category = ?1 AND period = ?2 ORDER BY rank",
                &[&category, &period],
                map_chart_row,
            )
            .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl ChartStore for SqliteChartRepository {
    async fn get(&self, category: &str, period: &str, rank: u32) -> DomainResult<Option<ChartEntry>> {
        let db = Arc::clone(&self.db);
        let category = category.to_string();
        let period = period.to_string();
        task::spawn_blocking(move || -> DomainResult<Option<ChartEntry>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT category, period, rank, name, artist, play_count
                 FROM listening_stats WHERE category = ?1 AND period = ?2 AND rank = ?3",
                params![category, period, rank],
                map_chart_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, entry: &ChartEntry) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let entry = entry.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.exec(
                "INSERT INTO listening_stats
                    (category, period, rank, name, artist, play_count, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (category, period, rank) DO UPDATE SET
                    name = excluded.name,
                    artist = excluded.artist,
                    play_count = excluded.play_count,
                    updated_at = excluded.updated_at",
                &[
                    &entry.category,
                    &entry.period,
                    &entry.rank,
                    &entry.name,
                    &entry.artist,
                    &u64_to_i64(entry.play_count),
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

fn map_chart_row(row: &Row<'_>) -> rusqlite::Result<ChartEntry> {
    Ok(ChartEntry {
        category: row.get(0)?,
        period: row.get(1)?,
        rank: column_u32(row.get(2)?, 2)?,
        name: row.get(3)?,
        artist: row.get(4)?,
        play_count: column_u64(row.get(5)?, 5)?,
    })
}
