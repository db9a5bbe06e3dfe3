//! SQLite-backed implementation of the sync run store.
//!
//! Status changes are guarded in SQL so a run can only move forward through
//! `pending → running → completed | failed`, and outcome counters are
//! incremented together with `processed_items` in a single statement.

use std::sync::Arc;

use almanac_common::storage::PooledSqlite;
use almanac_core::{RunMetadata, SyncRunRepository};
use almanac_domain::{AlmanacError, ItemOutcome, Result as DomainResult, SyncRun, SyncStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, ToSql};
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use super::sql::{
    column_u64, conversion_error, from_millis, map_sql_error, map_storage_error, to_millis,
    u64_to_i64,
};
use crate::errors::map_join_error;

/// SQLite-backed sync run repository.
pub struct SqliteSyncRunRepository {
    db: Arc<DbManager>,
}

impl SqliteSyncRunRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn insert_run(conn: &PooledSqlite, run: &SyncRun) -> DomainResult<()> {
        let metadata = serde_json::to_string(&run.metadata)
            .map_err(|err| AlmanacError::Internal(format!("unserializable run metadata: {err}")))?;
        let total = run.total_items.map(u64_to_i64);
        let started_at = run.started_at.map(to_millis);
        let completed_at = run.completed_at.map(to_millis);
        let params: [&dyn ToSql; 16] = [
            &run.id.to_string(),
            &run.source_type,
            &run.status.to_string(),
            &total,
            &u64_to_i64(run.processed_items),
            &u64_to_i64(run.created_count),
            &u64_to_i64(run.updated_count),
            &u64_to_i64(run.failed_count),
            &u64_to_i64(run.skipped_count),
            &run.error_message,
            &metadata,
            &run.interactive,
            &started_at,
            &completed_at,
            &run.owner_id,
            &to_millis(run.created_at),
        ];

        conn.exec(INSERT_SQL, &params).map(|_| ()).map_err(map_storage_error)
    }

    fn find_run(conn: &PooledSqlite, id: Uuid) -> DomainResult<Option<SyncRun>> {
        conn.query_row(&format!("{SELECT_SQL} WHERE id = ?1"), params![id.to_string()], map_run_row)
            .optional()
            .map_err(map_sql_error)
    }

    /// Run an UPDATE that must touch the given run, explaining why it didn't.
    fn update_one(
        conn: &PooledSqlite,
        id: Uuid,
        sql: &str,
        params: &[&dyn ToSql],
        target: SyncStatus,
    ) -> DomainResult<()> {
        let changed = conn.exec(sql, params).map_err(map_storage_error)?;
        if changed == 1 {
            return Ok(());
        }

        match Self::find_run(conn, id)? {
            None => Err(AlmanacError::NotFound(format!("sync run {id}"))),
            Some(run) => Err(AlmanacError::InvalidState(format!(
                "sync run {id} cannot move from {} to {target}",
                run.status
            ))),
        }
    }

    fn spawn<T, F>(&self, f: F) -> task::JoinHandle<DomainResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&PooledSqlite) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            f(&conn)
        })
    }
}

#[async_trait]
impl SyncRunRepository for SqliteSyncRunRepository {
    async fn create(&self, run: &SyncRun) -> DomainResult<()> {
        let run = run.clone();
        self.spawn(move |conn| Self::insert_run(conn, &run)).await.map_err(map_join_error)?
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<SyncRun>> {
        self.spawn(move |conn| Self::find_run(conn, id)).await.map_err(map_join_error)?
    }

    async fn mark_running(&self, id: Uuid, started_at: DateTime<Utc>) -> DomainResult<()> {
        self.spawn(move |conn| {
            Self::update_one(
                conn,
                id,
                MARK_RUNNING_SQL,
                &[&id.to_string(), &to_millis(started_at)],
                SyncStatus::Running,
            )
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_total(&self, id: Uuid, total: u64) -> DomainResult<()> {
        self.spawn(move |conn| {
            let changed = conn
                .exec(SET_TOTAL_SQL, &[&id.to_string(), &u64_to_i64(total)])
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(AlmanacError::NotFound(format!("sync run {id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn record_outcome(&self, id: Uuid, outcome: ItemOutcome) -> DomainResult<()> {
        self.spawn(move |conn| {
            let changed =
                conn.exec(increment_sql(outcome), &[&id.to_string()]).map_err(map_storage_error)?;
            if changed == 0 {
                return Err(AlmanacError::NotFound(format!("running sync run {id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_metadata(&self, id: Uuid, metadata: &RunMetadata) -> DomainResult<()> {
        let metadata = serde_json::to_string(metadata)
            .map_err(|err| AlmanacError::Internal(format!("unserializable run metadata: {err}")))?;
        self.spawn(move |conn| {
            let changed = conn
                .exec(UPDATE_METADATA_SQL, &[&id.to_string(), &metadata])
                .map_err(map_storage_error)?;
            if changed == 0 {
                return Err(AlmanacError::NotFound(format!("sync run {id}")));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn mark_completed(&self, id: Uuid, completed_at: DateTime<Utc>) -> DomainResult<()> {
        self.spawn(move |conn| {
            Self::update_one(
                conn,
                id,
                MARK_COMPLETED_SQL,
                &[&id.to_string(), &to_millis(completed_at)],
                SyncStatus::Completed,
            )
        })
        .await
        .map_err(map_join_error)?
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        completed_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let error = error.to_string();
        self.spawn(move |conn| {
            Self::update_one(
                conn,
                id,
                MARK_FAILED_SQL,
                &[&id.to_string(), &error, &to_millis(completed_at)],
                SyncStatus::Failed,
            )
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_recent(
        &self,
        source_type: Option<&str>,
        limit: usize,
    ) -> DomainResult<Vec<SyncRun>> {
        let source_type = source_type.map(ToString::to_string);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.spawn(move |conn| {
            let sql = format!(
                "{SELECT_SQL} WHERE (?1 IS NULL OR source_type = ?1) \
                 ORDER BY created_at DESC, id DESC LIMIT ?2"
            );
            conn.query_all(&sql, &[&source_type, &limit], map_run_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn latest_completed(&self, source_type: &str) -> DomainResult<Option<SyncRun>> {
        let source_type = source_type.to_string();
        self.spawn(move |conn| {
            let sql = format!(
                "{SELECT_SQL} WHERE source_type = ?1 AND status = 'completed' \
                 ORDER BY completed_at DESC, id DESC LIMIT 1"
            );
            conn.query_row(&sql, params![source_type], map_run_row)
                .optional()
                .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn increment_sql(outcome: ItemOutcome) -> &'static str {
    match outcome {
        ItemOutcome::Created => INCREMENT_CREATED_SQL,
        ItemOutcome::Updated => INCREMENT_UPDATED_SQL,
        ItemOutcome::Skipped => INCREMENT_SKIPPED_SQL,
        ItemOutcome::Failed => INCREMENT_FAILED_SQL,
    }
}

const INSERT_SQL: &str = "INSERT INTO sync_runs (
        id, source_type, status, total_items, processed_items, created_count, updated_count,
        failed_count, skipped_count, error_message, metadata, interactive, started_at,
        completed_at, owner_id, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";

const SELECT_SQL: &str = "SELECT
        id, source_type, status, total_items, processed_items, created_count, updated_count,
        failed_count, skipped_count, error_message, metadata, interactive, started_at,
        completed_at, owner_id, created_at
    FROM sync_runs";

const MARK_RUNNING_SQL: &str =
    "UPDATE sync_runs SET status = 'running', started_at = ?2 WHERE id = ?1 AND status = 'pending'";

const MARK_COMPLETED_SQL: &str = "UPDATE sync_runs SET status = 'completed', completed_at = ?2
    WHERE id = ?1 AND status = 'running'";

const MARK_FAILED_SQL: &str =
    "UPDATE sync_runs SET status = 'failed', error_message = ?2, completed_at = ?3
    WHERE id = ?1 AND status IN ('pending', 'running')";

const SET_TOTAL_SQL: &str = "UPDATE sync_runs SET total_items = ?2 WHERE id = ?1";

const UPDATE_METADATA_SQL: &str = "UPDATE sync_runs SET metadata = ?2 WHERE id = ?1";

const INCREMENT_CREATED_SQL: &str = "UPDATE sync_runs
    SET created_count = created_count + 1, processed_items = processed_items + 1
    WHERE id = ?1 AND status = 'running'";

const INCREMENT_UPDATED_SQL: &str = "UPDATE sync_runs
    SET updated_count = updated_count + 1, processed_items = processed_items + 1
    WHERE id = ?1 AND status = 'running'";

const INCREMENT_SKIPPED_SQL: &str = "UPDATE sync_runs
    SET skipped_count = skipped_count + 1, processed_items = processed_items + 1
    WHERE id = ?1 AND status = 'running'";

const INCREMENT_FAILED_SQL: &str = "UPDATE sync_runs
    SET failed_count = failed_count + 1, processed_items = processed_items + 1
    WHERE id = ?1 AND status = 'running'";

fn map_run_row(row: &Row<'_>) -> rusqlite::Result<SyncRun> {
    let id_raw: String = row.get(0)?;
    let id = Uuid::parse_str(&id_raw).map_err(|err| conversion_error(0, Type::Text, err))?;
    let status_raw: String = row.get(2)?;
    let status = status_raw
        .parse::<SyncStatus>()
        .map_err(|err| conversion_error(2, Type::Text, err))?;
    let total_items = row.get::<_, Option<i64>>(3)?.map(|v| column_u64(v, 3)).transpose()?;
    let metadata_raw: String = row.get(10)?;
    let metadata = serde_json::from_str(&metadata_raw)
        .map_err(|err| conversion_error(10, Type::Text, err))?;
    let started_at = row.get::<_, Option<i64>>(12)?.map(|v| from_millis(v, 12)).transpose()?;
    let completed_at = row.get::<_, Option<i64>>(13)?.map(|v| from_millis(v, 13)).transpose()?;

    Ok(SyncRun {
        id,
        source_type: row.get(1)?,
        status,
        total_items,
        processed_items: column_u64(row.get(4)?, 4)?,
        created_count: column_u64(row.get(5)?, 5)?,
        updated_count: column_u64(row.get(6)?, 6)?,
        failed_count: column_u64(row.get(7)?, 7)?,
        skipped_count: column_u64(row.get(8)?, 8)?,
        error_message: row.get(9)?,
        metadata,
        interactive: row.get(11)?,
        started_at,
        completed_at,
        owner_id: row.get(14)?,
        created_at: from_millis(row.get(15)?, 15)?,
    })
}
