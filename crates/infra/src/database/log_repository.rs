//! SQLite-backed structured log store.

use std::sync::Arc;

use almanac_common::storage::PooledSqlite;
use almanac_core::LogSink;
use almanac_domain::{AlmanacError, LogLevel, LogRecord, LogSubject, Result as DomainResult};
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{Row, ToSql};
use tokio::task;
use uuid::Uuid;

use super::manager::DbManager;
use super::sql::{conversion_error, from_millis, map_storage_error, to_millis};
use crate::errors::map_join_error;

/// Persists [`LogRecord`]s and reads them back per subject.
pub struct SqliteLogRepository {
    db: Arc<DbManager>,
}

impl SqliteLogRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    fn insert_record(conn: &PooledSqlite, record: &LogRecord) -> DomainResult<()> {
        let payload = serde_json::to_string(&record.payload)
            .map_err(|err| AlmanacError::Internal(format!("unserializable log payload: {err}")))?;
        let subject_kind = record.subject.as_ref().map(|subject| subject.kind().to_string());
        let subject_id = record.subject.as_ref().map(LogSubject::id_string);
        let params: [&dyn ToSql; 9] = [
            &record.id.to_string(),
            &subject_kind,
            &subject_id,
            &record.category,
            &record.level.to_string(),
            &record.message,
            &payload,
            &record.actor,
            &to_millis(record.created_at),
        ];

        conn.exec(INSERT_SQL, &params).map(|_| ()).map_err(map_storage_error)
    }

    /// Every record attached to a sync run, oldest first.
    pub async fn list_for_run(&self, run_id: Uuid) -> DomainResult<Vec<LogRecord>> {
        let subject = LogSubject::SyncRun(run_id);
        self.list_for_subject(&subject).await
    }

    /// Every record attached to `subject`, oldest first.
    pub async fn list_for_subject(&self, subject: &LogSubject) -> DomainResult<Vec<LogRecord>> {
        let db = Arc::clone(&self.db);
        let kind = subject.kind().to_string();
        let id = subject.id_string();

        task::spawn_blocking(move || -> DomainResult<Vec<LogRecord>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "{SELECT_SQL} WHERE subject_kind = ?1 AND subject_id = ?2 ORDER BY created_at, id"
            );
            conn.query_all(&sql, &[&kind, &id], map_log_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    /// Newest records across all subjects at or above `min_level`.
    pub async fn list_recent(
        &self,
        min_level: LogLevel,
        limit: usize,
    ) -> DomainResult<Vec<LogRecord>> {
        let db = Arc::clone(&self.db);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let levels = [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Success,
            LogLevel::Warning,
            LogLevel::Error,
        ]
        .into_iter()
        .filter(|level| *level >= min_level)
        .map(|level| format!("'{level}'"))
        .collect::<Vec<_>>()
        .join(", ");

        task::spawn_blocking(move || -> DomainResult<Vec<LogRecord>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "{SELECT_SQL} WHERE level IN ({levels}) ORDER BY created_at DESC, id DESC LIMIT ?1"
            );
            conn.query_all(&sql, &[&limit], map_log_row).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl LogSink for SqliteLogRepository {
    async fn append(&self, record: LogRecord) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            Self::insert_record(&conn, &record)
        })
        .await
        .map_err(map_join_error)?
    }
}

const INSERT_SQL: &str = "INSERT INTO log_records (
        id, subject_kind, subject_id, category, level, message, payload, actor, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const SELECT_SQL: &str = "SELECT
        id, subject_kind, subject_id, category, level, message, payload, actor, created_at
    FROM log_records";

fn map_log_row(row: &Row<'_>) -> rusqlite::Result<LogRecord> {
    let id_raw: String = row.get(0)?;
    let id = Uuid::parse_str(&id_raw).map_err(|err| conversion_error(0, Type::Text, err))?;
    let subject = match (row.get::<_, Option<String>>(1)?, row.get::<_, Option<String>>(2)?) {
        (Some(kind), Some(subject_id)) => Some(LogSubject::from_parts(&kind, &subject_id)),
        _ => None,
    };
    let level_raw: String = row.get(4)?;
    let level =
        level_raw.parse::<LogLevel>().map_err(|err| conversion_error(4, Type::Text, err))?;
    let payload_raw: String = row.get(6)?;
    let payload =
        serde_json::from_str(&payload_raw).map_err(|err| conversion_error(6, Type::Text, err))?;

    Ok(LogRecord {
        id,
        subject,
        category: row.get(3)?,
        level,
        message: row.get(5)?,
        payload,
        actor: row.get(7)?,
        created_at: from_millis(row.get(8)?, 8)?,
    })
}
