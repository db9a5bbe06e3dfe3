//! Feed entries keyed by `(feed_url, guid)`.

use std::sync::Arc;

use almanac_core::sources::FeedEntryStore;
use almanac_domain::{FeedEntry, Result as DomainResult};
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::DbManager;
use super::sql::{from_millis, map_sql_error, map_storage_error, now_millis, to_millis};
use crate::errors::map_join_error;

pub struct SqliteFeedEntryRepository {
    db: Arc<DbManager>,
}

impl SqliteFeedEntryRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FeedEntryStore for SqliteFeedEntryRepository {
    async fn get(&self, feed_url: &str, guid: &str) -> DomainResult<Option<FeedEntry>> {
        let db = Arc::clone(&self.db);
        let (feed_url, guid) = (feed_url.to_string(), guid.to_string());
        task::spawn_blocking(move || -> DomainResult<Option<FeedEntry>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT feed_url, guid, title, link, published_at, summary
                 FROM feed_entries WHERE feed_url = ?1 AND guid = ?2",
                params![feed_url, guid],
                map_entry_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, entry: &FeedEntry) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let entry = entry.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.exec(
                "INSERT INTO feed_entries
                    (feed_url, guid, title, link, published_at, summary, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (feed_url, guid) DO UPDATE SET
                    title = excluded.title,
                    link = excluded.link,
                    published_at = excluded.published_at,
                    summary = excluded.summary,
                    updated_at = excluded.updated_at",
                &[
                    &entry.feed_url,
                    &entry.guid,
                    &entry.title,
                    &entry.link,
                    &entry.published_at.map(to_millis),
                    &entry.summary,
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

fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<FeedEntry> {
    Ok(FeedEntry {
        feed_url: row.get(0)?,
        guid: row.get(1)?,
        title: row.get(2)?,
        link: row.get(3)?,
        published_at: row.get::<_, Option<i64>>(4)?.map(|v| from_millis(v, 4)).transpose()?,
        summary: row.get(5)?,
    })
}
