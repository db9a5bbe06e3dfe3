//! Daily activity totals, one row per calendar day.

use std::sync::Arc;

use almanac_core::sources::DailyActivityStore;
use almanac_domain::{DailyActivity, Result as DomainResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::DbManager;
use super::sql::{column_u32, map_sql_error, map_storage_error, now_millis, parse_date};
use crate::errors::map_join_error;

pub struct SqliteDailyActivityRepository {
    db: Arc<DbManager>,
}

impl SqliteDailyActivityRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DailyActivityStore for SqliteDailyActivityRepository {
    async fn latest_date(&self) -> DomainResult<Option<NaiveDate>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<Option<NaiveDate>> {
            let conn = db.get_connection()?;
            let latest: Option<String> = conn
                .query_row("SELECT MAX(date) FROM daily_activity", [], |row| row.get(0))
                .map_err(map_sql_error)?;
            latest.map(|raw| parse_date(&raw, 0).map_err(map_sql_error)).transpose()
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(&self, date: NaiveDate) -> DomainResult<Option<DailyActivity>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<Option<DailyActivity>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT date, steps, distance_meters, active_minutes, calories
                 FROM daily_activity WHERE date = ?1",
                params![date.to_string()],
                map_day_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, day: &DailyActivity) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let day = day.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.exec(
                "INSERT INTO daily_activity
                    (date, steps, distance_meters, active_minutes, calories, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (date) DO UPDATE SET
                    steps = excluded.steps,
                    distance_meters = excluded.distance_meters,
                    active_minutes = excluded.active_minutes,
                    calories = excluded.calories,
                    updated_at = excluded.updated_at",
                &[
                    &day.date.to_string(),
                    &day.steps,
                    &day.distance_meters,
                    &day.active_minutes,
                    &day.calories,
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

fn map_day_row(row: &Row<'_>) -> rusqlite::Result<DailyActivity> {
    let date: String = row.get(0)?;
    Ok(DailyActivity {
        date: parse_date(&date, 0)?,
        steps: column_u32(row.get(1)?, 1)?,
        distance_meters: row.get(2)?,
        active_minutes: column_u32(row.get(3)?, 3)?,
        calories: column_u32(row.get(4)?, 4)?,
    })
}
