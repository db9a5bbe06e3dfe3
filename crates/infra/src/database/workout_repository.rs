//! Workouts keyed by upstream id.

use std::sync::Arc;

use almanac_core::sources::WorkoutStore;
use almanac_domain::{Result as DomainResult, Workout};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use tokio::task;

use super::manager::DbManager;
use super::sql::{
    column_u32, from_millis, map_sql_error, map_storage_error, now_millis, to_millis,
};
use crate::errors::map_join_error;

pub struct SqliteWorkoutRepository {
    db: Arc<DbManager>,
}

impl SqliteWorkoutRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WorkoutStore for SqliteWorkoutRepository {
    async fn get(&self, external_id: &str) -> DomainResult<Option<Workout>> {
        let db = Arc::clone(&self.db);
        let external_id = external_id.to_string();
        task::spawn_blocking(move || -> DomainResult<Option<Workout>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT external_id, activity_type, name, started_at, duration_seconds,
                        distance_meters, calories
                 FROM workouts WHERE external_id = ?1",
                params![external_id],
                map_workout_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, workout: &Workout) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let workout = workout.clone();
        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.exec(
                "INSERT INTO workouts
                    (external_id, activity_type, name, started_at, duration_seconds,
                     distance_meters, calories, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (external_id) DO UPDATE SET
                    activity_type = excluded.activity_type,
                    name = excluded.name,
                    started_at = excluded.started_at,
                    duration_seconds = excluded.duration_seconds,
                    distance_meters = excluded.distance_meters,
                    calories = excluded.calories,
                    updated_at = excluded.updated_at",
                &[
                    &workout.external_id,
                    &workout.activity_type,
                    &workout.name,
                    &to_millis(workout.started_at),
                    &workout.duration_seconds,
                    &workout.distance_meters,
                    &workout.calories,
                    &now_millis(),
                ],
            )
            .map(|_| ())
            .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn ids_started_since(&self, since: DateTime<Utc>) -> DomainResult<Vec<String>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || -> DomainResult<Vec<String>> {
            let conn = db.get_connection()?;
            conn.query_all(
                "SELECT external_id FROM workouts WHERE started_at >= ?1 ORDER BY started_at",
                &[&to_millis(since)],
                |row| row.get(0),
            )
            .map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, external_ids: &[String]) -> DomainResult<usize> {
        if external_ids.is_empty() {
            return Ok(0);
        }
        let db = Arc::clone(&self.db);
        let external_ids = external_ids.to_vec();
        task::spawn_blocking(move || -> DomainResult<usize> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let mut removed = 0;
            for chunk in external_ids.chunks(DELETE_CHUNK) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                let sql = format!("DELETE FROM workouts WHERE external_id IN ({placeholders})");
                removed += tx.execute(&sql, params_from_iter(chunk)).map_err(map_sql_error)?;
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(removed)
        })
        .await
        .map_err(map_join_error)?
    }
}

/// Stays well below SQLite's bound-parameter limit.
const DELETE_CHUNK: usize = 500;

fn map_workout_row(row: &Row<'_>) -> rusqlite::Result<Workout> {
    Ok(Workout {
        external_id: row.get(0)?,
        activity_type: row.get(1)?,
        name: row.get(2)?,
        started_at: from_millis(row.get(3)?, 3)?,
        duration_seconds: column_u32(row.get(4)?, 4)?,
        distance_meters: row.get(5)?,
        calories: row.get::<_, Option<i64>>(6)?.map(|v| column_u32(v, 6)).transpose()?,
    })
}
