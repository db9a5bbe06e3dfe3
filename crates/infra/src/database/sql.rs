//! Row and value helpers shared by the SQLite repositories

use almanac_common::storage::StorageError;
use almanac_domain::AlmanacError;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;

use crate::errors::InfraError;

pub(crate) fn map_storage_error(err: StorageError) -> AlmanacError {
    AlmanacError::from(InfraError::from(err))
}

pub(crate) fn map_sql_error(err: rusqlite::Error) -> AlmanacError {
    AlmanacError::from(InfraError::from(err))
}

/// Counters are unsigned in the domain and `INTEGER` in SQLite.
pub(crate) fn u64_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn column_u64(value: i64, column: usize) -> rusqlite::Result<u64> {
    u64::try_from(value).map_err(|err| conversion_error(column, Type::Integer, err))
}

pub(crate) fn column_u32(value: i64, column: usize) -> rusqlite::Result<u32> {
    u32::try_from(value).map_err(|err| conversion_error(column, Type::Integer, err))
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        conversion_error(column, Type::Integer, format!("timestamp {millis} out of range"))
    })
}

pub(crate) fn parse_date(raw: &str, column: usize) -> rusqlite::Result<NaiveDate> {
    raw.parse::<NaiveDate>().map_err(|err| conversion_error(column, Type::Text, err))
}

pub(crate) fn conversion_error(
    column: usize,
    ty: Type,
    cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, ty, cause.into())
}

pub(crate) fn now_millis() -> i64 {
    to_millis(Utc::now())
}
