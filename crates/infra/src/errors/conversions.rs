//! Conversions from external infrastructure errors into domain errors.

use almanac_common::storage::StorageError;
use almanac_domain::AlmanacError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AlmanacError);

impl From<InfraError> for AlmanacError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AlmanacError> for InfraError {
    fn from(value: AlmanacError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAlmanacError {
    fn into_almanac(self) -> AlmanacError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → AlmanacError */
/* -------------------------------------------------------------------------- */

impl IntoAlmanacError for SqlError {
    fn into_almanac(self) -> AlmanacError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        AlmanacError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        AlmanacError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        AlmanacError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        AlmanacError::Database("foreign key constraint violation".into())
                    }
                    _ => AlmanacError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => AlmanacError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                AlmanacError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                AlmanacError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => AlmanacError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                AlmanacError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => AlmanacError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => AlmanacError::Database("invalid SQL query".into()),
            other => AlmanacError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_almanac())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → AlmanacError */
/* -------------------------------------------------------------------------- */

impl IntoAlmanacError for StorageError {
    fn into_almanac(self) -> AlmanacError {
        match self {
            StorageError::Rusqlite(err) => err.into_almanac(),
            StorageError::InvalidConfig(message) => AlmanacError::Config(message),
            other => AlmanacError::Database(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_almanac())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AlmanacError */
/* -------------------------------------------------------------------------- */

impl IntoAlmanacError for HttpError {
    fn into_almanac(self) -> AlmanacError {
        if self.is_timeout() {
            return AlmanacError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AlmanacError::Network("HTTP connection failure".into());
        }

        if self.is_decode() {
            return AlmanacError::Source(format!("malformed response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => AlmanacError::Auth(message),
                404 => AlmanacError::NotFound(message),
                429 => AlmanacError::Network(message),
                400..=499 => AlmanacError::InvalidInput(message),
                _ => AlmanacError::Network(message),
            };
        }

        AlmanacError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_almanac())
    }
}

/* -------------------------------------------------------------------------- */
/* Payload decoding errors → AlmanacError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(AlmanacError::Source(format!("invalid JSON payload: {value}")))
    }
}

impl From<quick_xml::DeError> for InfraError {
    fn from(value: quick_xml::DeError) -> Self {
        InfraError(AlmanacError::Source(format!("invalid XML payload: {value}")))
    }
}

/// Map a failed `spawn_blocking` join into a domain error.
pub fn map_join_error(err: tokio::task::JoinError) -> AlmanacError {
    if err.is_cancelled() {
        AlmanacError::Internal("blocking database task was cancelled".into())
    } else {
        AlmanacError::Internal(format!("blocking database task panicked: {err}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
