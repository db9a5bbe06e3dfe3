//! Append-only structured log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Severity of a structured log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

crate::impl_domain_status_conversions!(LogLevel {
    Debug => "debug",
    Info => "info",
    Success => "success",
    Warning => "warning",
    Error => "error",
});

/// Entity a log entry is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LogSubject {
    SyncRun(Uuid),
    Other { kind: String, id: String },
}

impl LogSubject {
    /// Stable kind string stored next to the subject id.
    pub fn kind(&self) -> &str {
        match self {
            Self::SyncRun(_) => "sync_run",
            Self::Other { kind, .. } => kind,
        }
    }

    /// Subject id rendered as text.
    pub fn id_string(&self) -> String {
        match self {
            Self::SyncRun(id) => id.to_string(),
            Self::Other { id, .. } => id.clone(),
        }
    }

    /// Rebuild a subject from its persisted `(kind, id)` pair.
    pub fn from_parts(kind: &str, id: &str) -> Self {
        if kind == "sync_run" {
            if let Ok(uuid) = Uuid::parse_str(id) {
                return Self::SyncRun(uuid);
            }
        }
        Self::Other { kind: kind.to_string(), id: id.to_string() }
    }
}

/// One immutable structured event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: Uuid,
    pub subject: Option<LogSubject>,
    pub category: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub payload: Value,
    pub actor: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LogRecord {
    /// Create an unattached entry stamped with the current time.
    pub fn new(category: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            subject: None,
            category: category.into(),
            level,
            message: message.into(),
            payload: Value::Null,
            actor: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the entry to a sync run.
    #[must_use]
    pub fn for_run(mut self, run_id: Uuid) -> Self {
        self.subject = Some(LogSubject::SyncRun(run_id));
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: LogSubject) -> Self {
        self.subject = Some(subject);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Id of the run this entry belongs to, if any.
    pub fn run_id(&self) -> Option<Uuid> {
        match self.subject {
            Some(LogSubject::SyncRun(id)) => Some(id),
            _ => None,
        }
    }
}
