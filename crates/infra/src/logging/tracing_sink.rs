use almanac_core::LogSink;
use almanac_domain::{LogLevel, LogRecord, Result as DomainResult};
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// Emits each [`LogRecord`] as a `tracing` event.
///
/// `success` has no tracing counterpart and is emitted at info level with
/// `level = "success"` kept as a field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl TracingLogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LogSink for TracingLogSink {
    async fn append(&self, record: LogRecord) -> DomainResult<()> {
        let run_id = record.run_id().map(|id| id.to_string()).unwrap_or_default();
        let category = record.category.as_str();
        let message = record.message.as_str();

        match record.level {
            LogLevel::Debug => {
                debug!(target: "almanac::sync", %run_id, category, payload = %record.payload, "{message}");
            }
            LogLevel::Info | LogLevel::Success => {
                info!(target: "almanac::sync", %run_id, category, level = %record.level, "{message}");
            }
            LogLevel::Warning => {
                warn!(target: "almanac::sync", %run_id, category, payload = %record.payload, "{message}");
            }
            LogLevel::Error => {
                error!(target: "almanac::sync", %run_id, category, payload = %record.payload, "{message}");
            }
        }
        Ok(())
    }
}
