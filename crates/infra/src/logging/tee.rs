use std::sync::Arc;

use almanac_core::LogSink;
use almanac_domain::{LogRecord, Result as DomainResult};
use async_trait::async_trait;
use tracing::debug;

/// Writes every record to all inner sinks.
///
/// A failing sink does not stop delivery to the others; the first error is
/// returned once every sink has been tried.
#[derive(Clone, Default)]
pub struct TeeLogSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl TeeLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl LogSink for TeeLogSink {
    async fn append(&self, record: LogRecord) -> DomainResult<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.append(record.clone()).await {
                debug!(error = %err, "log sink rejected record");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use almanac_domain::{AlmanacError, LogLevel};
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    #[async_trait]
    impl LogSink for Collect {
        async fn append(&self, record: LogRecord) -> DomainResult<()> {
            self.0.lock().push(record.message);
            Ok(())
        }
    }

    struct Reject;

    #[async_trait]
    impl LogSink for Reject {
        async fn append(&self, _record: LogRecord) -> DomainResult<()> {
            Err(AlmanacError::Database("readonly".into()))
        }
    }

    #[tokio::test]
    async fn delivers_past_a_failing_sink() {
        let collect = Arc::new(Collect::default());
        let tee = TeeLogSink::new().with_sink(Arc::new(Reject)).with_sink(collect.clone());

        let result = tee.append(LogRecord::new("sync", LogLevel::Info, "hello")).await;

        assert_eq!(result, Err(AlmanacError::Database("readonly".into())));
        assert_eq!(*collect.0.lock(), vec!["hello".to_string()]);
        assert_eq!(tee.len(), 2);
    }
}
