//! Log sink — writes each reading as a structured tracing event. Always
//! succeeds; this is the destination of last resort and the default.

use async_trait::async_trait;
use opsbridge_core::error::SinkError;
use opsbridge_core::{Reading, Sink};

#[derive(Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Sink for LogSink {
    fn id(&self) -> &str {
        "log"
    }

    async fn send(&self, reading: &Reading) -> Result<(), SinkError> {
        let fields = serde_json::to_string(&reading.fields).unwrap_or_else(|_| "{}".into());
        tracing::info!(
            monitor = %reading.monitor_id,
            timestamp = %reading.timestamp.to_rfc3339(),
            %fields,
            "reading"
        );
        Ok(())
    }
}
