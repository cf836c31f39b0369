//! Liveness probe — one HTTP GET against the platform's liveness endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use opsbridge_core::error::SourceError;
use opsbridge_core::{Reading, Source};

/// Pings a configured URL and reports reachability plus latency.
pub struct LivenessProbe {
    monitor_id: String,
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl LivenessProbe {
    pub fn new(monitor_id: &str, url: &str) -> Self {
        Self {
            monitor_id: monitor_id.to_string(),
            url: url.to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Source for LivenessProbe {
    fn id(&self) -> &str {
        "liveness"
    }

    async fn produce(&self) -> Result<Reading, SourceError> {
        let started = Instant::now();
        let resp = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout(self.timeout)
                } else {
                    SourceError::Request(e.to_string())
                }
            })?;

        let status = resp.status();
        let latency_ms = started.elapsed().as_millis() as i64;
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        tracing::debug!(url = %self.url, latency_ms, "platform alive");

        Ok(Reading::new(&self.monitor_id)
            .with_field("alive", true)
            .with_field("status", status.as_u16() as i64)
            .with_field("latency_ms", latency_ms))
    }
}
