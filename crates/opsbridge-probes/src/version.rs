//! Platform version probe — queries the BI platform's version endpoint and
//! reports the version string it advertises.

use std::time::Duration;

use async_trait::async_trait;
use opsbridge_core::error::SourceError;
use opsbridge_core::{Reading, Source};

/// GETs a JSON endpoint expected to answer `{"version": "..."}`.
pub struct PlatformVersionProbe {
    monitor_id: String,
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl PlatformVersionProbe {
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

/// Extract the version string from a response body.
fn parse_version(body: &serde_json::Value) -> Result<String, SourceError> {
    body["version"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| SourceError::Malformed("response has no 'version' string".into()))
}

#[async_trait]
impl Source for PlatformVersionProbe {
    fn id(&self) -> &str {
        "platform-version"
    }

    async fn produce(&self) -> Result<Reading, SourceError> {
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
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;
        let version = parse_version(&body)?;
        tracing::debug!(url = %self.url, %version, "platform version queried");

        Ok(Reading::new(&self.monitor_id).with_field("version", version))
    }
}
