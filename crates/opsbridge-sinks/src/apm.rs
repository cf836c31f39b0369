//! APM sink — posts each reading as a custom event to an APM collector
//! (New Relic-style event API: JSON body, API key header).

use async_trait::async_trait;
use opsbridge_core::error::SinkError;
use opsbridge_core::{Reading, Sink};

pub struct ApmSink {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ApmSink {
    pub fn new(url: &str, api_key: &str) -> Self {
        Self {
            url: url.to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

/// Build the event payload: the monitor id becomes the event type, the
/// reading fields are flattened in alongside the millisecond timestamp.
fn event_payload(reading: &Reading) -> serde_json::Value {
    let mut event = serde_json::Map::new();
    event.insert(
        "eventType".into(),
        serde_json::Value::String(reading.monitor_id.clone()),
    );
    event.insert(
        "timestamp".into(),
        serde_json::Value::from(reading.timestamp.timestamp_millis()),
    );
    for (name, value) in &reading.fields {
        event.insert(
            name.clone(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
    }
    serde_json::Value::Object(event)
}

#[async_trait]
impl Sink for ApmSink {
    fn id(&self) -> &str {
        "apm"
    }

    async fn send(&self, reading: &Reading) -> Result<(), SinkError> {
        let resp = self
            .client
            .post(&self.url)
            .header("Api-Key", &self.api_key)
            .json(&event_payload(reading))
            .send()
            .await
            .map_err(|e| SinkError::Delivery(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(SinkError::Rejected(resp.status().as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload_shape() {
        let reading = Reading::new("uptime")
            .with_field("uptime_secs", 3600i64)
            .with_field("rss_bytes", 1024i64);
        let payload = event_payload(&reading);

        assert_eq!(payload["eventType"], "uptime");
        assert_eq!(payload["uptime_secs"], 3600);
        assert_eq!(payload["rss_bytes"], 1024);
        assert_eq!(
            payload["timestamp"].as_i64().unwrap(),
            reading.timestamp.timestamp_millis()
        );
    }

    #[test]
    fn test_field_types_survive_serialization() {
        let reading = Reading::new("m")
            .with_field("alive", true)
            .with_field("latency", 1.25f64)
            .with_field("version", "9.1.2");
        let payload = event_payload(&reading);
        assert_eq!(payload["alive"], true);
        assert_eq!(payload["latency"], 1.25);
        assert_eq!(payload["version"], "9.1.2");
    }
}
