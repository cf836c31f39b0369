//! Time-series sink — writes readings to an InfluxDB-compatible store
//! using the line protocol: `measurement field=value,... timestamp_ns`.

use async_trait::async_trait;
use opsbridge_core::error::SinkError;
use opsbridge_core::{FieldValue, Reading, Sink};

pub struct TimeseriesSink {
    base_url: String,
    database: String,
    client: reqwest::Client,
}

impl TimeseriesSink {
    pub fn new(base_url: &str, database: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            database: database.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

/// Encode one reading as a line-protocol record. The monitor id is the
/// measurement name.
fn encode_line(reading: &Reading) -> String {
    let fields: Vec<String> = reading
        .fields
        .iter()
        .map(|(name, value)| format!("{}={}", escape_key(name), encode_value(value)))
        .collect();
    format!(
        "{} {} {}",
        escape_key(&reading.monitor_id),
        fields.join(","),
        reading.timestamp.timestamp_nanos_opt().unwrap_or_default()
    )
}

fn encode_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Integer(v) => format!("{v}i"),
        FieldValue::Float(v) => format!("{v}"),
        FieldValue::Bool(v) => format!("{v}"),
        FieldValue::Text(v) => format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}

fn escape_key(key: &str) -> String {
    key.replace(' ', "\\ ").replace(',', "\\,").replace('=', "\\=")
}

#[async_trait]
impl Sink for TimeseriesSink {
    fn id(&self) -> &str {
        "timeseries"
    }

    async fn send(&self, reading: &Reading) -> Result<(), SinkError> {
        if reading.fields.is_empty() {
            // Line protocol rejects field-less points; nothing to write.
            return Ok(());
        }
        let url = format!("{}/write", self.base_url);
        let resp = self
            .client
            .post(&url)
            .query(&[("db", self.database.as_str()), ("precision", "ns")])
            .body(encode_line(reading))
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
