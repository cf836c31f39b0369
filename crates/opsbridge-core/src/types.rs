//! Data model for sampled readings and their delivery results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SinkError;

/// One sampled value inside a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

/// An immutable snapshot produced by one source invocation. The same
/// instance is offered unmodified to every sink (shared via `Arc`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Which monitor produced this reading.
    pub monitor_id: String,
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// Sampled fields, name → value. BTreeMap keeps field order stable
    /// across deliveries and log lines.
    pub fields: BTreeMap<String, FieldValue>,
}

impl Reading {
    /// Start a reading for the given monitor, stamped now.
    pub fn new(monitor_id: &str) -> Self {
        Self {
            monitor_id: monitor_id.to_string(),
            timestamp: Utc::now(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}

/// Outcome of offering one reading to one sink. Used for logging and tests,
/// never persisted.
#[derive(Debug)]
pub struct SinkResult {
    pub monitor_id: String,
    pub sink_id: String,
    pub reading_timestamp: DateTime<Utc>,
    pub success: bool,
    pub error: Option<SinkError>,
}

/// Chat payload shape, tagged at construction rather than inferred from
/// string shape at send time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatMessage {
    /// Plain text, wrapped as `{"text": ...}` by the chat sink.
    Basic(String),
    /// Pre-formatted JSON payload, posted as-is.
    Formatted(serde_json::Value),
    /// Block-structured message, wrapped as `{"blocks": [...]}`.
    Blocks(Vec<serde_json::Value>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_builder() {
        let reading = Reading::new("heartbeat")
            .with_field("alive", true)
            .with_field("latency_ms", 42i64);
        assert_eq!(reading.monitor_id, "heartbeat");
        assert_eq!(reading.fields.len(), 2);
        assert_eq!(reading.fields["alive"], FieldValue::Bool(true));
        assert_eq!(reading.fields["latency_ms"], FieldValue::Integer(42));
    }

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Integer(7).to_string(), "7");
        assert_eq!(FieldValue::Float(1.5).to_string(), "1.5");
        assert_eq!(FieldValue::Text("9.1.2".into()).to_string(), "9.1.2");
        assert_eq!(FieldValue::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_field_order_is_stable() {
        let reading = Reading::new("m")
            .with_field("zeta", 1i64)
            .with_field("alpha", 2i64);
        let names: Vec<_> = reading.fields.keys().cloned().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
