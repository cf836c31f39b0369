//! Chat sink — posts readings to a chat webhook. The message shape is a
//! tagged `ChatMessage` variant chosen once at construction, not inferred
//! from string shape at send time.

use std::str::FromStr;

use async_trait::async_trait;
use opsbridge_core::error::SinkError;
use opsbridge_core::{ChatMessage, Reading, Sink};

/// Which `ChatMessage` variant this sink renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStyle {
    Basic,
    Formatted,
    Blocks,
}

impl FromStr for ChatStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(ChatStyle::Basic),
            "formatted" => Ok(ChatStyle::Formatted),
            "blocks" => Ok(ChatStyle::Blocks),
            other => Err(format!("unknown chat style '{other}'")),
        }
    }
}

pub struct ChatSink {
    webhook_url: String,
    style: ChatStyle,
    client: reqwest::Client,
}

impl ChatSink {
    pub fn new(webhook_url: &str, style: ChatStyle) -> Self {
        Self {
            webhook_url: webhook_url.to_string(),
            style,
            client: reqwest::Client::new(),
        }
    }
}

/// Render a reading into the configured message variant.
fn render(reading: &Reading, style: ChatStyle) -> ChatMessage {
    let summary = summary_line(reading);
    match style {
        ChatStyle::Basic => ChatMessage::Basic(summary),
        ChatStyle::Formatted => ChatMessage::Formatted(serde_json::json!({
            "text": summary,
            "monitor": reading.monitor_id.clone(),
            "timestamp": reading.timestamp.to_rfc3339(),
            "fields": reading.fields.clone(),
        })),
        ChatStyle::Blocks => {
            let field_lines: Vec<String> = reading
                .fields
                .iter()
                .map(|(name, value)| format!("*{name}*: {value}"))
                .collect();
            ChatMessage::Blocks(vec![
                serde_json::json!({
                    "type": "header",
                    "text": {"type": "plain_text", "text": reading.monitor_id.clone()}
                }),
                serde_json::json!({
                    "type": "section",
                    "text": {"type": "mrkdwn", "text": field_lines.join("\n")}
                }),
            ])
        }
    }
}

fn summary_line(reading: &Reading) -> String {
    let fields: Vec<String> = reading
        .fields
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    format!(
        "[{}] {} at {}",
        reading.monitor_id,
        fields.join(" "),
        reading.timestamp.format("%H:%M:%S UTC")
    )
}

/// Serialize a message variant into the webhook body. Dispatch happens
/// here, once, on the tag.
fn payload(message: &ChatMessage) -> serde_json::Value {
    match message {
        ChatMessage::Basic(text) => serde_json::json!({"text": text}),
        ChatMessage::Formatted(body) => body.clone(),
        ChatMessage::Blocks(blocks) => serde_json::json!({"blocks": blocks}),
    }
}

#[async_trait]
impl Sink for ChatSink {
    fn id(&self) -> &str {
        "chat"
    }

    async fn send(&self, reading: &Reading) -> Result<(), SinkError> {
        let message = render(reading, self.style);
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&payload(&message))
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
