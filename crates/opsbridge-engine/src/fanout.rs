//! Sink fan-out — deliver one reading to every enabled sink, concurrently
//! and in isolation. A failed or slow sink affects nothing but its own
//! `SinkResult`; the reading instance itself is shared, never copied or
//! mutated.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use opsbridge_core::error::SinkError;
use opsbridge_core::types::SinkResult;
use opsbridge_core::Reading;

use crate::monitor::SinkEntry;

/// Deliver `reading` to every enabled entry. Each delivery is bounded by
/// `per_sink_timeout`; a timeout is recorded as `SinkError::Timeout`. Every
/// result is logged individually, success and failure alike.
pub async fn fan_out(
    reading: Arc<Reading>,
    sinks: &[Arc<SinkEntry>],
    per_sink_timeout: Duration,
) -> Vec<SinkResult> {
    let deliveries = sinks
        .iter()
        .filter(|entry| entry.is_enabled())
        .map(|entry| deliver(reading.clone(), entry.clone(), per_sink_timeout));

    let results = join_all(deliveries).await;
    for result in &results {
        if result.success {
            tracing::debug!(
                monitor = %result.monitor_id,
                sink = %result.sink_id,
                "delivered"
            );
        } else if let Some(error) = &result.error {
            tracing::warn!(
                monitor = %result.monitor_id,
                sink = %result.sink_id,
                "delivery failed: {error}"
            );
        }
    }
    results
}

async fn deliver(
    reading: Arc<Reading>,
    entry: Arc<SinkEntry>,
    per_sink_timeout: Duration,
) -> SinkResult {
    let outcome = match tokio::time::timeout(per_sink_timeout, entry.sink().send(&reading)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SinkError::Timeout(per_sink_timeout)),
    };

    SinkResult {
        monitor_id: reading.monitor_id.clone(),
        sink_id: entry.id().to_string(),
        reading_timestamp: reading.timestamp,
        success: outcome.is_ok(),
        error: outcome.err(),
    }
}
