//! # OpsBridge Sinks
//!
//! Sink adapters — each one delivers a `Reading` to a single destination:
//!
//! - `TimeseriesSink` — InfluxDB line-protocol write
//! - `ApmSink` — JSON event POST to an APM collector
//! - `ChatSink` — chat webhook (basic text, pre-formatted JSON, or blocks)
//! - `LogSink` — structured tracing event, the zero-dependency fallback
//!
//! Delivery is at-most-once per reading; failures surface as `SinkError`
//! and are isolated by the engine's fan-out.

pub mod apm;
pub mod chat;
pub mod log;
pub mod timeseries;

pub use apm::ApmSink;
pub use chat::{ChatSink, ChatStyle};
pub use log::LogSink;
pub use timeseries::TimeseriesSink;
