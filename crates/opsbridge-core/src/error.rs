//! Error taxonomy. Each layer of the dispatch pipeline has its own error
//! type so failures can be contained at the smallest possible scope:
//! sink > source > monitor > engine. None of these ever crosses the
//! engine's dispatch boundary.

use std::time::Duration;

use thiserror::Error;

/// Configuration failures. Fatal to the affected monitor only — it is
/// omitted from the registry and the process continues.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(String),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("monitor '{monitor}' requires '{field}' but it is empty")]
    Missing {
        monitor: &'static str,
        field: &'static str,
    },
}

/// A probe failed to produce a reading. Transient: the tick produces no
/// reading and the monitor waits for its next scheduled fire.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("probe request failed: {0}")]
    Request(String),
    #[error("probe returned unexpected status {0}")]
    Status(u16),
    #[error("probe response malformed: {0}")]
    Malformed(String),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
}

/// A destination rejected or failed a delivery. Scoped to one sink for one
/// reading; carried in a `SinkResult`, never propagated to siblings.
#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("destination rejected delivery: status {0}")]
    Rejected(u16),
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}
