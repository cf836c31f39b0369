//! Adapter contracts. A `Source` samples one concern into a `Reading`;
//! a `Sink` delivers one `Reading` to one destination. Both are object-safe
//! so monitors can hold heterogeneous sets behind `Arc<dyn _>`.

use async_trait::async_trait;

use crate::error::{SinkError, SourceError};
use crate::types::Reading;

/// Produces one reading per invocation. May perform network or OS calls;
/// a failure is never fatal to the process.
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable identifier, used in log lines.
    fn id(&self) -> &str;

    /// Sample the concern this source covers.
    async fn produce(&self) -> Result<Reading, SourceError>;
}

/// Delivers one reading to one destination. Must be safe to call once per
/// reading without additional coordination — delivery is at-most-once per
/// tick, there is no retry queue.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Stable identifier, used in `SinkResult` and log lines.
    fn id(&self) -> &str;

    /// Deliver the reading.
    async fn send(&self, reading: &Reading) -> Result<(), SinkError>;
}
