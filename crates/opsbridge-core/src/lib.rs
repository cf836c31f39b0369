//! # OpsBridge Core
//!
//! Shared foundation for the OpsBridge daemon: configuration, the error
//! taxonomy, the `Reading`/`SinkResult` data model, and the `Source`/`Sink`
//! adapter contracts every probe and destination implements.
//!
//! Nothing in this crate performs I/O beyond reading the config file — the
//! actual probes and destinations live in `opsbridge-probes` and
//! `opsbridge-sinks`, driven by `opsbridge-engine`.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::OpsBridgeConfig;
pub use error::{ConfigError, SinkError, SourceError};
pub use traits::{Sink, Source};
pub use types::{ChatMessage, FieldValue, Reading, SinkResult};
