//! # OpsBridge Probes
//!
//! Source adapters — each one samples a single platform/process concern
//! into a `Reading`:
//!
//! - `LivenessProbe` — HTTP GET against the platform liveness endpoint
//! - `ProcessStatsProbe` — daemon uptime and resident memory
//! - `PlatformVersionProbe` — the platform's reported version string
//!
//! Probes perform their own network/OS calls; a failure is returned as a
//! `SourceError` and costs exactly one reading.

pub mod liveness;
pub mod process;
pub mod version;

pub use liveness::LivenessProbe;
pub use process::ProcessStatsProbe;
pub use version::PlatformVersionProbe;
