//! # OpsBridge Engine
//!
//! The scheduled-monitor and multi-sink dispatch engine. Each monitor binds
//! one schedule, one source, and an ordered set of sinks; the timer engine
//! drives every monitor off a single fire-time min-heap and runs each fired
//! tick as an independent tokio task.
//!
//! ## Architecture
//! ```text
//! TimerEngine (min-heap of fire instants + command channel)
//!   ├── Monitor "heartbeat"  — every 1 minute
//!   ├── Monitor "process"    — every 1 minute
//!   └── Monitor "version"    — every 1 hour
//!        on fire → tick task: Source.produce()
//!                    └── Reading → fan_out → N × Sink.send()  (concurrent,
//!                                            per-sink timeout, isolated)
//! ```
//!
//! ## Containment guarantees
//! - One in-flight tick per monitor; a fire that lands while the previous
//!   tick is still running is skipped with a warning, never queued.
//! - A source failure costs one reading and nothing else.
//! - A sink failure never touches sibling sinks or the monitor's own state.
//! - Nothing raised inside a tick escapes the engine's dispatch boundary.

pub mod engine;
pub mod fanout;
pub mod monitor;
pub mod schedule;

pub use engine::{EngineHandle, EngineOptions, TimerEngine};
pub use fanout::fan_out;
pub use monitor::{Monitor, SinkEntry};
pub use schedule::{Schedule, ScheduleParseError};
