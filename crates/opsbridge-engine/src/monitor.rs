//! Monitor — one schedule, one source, an ordered set of sinks.
//!
//! The tick state machine is Idle → Running → Idle. The `running` flag is
//! the non-overlap guard: the engine claims it before spawning a tick and
//! the tick releases it as soon as the source call settles, so slow sink
//! deliveries never hold the monitor in Running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opsbridge_core::types::SinkResult;
use opsbridge_core::{Sink, Source};

use crate::fanout;
use crate::schedule::Schedule;

/// One destination slot on a monitor. The enabled flag is re-read at every
/// tick, so a toggle takes effect on the next fan-out without rebuilding
/// the monitor.
pub struct SinkEntry {
    id: String,
    enabled: AtomicBool,
    sink: Arc<dyn Sink>,
}

impl SinkEntry {
    pub fn new(sink: Arc<dyn Sink>, enabled: bool) -> Self {
        Self {
            id: sink.id().to_string(),
            enabled: AtomicBool::new(enabled),
            sink,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }
}

/// Releases the Running claim on drop, unwind included.
struct IdleOnDrop<'a>(&'a AtomicBool);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A scheduled unit of monitoring.
pub struct Monitor {
    id: String,
    schedule: Schedule,
    /// Initial enable state; the engine owns the live flag after registration.
    enabled: bool,
    source: Arc<dyn Source>,
    sinks: Vec<Arc<SinkEntry>>,
    running: AtomicBool,
}

impl Monitor {
    pub fn new(id: &str, schedule: Schedule, source: Arc<dyn Source>) -> Self {
        Self {
            id: id.to_string(),
            schedule,
            enabled: true,
            source,
            sinks: Vec::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Append a sink to the fan-out set.
    pub fn with_sink(mut self, sink: Arc<dyn Sink>, enabled: bool) -> Self {
        self.sinks.push(Arc::new(SinkEntry::new(sink, enabled)));
        self
    }

    /// Set the initial enable state.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn sinks(&self) -> &[Arc<SinkEntry>] {
        &self.sinks
    }

    /// Claim the Running state. Returns false when a previous tick is still
    /// active, in which case the caller must skip this fire (never queue it).
    pub fn try_begin_tick(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Execute one tick: invoke the source, return to Idle, then fan the
    /// reading out to every enabled sink. Caller must hold the Running claim
    /// from `try_begin_tick`. Source failures are logged and contained here.
    pub async fn run_tick(&self, sink_timeout: Duration) -> Vec<SinkResult> {
        // Idle as soon as the source settles; sink deliveries must not
        // block the next fire. The guard also releases the claim when a
        // buggy source impl panics, so the monitor can never wedge in
        // Running.
        let outcome = {
            let _idle_on_drop = IdleOnDrop(&self.running);
            self.source.produce().await
        };

        match outcome {
            Ok(reading) => {
                tracing::debug!(
                    monitor = %self.id,
                    fields = reading.fields.len(),
                    "reading produced"
                );
                fanout::fan_out(Arc::new(reading), &self.sinks, sink_timeout).await
            }
            Err(e) => {
                tracing::error!(monitor = %self.id, source = %self.source.id(), "source failed: {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opsbridge_core::error::{SinkError, SourceError};
    use opsbridge_core::Reading;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct StubSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Source for StubSource {
        fn id(&self) -> &str {
            "stub-source"
        }
        async fn produce(&self) -> Result<Reading, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SourceError::Request("connection refused".into()))
            } else {
                Ok(Reading::new("m1").with_field("n", 1i64))
            }
        }
    }

    struct RecordingSink {
        name: String,
        seen: Mutex<Vec<Reading>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(name: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                seen: Mutex::new(Vec::new()),
                fail,
            })
        }
    }

    #[async_trait]
    impl Sink for RecordingSink {
        fn id(&self) -> &str {
            &self.name
        }
        async fn send(&self, reading: &Reading) -> Result<(), SinkError> {
            self.seen.lock().unwrap().push(reading.clone());
            if self.fail {
                Err(SinkError::Delivery("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    fn stub_monitor(fail: bool) -> (Monitor, Arc<RecordingSink>, Arc<RecordingSink>) {
        let good = RecordingSink::new("good", false);
        let bad = RecordingSink::new("bad", fail);
        let monitor = Monitor::new(
            "m1",
            Schedule::every(Duration::from_secs(60)),
            Arc::new(StubSource {
                calls: AtomicUsize::new(0),
                fail: false,
            }),
        )
        .with_sink(bad.clone(), true)
        .with_sink(good.clone(), true);
        (monitor, good, bad)
    }

    #[test]
    fn test_tick_claim_is_exclusive() {
        let (monitor, _, _) = stub_monitor(false);
        assert!(monitor.try_begin_tick());
        assert!(!monitor.try_begin_tick());
        assert!(monitor.is_running());
    }

    #[tokio::test]
    async fn test_run_tick_returns_to_idle() {
        let (monitor, good, _) = stub_monitor(false);
        assert!(monitor.try_begin_tick());
        let results = monitor.run_tick(Duration::from_secs(1)).await;
        assert!(!monitor.is_running());
        assert_eq!(results.len(), 2);
        assert_eq!(good.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_sink_does_not_block_sibling() {
        let (monitor, good, bad) = stub_monitor(true);
        assert!(monitor.try_begin_tick());
        let results = monitor.run_tick(Duration::from_secs(1)).await;

        // Both sinks were offered the identical reading.
        let good_seen = good.seen.lock().unwrap();
        let bad_seen = bad.seen.lock().unwrap();
        assert_eq!(good_seen.len(), 1);
        assert_eq!(bad_seen.len(), 1);
        assert_eq!(good_seen[0].fields, bad_seen[0].fields);
        assert_eq!(good_seen[0].timestamp, bad_seen[0].timestamp);

        let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].sink_id, "bad");
    }

    #[tokio::test]
    async fn test_source_failure_reaches_no_sink() {
        let good = RecordingSink::new("good", false);
        let monitor = Monitor::new(
            "m1",
            Schedule::every(Duration::from_secs(60)),
            Arc::new(StubSource {
                calls: AtomicUsize::new(0),
                fail: true,
            }),
        )
        .with_sink(good.clone(), true);

        assert!(monitor.try_begin_tick());
        let results = monitor.run_tick(Duration::from_secs(1)).await;
        assert!(results.is_empty());
        assert!(good.seen.lock().unwrap().is_empty());
        assert!(!monitor.is_running());
    }

    struct PanickingSource;

    #[async_trait]
    impl Source for PanickingSource {
        fn id(&self) -> &str {
            "panicking-source"
        }
        async fn produce(&self) -> Result<Reading, SourceError> {
            panic!("adapter bug");
        }
    }

    #[tokio::test]
    async fn test_panicking_source_releases_running_claim() {
        let monitor = Arc::new(Monitor::new(
            "m1",
            Schedule::every(Duration::from_secs(60)),
            Arc::new(PanickingSource),
        ));
        assert!(monitor.try_begin_tick());

        let ticking = monitor.clone();
        let joined = tokio::spawn(async move {
            ticking.run_tick(Duration::from_secs(1)).await;
        })
        .await;
        assert!(joined.is_err(), "the tick task itself unwinds");

        // The claim must not stay wedged: the monitor is Idle again and
        // the next fire can begin a fresh tick.
        assert!(!monitor.is_running());
        assert!(monitor.try_begin_tick());
    }

    #[tokio::test]
    async fn test_disabled_sink_entry_is_skipped() {
        let good = RecordingSink::new("good", false);
        let off = RecordingSink::new("off", false);
        let monitor = Monitor::new(
            "m1",
            Schedule::every(Duration::from_secs(60)),
            Arc::new(StubSource {
                calls: AtomicUsize::new(0),
                fail: false,
            }),
        )
        .with_sink(good.clone(), true)
        .with_sink(off.clone(), false);

        assert!(monitor.try_begin_tick());
        let results = monitor.run_tick(Duration::from_secs(1)).await;
        assert_eq!(results.len(), 1);
        assert_eq!(good.seen.lock().unwrap().len(), 1);
        assert!(off.seen.lock().unwrap().is_empty());
    }
}
