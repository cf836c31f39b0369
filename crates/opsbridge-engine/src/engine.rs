//! Timer Engine — owns the monitor registry and drives every tick.
//!
//! An explicit event loop owns a min-heap of (next fire instant, monitor)
//! entries. The loop pops the earliest-due entry, dispatches the tick as an
//! independent tokio task, recomputes the next fire instant from the
//! schedule, and reinserts — so one monitor's timing never depends on
//! another's. Registry operations arrive over a command channel and never
//! restart the loop.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::monitor::Monitor;

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Per-sink delivery timeout applied inside every fan-out.
    pub sink_timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sink_timeout: Duration::from_secs(10),
        }
    }
}

/// One armed fire instant. A monitor has exactly one live chain of entries;
/// `generation` invalidates superseded chains (e.g. after re-enable).
#[derive(Debug, Clone, PartialEq, Eq)]
struct FireEntry {
    at: DateTime<Utc>,
    generation: u64,
    monitor_id: String,
}

impl Ord for FireEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.at
            .cmp(&other.at)
            .then_with(|| self.monitor_id.cmp(&other.monitor_id))
            .then_with(|| self.generation.cmp(&other.generation))
    }
}

impl PartialOrd for FireEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

struct Slot {
    monitor: Arc<Monitor>,
    enabled: bool,
    generation: u64,
}

enum Command {
    Register(Monitor),
    SetEnabled { id: String, enabled: bool },
    Shutdown { grace: Duration, done: oneshot::Sender<()> },
}

/// Handle to a running engine. Cloneable; registry operations are async
/// messages to the loop task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Add a monitor to the registry. An immediate first tick fires, then
    /// the schedule takes over.
    pub async fn register(&self, monitor: Monitor) {
        let _ = self.tx.send(Command::Register(monitor)).await;
    }

    /// Enable or disable a monitor. Disabling prevents future ticks from
    /// starting but never aborts an in-flight tick; re-enabling fires
    /// immediately, mirroring registration.
    pub async fn set_enabled(&self, id: &str, enabled: bool) {
        let _ = self
            .tx
            .send(Command::SetEnabled {
                id: id.to_string(),
                enabled,
            })
            .await;
    }

    /// Stop scheduling, give in-flight ticks the grace period, abandon the
    /// rest. Resolves once the loop has exited.
    pub async fn shutdown(&self, grace: Duration) {
        let (done, ack) = oneshot::channel();
        if self
            .tx
            .send(Command::Shutdown { grace, done })
            .await
            .is_ok()
        {
            let _ = ack.await;
        }
    }
}

pub struct TimerEngine;

impl TimerEngine {
    /// Spawn the dispatch loop and return its handle.
    pub fn spawn(options: EngineOptions) -> EngineHandle {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run_loop(rx, options));
        EngineHandle { tx }
    }
}

async fn run_loop(mut rx: mpsc::Receiver<Command>, options: EngineOptions) {
    let mut heap: BinaryHeap<std::cmp::Reverse<FireEntry>> = BinaryHeap::new();
    let mut slots: HashMap<String, Slot> = HashMap::new();
    let mut ticks: JoinSet<()> = JoinSet::new();

    tracing::info!("timer engine started");

    loop {
        // Park until the earliest-due entry; with an empty heap only
        // commands can wake us.
        let sleep_for = heap
            .peek()
            .map(|std::cmp::Reverse(entry)| {
                (entry.at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
            })
            .unwrap_or(Duration::from_secs(3600));

        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Register(monitor)) => {
                    register(monitor, &mut heap, &mut slots);
                }
                Some(Command::SetEnabled { id, enabled }) => {
                    set_enabled(&id, enabled, &mut heap, &mut slots);
                }
                Some(Command::Shutdown { grace, done }) => {
                    drain(ticks, grace).await;
                    tracing::info!("timer engine stopped");
                    let _ = done.send(());
                    return;
                }
                None => {
                    // Every handle dropped; in-flight ticks are abandoned
                    // when the JoinSet drops.
                    tracing::debug!("all engine handles dropped, loop exiting");
                    return;
                }
            },
            _ = tokio::time::sleep(sleep_for) => {
                fire_due(&mut heap, &mut slots, &mut ticks, options.sink_timeout);
            }
            Some(result) = ticks.join_next(), if !ticks.is_empty() => {
                // Reap finished tick tasks; results were already logged
                // inside the tick itself. A panicking adapter is contained
                // here, at the dispatch boundary.
                if let Err(e) = result {
                    if e.is_panic() {
                        tracing::error!("tick task panicked: {e}");
                    }
                }
            }
        }
    }
}

fn register(
    monitor: Monitor,
    heap: &mut BinaryHeap<std::cmp::Reverse<FireEntry>>,
    slots: &mut HashMap<String, Slot>,
) {
    let id = monitor.id().to_string();
    let enabled = monitor.enabled();
    // Re-registering an id replaces the monitor; bumping past the old
    // slot's generation kills its fire chain.
    let generation = slots.get(&id).map(|s| s.generation + 1).unwrap_or(0);
    tracing::info!(
        monitor = %id,
        schedule = %monitor.schedule().text(),
        enabled,
        "monitor registered"
    );
    slots.insert(
        id.clone(),
        Slot {
            monitor: Arc::new(monitor),
            enabled,
            generation,
        },
    );
    // First fire is immediate; the schedule drives everything after.
    heap.push(std::cmp::Reverse(FireEntry {
        at: Utc::now(),
        generation,
        monitor_id: id,
    }));
}

fn set_enabled(
    id: &str,
    enabled: bool,
    heap: &mut BinaryHeap<std::cmp::Reverse<FireEntry>>,
    slots: &mut HashMap<String, Slot>,
) {
    let Some(slot) = slots.get_mut(id) else {
        tracing::warn!(monitor = %id, "set_enabled for unknown monitor");
        return;
    };
    if enabled && !slot.enabled {
        // Supersede the old chain and fire immediately, like registration.
        slot.generation += 1;
        heap.push(std::cmp::Reverse(FireEntry {
            at: Utc::now(),
            generation: slot.generation,
            monitor_id: id.to_string(),
        }));
    }
    slot.enabled = enabled;
    tracing::info!(monitor = %id, enabled, "monitor toggled");
}

fn fire_due(
    heap: &mut BinaryHeap<std::cmp::Reverse<FireEntry>>,
    slots: &mut HashMap<String, Slot>,
    ticks: &mut JoinSet<()>,
    sink_timeout: Duration,
) {
    let now = Utc::now();
    loop {
        let due = matches!(heap.peek(), Some(std::cmp::Reverse(entry)) if entry.at <= now);
        if !due {
            break;
        }
        let Some(std::cmp::Reverse(entry)) = heap.pop() else {
            break;
        };
        let Some(slot) = slots.get(&entry.monitor_id) else {
            continue;
        };
        if entry.generation != slot.generation {
            // Stale chain, superseded by a re-enable.
            continue;
        }

        if slot.enabled {
            if slot.monitor.try_begin_tick() {
                let monitor = slot.monitor.clone();
                tracing::debug!(monitor = %entry.monitor_id, "tick fired");
                ticks.spawn(async move {
                    monitor.run_tick(sink_timeout).await;
                });
            } else {
                tracing::warn!(
                    monitor = %entry.monitor_id,
                    "tick skipped — previous run still active"
                );
            }
        }
        // Disabled monitors skip silently but stay armed so a re-enable
        // has a chain to supersede.

        let next = slot.monitor.schedule().next_fire_after(now);
        heap.push(std::cmp::Reverse(FireEntry {
            at: next,
            generation: slot.generation,
            monitor_id: entry.monitor_id,
        }));
    }
}

async fn drain(mut ticks: JoinSet<()>, grace: Duration) {
    if ticks.is_empty() {
        return;
    }
    tracing::info!(in_flight = ticks.len(), "waiting up to {grace:?} for in-flight ticks");
    let finished = tokio::time::timeout(grace, async {
        while let Some(result) = ticks.join_next().await {
            if let Err(e) = result {
                if e.is_panic() {
                    tracing::error!("tick task panicked: {e}");
                }
            }
        }
    })
    .await;
    if finished.is_err() {
        tracing::warn!(abandoned = ticks.len(), "grace period elapsed, abandoning ticks");
        ticks.abort_all();
    }
}
