//! OpsBridge daemon — bridges a BI server platform with external metrics
//! and notification destinations.
//!
//! Bootstrap order: CLI args → config → tracing → build sinks and monitors
//! from config → spawn the timer engine → register monitors → wait for
//! ctrl-c → graceful shutdown. A monitor with broken config is omitted (or
//! registered disabled, for a bad schedule); the process only refuses to
//! start when nothing at all can be monitored.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use opsbridge_core::config::{MonitorConfig, SinksConfig};
use opsbridge_core::{OpsBridgeConfig, Sink, Source};
use opsbridge_engine::{EngineOptions, Monitor, Schedule, TimerEngine};
use opsbridge_probes::{LivenessProbe, PlatformVersionProbe, ProcessStatsProbe};
use opsbridge_sinks::{ApmSink, ChatSink, ChatStyle, LogSink, TimeseriesSink};

#[derive(Parser)]
#[command(name = "opsbridge", version, about = "BI platform operations daemon")]
struct Args {
    /// Path to the config file (default: ~/.opsbridge/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log filter when RUST_LOG is unset, e.g. "info" or "opsbridge=debug"
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = match &args.config {
        Some(path) => OpsBridgeConfig::load_from(path)?,
        None => OpsBridgeConfig::load()?,
    };

    let sinks = build_sinks(&config.sinks);
    let monitors = build_monitors(&config, &sinks);
    anyhow::ensure!(
        !monitors.is_empty(),
        "no monitors could be constructed, nothing to run"
    );

    let handle = TimerEngine::spawn(EngineOptions {
        sink_timeout: Duration::from_secs(config.daemon.sink_timeout_secs),
    });
    for monitor in monitors {
        handle.register(monitor).await;
    }

    tracing::info!("opsbridge running, ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    handle
        .shutdown(Duration::from_secs(config.daemon.shutdown_grace_secs))
        .await;
    Ok(())
}

/// Construct every destination that has enough configuration to exist.
/// The bool is the initial per-sink enable flag, re-checked at every tick.
fn build_sinks(config: &SinksConfig) -> Vec<(Arc<dyn Sink>, bool)> {
    let mut sinks: Vec<(Arc<dyn Sink>, bool)> = Vec::new();

    if !config.timeseries.url.is_empty() {
        sinks.push((
            Arc::new(TimeseriesSink::new(
                &config.timeseries.url,
                &config.timeseries.database,
            )),
            config.timeseries.enabled,
        ));
    } else if config.timeseries.enabled {
        tracing::warn!("timeseries sink enabled but sinks.timeseries.url is empty, skipping");
    }

    if !config.apm.url.is_empty() {
        sinks.push((
            Arc::new(ApmSink::new(&config.apm.url, &config.apm.api_key)),
            config.apm.enabled,
        ));
    } else if config.apm.enabled {
        tracing::warn!("apm sink enabled but sinks.apm.url is empty, skipping");
    }

    if !config.chat.webhook_url.is_empty() {
        let style = config.chat.style.parse::<ChatStyle>().unwrap_or_else(|e| {
            tracing::warn!("{e}, falling back to basic");
            ChatStyle::Basic
        });
        sinks.push((
            Arc::new(ChatSink::new(&config.chat.webhook_url, style)),
            config.chat.enabled,
        ));
    } else if config.chat.enabled {
        tracing::warn!("chat sink enabled but sinks.chat.webhook_url is empty, skipping");
    }

    sinks.push((Arc::new(LogSink::new()), config.log.enabled));
    sinks
}

/// Build the three platform monitors. Broken schedule text disables the
/// monitor; missing source config omits it.
fn build_monitors(
    config: &OpsBridgeConfig,
    sinks: &[(Arc<dyn Sink>, bool)],
) -> Vec<Monitor> {
    let mut monitors = Vec::new();

    let heartbeat_source = config
        .platform
        .liveness_url()
        .map(|url| Arc::new(LivenessProbe::new("heartbeat", &url)) as Arc<dyn Source>);
    if let Some(monitor) = assemble("heartbeat", &config.monitors.heartbeat, heartbeat_source, sinks)
    {
        monitors.push(monitor);
    }

    let process_source: Arc<dyn Source> = Arc::new(ProcessStatsProbe::new("process"));
    if let Some(monitor) = assemble("process", &config.monitors.process, Ok(process_source), sinks)
    {
        monitors.push(monitor);
    }

    let version_source = config
        .platform
        .version_url()
        .map(|url| Arc::new(PlatformVersionProbe::new("version", &url)) as Arc<dyn Source>);
    if let Some(monitor) = assemble("version", &config.monitors.version, version_source, sinks) {
        monitors.push(monitor);
    }

    monitors
}

fn assemble(
    id: &str,
    monitor_config: &MonitorConfig,
    source: Result<Arc<dyn Source>, opsbridge_core::ConfigError>,
    sinks: &[(Arc<dyn Sink>, bool)],
) -> Option<Monitor> {
    let source = match source {
        Ok(source) => source,
        Err(e) => {
            tracing::error!(monitor = %id, "omitted from registry: {e}");
            return None;
        }
    };

    let (schedule, enabled) = match Schedule::parse(&monitor_config.schedule) {
        Ok(schedule) => (schedule, monitor_config.enabled),
        Err(e) => {
            tracing::error!(
                monitor = %id,
                schedule = %monitor_config.schedule,
                "invalid schedule, monitor disabled: {e}"
            );
            (Schedule::every(Duration::from_secs(3600)), false)
        }
    };

    let mut monitor = Monitor::new(id, schedule, source).with_enabled(enabled);
    for (sink, sink_enabled) in sinks {
        monitor = monitor.with_sink(sink.clone(), *sink_enabled);
    }
    Some(monitor)
}
