//! Process stats probe — daemon uptime and resident memory, sampled
//! in-process via `sysinfo`. No network involved.

use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use opsbridge_core::error::SourceError;
use opsbridge_core::{Reading, Source};
use sysinfo::{ProcessesToUpdate, System};

/// Samples uptime (since probe construction, i.e. daemon start) and the
/// current process's resident set size.
pub struct ProcessStatsProbe {
    monitor_id: String,
    started_at: Instant,
    host: String,
    system: Mutex<System>,
}

impl ProcessStatsProbe {
    pub fn new(monitor_id: &str) -> Self {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".into());
        Self {
            monitor_id: monitor_id.to_string(),
            started_at: Instant::now(),
            host,
            system: Mutex::new(System::new()),
        }
    }
}

#[async_trait]
impl Source for ProcessStatsProbe {
    fn id(&self) -> &str {
        "process-stats"
    }

    async fn produce(&self) -> Result<Reading, SourceError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|e| SourceError::Malformed(format!("cannot resolve own pid: {e}")))?;

        let rss_bytes = {
            let mut system = self
                .system
                .lock()
                .map_err(|_| SourceError::Malformed("stats sampler poisoned".into()))?;
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            system
                .process(pid)
                .map(|p| p.memory() as i64)
                .ok_or_else(|| SourceError::Malformed("own process not visible".into()))?
        };

        Ok(Reading::new(&self.monitor_id)
            .with_field("uptime_secs", self.started_at.elapsed().as_secs() as i64)
            .with_field("rss_bytes", rss_bytes)
            .with_field("host", self.host.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsbridge_core::FieldValue;

    #[tokio::test]
    async fn test_produces_uptime_and_memory() {
        let probe = ProcessStatsProbe::new("process");
        let reading = probe.produce().await.unwrap();

        assert_eq!(reading.monitor_id, "process");
        match reading.fields.get("rss_bytes") {
            Some(FieldValue::Integer(bytes)) => assert!(*bytes > 0, "a running process has RSS"),
            other => panic!("rss_bytes missing or wrong type: {other:?}"),
        }
        assert!(reading.fields.contains_key("uptime_secs"));
        assert!(reading.fields.contains_key("host"));
    }

    #[tokio::test]
    async fn test_uptime_advances() {
        let probe = ProcessStatsProbe::new("process");
        let first = probe.produce().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        let second = probe.produce().await.unwrap();

        let uptime = |r: &Reading| match r.fields["uptime_secs"] {
            FieldValue::Integer(v) => v,
            _ => panic!("uptime_secs must be an integer"),
        };
        assert!(uptime(&second) > uptime(&first));
    }
}
