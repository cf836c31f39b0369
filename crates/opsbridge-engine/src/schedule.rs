//! Human-readable recurrence expressions.
//! Supports: "every N seconds|minutes|hours" (unit may be singular or
//! abbreviated) and "every day at HH:MM" (24h, UTC).
//! Example: "every 30 seconds", "every day at 08:00".

use std::time::Duration;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use thiserror::Error;

/// Why an expression failed to parse. Fatal to the owning monitor only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleParseError {
    #[error("empty schedule expression")]
    Empty,
    #[error("unrecognized schedule expression: '{0}'")]
    Unrecognized(String),
    #[error("'{0}' is not a valid interval count")]
    BadCount(String),
    #[error("interval must be greater than zero")]
    ZeroInterval,
    #[error("'{0}' is not a valid HH:MM time of day")]
    BadTimeOfDay(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Recurrence {
    /// Fixed interval between fires.
    Every(Duration),
    /// Once a day at a fixed UTC wall time.
    DailyAt { hour: u32, minute: u32 },
}

/// A parsed recurrence expression. Immutable; `next_fire_after` is pure and
/// deterministic, and non-decreasing for non-decreasing inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    text: String,
    recurrence: Recurrence,
}

impl Schedule {
    /// Parse a recurrence expression.
    pub fn parse(text: &str) -> Result<Self, ScheduleParseError> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ScheduleParseError::Empty);
        }
        let parts: Vec<&str> = normalized.split_whitespace().collect();

        let recurrence = match parts.as_slice() {
            // "every day at HH:MM"
            ["every", "day", "at", time] => {
                let (hour, minute) = parse_time_of_day(time)?;
                Recurrence::DailyAt { hour, minute }
            }
            // "every second" / "every minute" / "every hour"
            ["every", unit] => {
                let secs = unit_seconds(unit)
                    .ok_or_else(|| ScheduleParseError::Unrecognized(normalized.clone()))?;
                Recurrence::Every(Duration::from_secs(secs))
            }
            // "every N <unit>"
            ["every", count, unit] => {
                let n: u64 = count
                    .parse()
                    .map_err(|_| ScheduleParseError::BadCount(count.to_string()))?;
                if n == 0 {
                    return Err(ScheduleParseError::ZeroInterval);
                }
                let secs = unit_seconds(unit)
                    .ok_or_else(|| ScheduleParseError::Unrecognized(normalized.clone()))?;
                Recurrence::Every(Duration::from_secs(n * secs))
            }
            _ => return Err(ScheduleParseError::Unrecognized(normalized)),
        };

        Ok(Self {
            text: text.trim().to_string(),
            recurrence,
        })
    }

    /// Fixed-interval schedule, bypassing the text grammar. Used by tests
    /// and programmatic registration.
    pub fn every(interval: Duration) -> Self {
        Self {
            text: format!("every {interval:?}"),
            recurrence: Recurrence::Every(interval),
        }
    }

    /// The original expression text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The first fire instant strictly after `now`.
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match &self.recurrence {
            Recurrence::Every(interval) => {
                let step = chrono::Duration::from_std(*interval)
                    .unwrap_or_else(|_| chrono::Duration::seconds(1));
                now + step
            }
            Recurrence::DailyAt { hour, minute } => {
                let today = Utc
                    .with_ymd_and_hms(now.year(), now.month(), now.day(), *hour, *minute, 0)
                    .single()
                    .unwrap_or(now);
                if today > now {
                    today
                } else {
                    today + chrono::Duration::days(1)
                }
            }
        }
    }
}

fn unit_seconds(unit: &str) -> Option<u64> {
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60),
        "h" | "hour" | "hours" => Some(3600),
        _ => None,
    }
}

fn parse_time_of_day(time: &str) -> Result<(u32, u32), ScheduleParseError> {
    let bad = || ScheduleParseError::BadTimeOfDay(time.to_string());
    let (h, m) = time.split_once(':').ok_or_else(bad)?;
    let hour: u32 = h.parse().map_err(|_| bad())?;
    let minute: u32 = m.parse().map_err(|_| bad())?;
    if hour > 23 || minute > 59 {
        return Err(bad());
    }
    Ok((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_every_n_seconds() {
        let schedule = Schedule::parse("every 30 seconds").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 22, 10, 0, 0).unwrap();
        let next = schedule.next_fire_after(now);
        assert_eq!((next - now).num_seconds(), 30);
    }

    #[test]
    fn test_singular_and_abbreviated_units() {
        for expr in ["every 1 second", "every 1 sec", "every 1 s", "every second"] {
            let schedule = Schedule::parse(expr).unwrap();
            let now = Utc::now();
            assert_eq!((schedule.next_fire_after(now) - now).num_seconds(), 1);
        }
        let schedule = Schedule::parse("every 5 minutes").unwrap();
        let now = Utc::now();
        assert_eq!((schedule.next_fire_after(now) - now).num_seconds(), 300);
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(Schedule::parse("  Every 1 Minute ").is_ok());
    }

    #[test]
    fn test_daily_at() {
        let schedule = Schedule::parse("every day at 08:00").unwrap();
        let before = Utc.with_ymd_and_hms(2026, 2, 22, 7, 30, 0).unwrap();
        let next = schedule.next_fire_after(before);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 22, 8, 0, 0).unwrap());

        // Already past today's slot: rolls to tomorrow.
        let after = Utc.with_ymd_and_hms(2026, 2, 22, 8, 0, 0).unwrap();
        let next = schedule.next_fire_after(after);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 23, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Schedule::parse(""), Err(ScheduleParseError::Empty));
        assert_eq!(
            Schedule::parse("every 0 seconds"),
            Err(ScheduleParseError::ZeroInterval)
        );
        assert!(matches!(
            Schedule::parse("every 5 fortnights"),
            Err(ScheduleParseError::Unrecognized(_))
        ));
        assert!(matches!(
            Schedule::parse("every x seconds"),
            Err(ScheduleParseError::BadCount(_))
        ));
        assert!(matches!(
            Schedule::parse("every day at 25:00"),
            Err(ScheduleParseError::BadTimeOfDay(_))
        ));
        assert!(matches!(
            Schedule::parse("once upon a time"),
            Err(ScheduleParseError::Unrecognized(_))
        ));
    }

    #[test]
    fn test_fire_sequence_is_monotonic() {
        let schedule = Schedule::parse("every 10 seconds").unwrap();
        let mut now = Utc.with_ymd_and_hms(2026, 2, 22, 0, 0, 0).unwrap();
        let mut last_fire = schedule.next_fire_after(now);
        for _ in 0..100 {
            now += chrono::Duration::seconds(3);
            let fire = schedule.next_fire_after(now);
            assert!(fire >= last_fire, "fire sequence must be non-decreasing");
            assert!(fire > now);
            last_fire = fire;
        }
    }

    #[test]
    fn test_daily_sequence_is_monotonic() {
        let schedule = Schedule::parse("every day at 12:00").unwrap();
        let mut now = Utc.with_ymd_and_hms(2026, 2, 22, 0, 0, 0).unwrap();
        let mut last_fire = schedule.next_fire_after(now);
        for _ in 0..50 {
            now += chrono::Duration::hours(5);
            let fire = schedule.next_fire_after(now);
            assert!(fire >= last_fire);
            last_fire = fire;
        }
    }
}
