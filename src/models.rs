use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Up,
    Down,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Up => write!(f, "UP"),
            Status::Down => write!(f, "DOWN"),
        }
    }
}

/// Result of a single availability check.
///
/// Build through [`CheckOutcome::up`] or [`CheckOutcome::down`] so that an UP
/// outcome never carries an error and a DOWN outcome never carries a code or
/// latency.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub status: Status,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<f64>,
    pub timestamp: DateTime<Local>,
    pub error: Option<String>,
}

impl CheckOutcome {
    pub fn up(status_code: u16, elapsed: Duration) -> Self {
        Self {
            status: Status::Up,
            status_code: Some(status_code),
            response_time_ms: Some(round2(elapsed.as_secs_f64() * 1000.0)),
            timestamp: Local::now(),
            error: None,
        }
    }

    pub fn down(error: impl Into<String>) -> Self {
        Self {
            status: Status::Down,
            status_code: None,
            response_time_ms: None,
            timestamp: Local::now(),
            error: Some(error.into()),
        }
    }
}

/// One flat record of the persisted session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub url: String,
    pub status: Status,
    #[serde(rename = "statusCode", alias = "status_code", default)]
    pub status_code: Option<u16>,
    #[serde(rename = "responseTimeMs", alias = "response_time", default)]
    pub response_time_ms: Option<f64>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LogEntry {
    pub fn new(url: &str, outcome: &CheckOutcome) -> Self {
        Self {
            url: url.to_string(),
            status: outcome.status,
            status_code: outcome.status_code,
            response_time_ms: outcome.response_time_ms,
            timestamp: outcome.timestamp,
            error: outcome.error.clone(),
        }
    }
}

// Older logs carry naive local timestamps without an offset.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
}

/// Aggregate counters shared by the live summary and the offline analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub up_count: usize,
    pub down_count: usize,
    pub uptime_pct: f64,
    pub avg_latency_ms: f64,
}

impl Stats {
    /// Folds `(status, latency)` pairs into counts, uptime and mean UP latency.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = (Status, Option<f64>)>,
    {
        let mut stats = Stats::default();
        let mut latency_sum = 0.0;
        let mut latency_count = 0usize;

        for (status, latency) in samples {
            stats.total += 1;
            match status {
                Status::Up => {
                    stats.up_count += 1;
                    if let Some(ms) = latency {
                        latency_sum += ms;
                        latency_count += 1;
                    }
                }
                Status::Down => stats.down_count += 1,
            }
        }

        if stats.total > 0 {
            stats.uptime_pct = stats.up_count as f64 / stats.total as f64 * 100.0;
        }
        if latency_count > 0 {
            stats.avg_latency_ms = latency_sum / latency_count as f64;
        }
        stats
    }
}

/// A DOWN record pulled out of a history or a log.
#[derive(Debug, Clone, PartialEq)]
pub struct DowntimeEvent {
    pub check_number: usize,
    pub timestamp: DateTime<Local>,
    pub error: String,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
