//! Offline statistics over a persisted session log.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::logger::{load_entries, LogError};
use crate::models::{DowntimeEvent, LogEntry, Stats, Status};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogSummary {
    pub path: PathBuf,
    pub url: String,
    pub period: Option<(DateTime<Local>, DateTime<Local>)>,
    pub stats: Stats,
    pub latency: Option<LatencyStats>,
    pub downtime: Vec<DowntimeEvent>,
}

impl LogSummary {
    pub fn is_empty(&self) -> bool {
        self.stats.total == 0
    }

    fn from_entries(path: PathBuf, entries: &[LogEntry]) -> Self {
        let stats = Stats::from_samples(entries.iter().map(|e| (e.status, e.response_time_ms)));

        let latencies: Vec<f64> = entries
            .iter()
            .filter(|e| e.status == Status::Up)
            .filter_map(|e| e.response_time_ms)
            .collect();
        let latency = (!latencies.is_empty()).then(|| LatencyStats {
            min: latencies.iter().copied().fold(f64::INFINITY, f64::min),
            max: latencies.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            avg: stats.avg_latency_ms,
        });

        let downtime = entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == Status::Down)
            .map(|(i, e)| DowntimeEvent {
                check_number: i + 1,
                timestamp: e.timestamp,
                error: e.error.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            path,
            url: entries.first().map_or_else(|| "Unknown".to_string(), |e| e.url.clone()),
            period: entries.first().zip(entries.last()).map(|(a, b)| (a.timestamp, b.timestamp)),
            stats,
            latency,
            downtime,
        }
    }

    /// Human-readable report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.is_empty() {
            let _ = writeln!(out, "Log file is empty.");
            return out;
        }

        let _ = writeln!(out, "\n📊 Log Analysis");
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out, "Log file: {}", self.path.display());
        let _ = writeln!(out, "URL: {}", self.url);
        if let Some((start, end)) = &self.period {
            let _ = writeln!(out, "Period: {} to {}", start.to_rfc3339(), end.to_rfc3339());
        }
        let _ = writeln!(out, "Total pings: {}", self.stats.total);
        let _ = writeln!(out, "✅ UP: {} times", self.stats.up_count);
        let _ = writeln!(out, "❌ DOWN: {} times", self.stats.down_count);
        let _ = writeln!(out, "📈 Uptime: {:.2}%", self.stats.uptime_pct);

        if let Some(latency) = &self.latency {
            let _ = writeln!(out, "\n📊 Response Time Statistics:");
            let _ = writeln!(out, "   Min: {:.2}ms", latency.min);
            let _ = writeln!(out, "   Max: {:.2}ms", latency.max);
            let _ = writeln!(out, "   Avg: {:.2}ms", latency.avg);
        }

        if !self.downtime.is_empty() {
            let _ = writeln!(out, "\n🔴 Downtime Events:");
            for event in &self.downtime {
                let _ = writeln!(out, "   - {}: {}", event.timestamp.to_rfc3339(), event.error);
            }
        }
        out
    }
}

/// Resolves a bare file name against the log directory.
pub fn resolve_log_path(input: &str, log_dir: &Path) -> PathBuf {
    let path = Path::new(input);
    if path.parent().map_or(true, |p| p.as_os_str().is_empty()) {
        log_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

pub fn analyze(path: &Path) -> Result<LogSummary, LogError> {
    let entries = load_entries(path)?;
    Ok(LogSummary::from_entries(path.to_path_buf(), &entries))
}
