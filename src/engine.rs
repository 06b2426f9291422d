use anyhow::{bail, Result};
use chrono::Local;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::alert::Alerter;
use crate::config::SessionConfig;
use crate::history::StatusHistory;
use crate::logger::SessionLog;
use crate::models::{CheckOutcome, DowntimeEvent, Stats, Status};
use crate::prober::Probe;
use crate::utils::truncate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

/// What a finished session hands back to its caller.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub url: String,
    pub checks: usize,
    pub alerts: usize,
    pub cancelled: bool,
    pub stats: Stats,
    pub downtime: Vec<DowntimeEvent>,
    pub log_path: PathBuf,
}

impl SessionReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\n\n{}", "=".repeat(60));
        let _ = writeln!(out, "📊 MONITORING SUMMARY");
        let _ = writeln!(out, "{}", "=".repeat(60));
        let _ = writeln!(out, "URL Monitored: {}", self.url);
        let _ = writeln!(out, "Total checks: {}", self.stats.total);
        let _ = writeln!(out, "✅ UP: {} times", self.stats.up_count);
        let _ = writeln!(out, "❌ DOWN: {} times", self.stats.down_count);
        let _ = writeln!(out, "📈 Uptime: {:.2}%", self.stats.uptime_pct);
        let _ = writeln!(out, "⚡ Average Response Time: {:.2}ms", self.stats.avg_latency_ms);
        let _ = writeln!(out, "📁 Log file saved: {}", self.log_path.display());

        if !self.downtime.is_empty() {
            let _ = writeln!(out, "\n🔴 Downtime Periods:");
            for event in &self.downtime {
                let _ = writeln!(
                    out,
                    "   - Check #{} at {}: {}",
                    event.check_number,
                    event.timestamp.to_rfc3339(),
                    event.error
                );
            }
        }
        let _ = write!(out, "{}", "=".repeat(60));
        out
    }
}

/// One monitoring session: probe, record, display, alert, sleep.
///
/// Owns the history and the log file exclusively. A loop runs once; a new
/// session needs a new `MonitorLoop`.
pub struct MonitorLoop {
    config: SessionConfig,
    prober: Arc<dyn Probe>,
    alerter: Alerter,
    log: SessionLog,
    history: StatusHistory,
    state: SessionState,
    last_status: Option<Status>,
    alerts_raised: usize,
}

impl MonitorLoop {
    pub fn new(config: SessionConfig, prober: Arc<dyn Probe>, alerter: Alerter, log: SessionLog) -> Self {
        Self {
            config,
            prober,
            alerter,
            log,
            history: StatusHistory::new(),
            state: SessionState::Idle,
            last_status: None,
            alerts_raised: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs until `duration` has elapsed or `cancel` fires, then prints the summary.
    pub async fn start(&mut self, duration: Duration, cancel: CancellationToken) -> Result<SessionReport> {
        if self.state != SessionState::Idle {
            bail!("Session already ran; start a new monitor for another session");
        }

        let started_at = Local::now();
        let deadline = Instant::now().checked_add(duration);
        let end_at = chrono::Duration::from_std(duration)
            .ok()
            .and_then(|span| started_at.checked_add_signed(span));
        let (Some(deadline), Some(end_at)) = (deadline, end_at) else {
            bail!("Monitoring duration {:?} is too long", duration);
        };

        self.state = SessionState::Running;
        self.history.clear();
        self.last_status = None;

        println!("\n🔍 Starting monitor for {}", self.config.url);
        println!("Duration: {} minutes", duration.as_secs_f64() / 60.0);
        println!("Check interval: {} seconds", self.config.interval.as_secs_f64());
        println!("Log location: {}", self.log.path().display());
        println!("Start time: {}", started_at.format("%Y-%m-%d %H:%M:%S"));
        println!("End time: {}", end_at.format("%Y-%m-%d %H:%M:%S"));
        println!("{}", "-".repeat(100));
        info!("Session started for {} ({:?}, every {:?})", self.config.url, duration, self.config.interval);

        let mut check_number = 0;
        let mut cancelled = false;

        while Instant::now() < deadline {
            check_number += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                outcome = self.prober.check(&self.config.url, self.config.timeout) => outcome,
            };

            self.record(check_number, outcome).await;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining <= self.config.interval {
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        if cancelled {
            println!("\n\n⚠️  Monitoring stopped by user");
            info!("Session for {} cancelled after {} checks", self.config.url, self.history.len());
        }
        self.state = SessionState::Stopped;

        let report = SessionReport {
            url: self.config.url.clone(),
            checks: self.history.len(),
            alerts: self.alerts_raised,
            cancelled,
            stats: self.history.stats(),
            downtime: self.history.downtime(),
            log_path: self.log.path().to_path_buf(),
        };
        println!("{}", report.render());
        info!(
            "Session stopped: {} checks, {:.2}% uptime",
            report.stats.total, report.stats.uptime_pct
        );
        Ok(report)
    }

    async fn record(&mut self, check_number: usize, outcome: CheckOutcome) {
        self.history.append(outcome.clone());

        if let Err(e) = self.log.append(&self.config.url, &outcome) {
            println!("[!] Failed to write log entry: {:#}", e);
            warn!("Log append failed: {:#}", e);
        }

        println!("{}", status_line(&outcome, check_number, &self.history.stats()));

        if self.last_status == Some(Status::Up) && outcome.status == Status::Down {
            self.alerter.on_transition(&self.config.url, &outcome).await;
            self.alerts_raised += 1;
        }
        self.last_status = Some(outcome.status);
    }
}

pub fn status_line(outcome: &CheckOutcome, check_number: usize, stats: &Stats) -> String {
    let time = outcome.timestamp.format("%H:%M:%S");
    let running = format!(
        "Stats: {} UP, {} DOWN ({:.1}% uptime)",
        stats.up_count, stats.down_count, stats.uptime_pct
    );
    match outcome.status {
        Status::Up => format!(
            "✅ Check #{} [{}] Status: UP | Response: {}ms | Code: {} | {}",
            check_number,
            time,
            outcome.response_time_ms.map_or("N/A".to_string(), |ms| ms.to_string()),
            outcome.status_code.map_or("N/A".to_string(), |c| c.to_string()),
            running
        ),
        Status::Down => format!(
            "❌ Check #{} [{}] Status: DOWN | Error: {}... | {}",
            check_number,
            time,
            truncate(outcome.error.as_deref().unwrap_or(""), 50),
            running
        ),
    }
}
