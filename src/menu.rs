//! Interactive menu and the session/analysis entry points shared with the CLI.

use anyhow::{Context, Result};
use chrono::Local;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::alert::{Alerter, SmtpNotifier, SystemBeep};
use crate::analyzer::{self, resolve_log_path};
use crate::config::{self, AppConfig, Credentials, SessionConfig};
use crate::engine::{MonitorLoop, SessionReport};
use crate::logger::{self, LogError, LogFileInfo, SessionLog};
use crate::prober::HttpProber;

/// Builds the production collaborators and runs one session. Ctrl-C stops it.
pub async fn run_session(app: &AppConfig, session: SessionConfig, duration: Duration) -> Result<SessionReport> {
    let log = SessionLog::create(&app.log_dir, Local::now())?;
    let alerter = Alerter::new(
        session.credentials.clone(),
        Arc::new(SmtpNotifier::new(app.smtp_host.clone(), app.smtp_port)),
        Some(Arc::new(SystemBeep)),
    );
    let mut monitor = MonitorLoop::new(session, Arc::new(HttpProber::new()), alerter, log);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                if on_interrupt(&cancel) == Interrupt::Exit {
                    std::process::exit(130);
                }
            }
        });
    }

    let report = monitor.start(duration, cancel.clone()).await;
    // The listener stays installed, so later Ctrl-C presses exit the process.
    cancel.cancel();
    let report = report?;
    info!(
        "Session finished: {} checks, {} alert(s), cancelled: {}",
        report.checks, report.alerts, report.cancelled
    );
    Ok(report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    StopSession,
    Exit,
}

/// The first Ctrl-C stops a running session; any later one, or one after the
/// session ended, exits.
pub fn on_interrupt(cancel: &CancellationToken) -> Interrupt {
    if cancel.is_cancelled() {
        Interrupt::Exit
    } else {
        cancel.cancel();
        Interrupt::StopSession
    }
}

pub fn print_analysis(path: &Path) {
    match analyzer::analyze(path) {
        Ok(summary) => print!("{}", summary.render()),
        Err(LogError::NotFound(p)) => println!("Error: Log file '{}' not found.", p.display()),
        Err(e) => println!("Error analyzing log file: {}", e),
    }
}

/// Prints the log listing and returns it for selection.
pub fn print_log_list(dir: &Path) -> Vec<LogFileInfo> {
    let logs = match logger::list_logs(dir) {
        Ok(Some(logs)) => logs,
        Ok(None) => {
            println!("No '{}' directory found.", dir.display());
            return Vec::new();
        }
        Err(e) => {
            println!("Error listing log files: {:#}", e);
            return Vec::new();
        }
    };

    if logs.is_empty() {
        println!("No log files found in '{}' directory.", dir.display());
        return logs;
    }

    println!("\n📁 Found {} log file(s) in '{}' directory:", logs.len(), dir.display());
    for (i, log) in logs.iter().enumerate() {
        println!(
            "   {}. {} ({:.2} KB) - Modified: {}",
            i + 1,
            log.name,
            log.size_bytes as f64 / 1024.0,
            log.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }
    logs
}

/// Duration and interval as typed by the user, before defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub duration_minutes: f64,
    pub interval_secs: u64,
    pub used_defaults: bool,
}

/// Any malformed value resets both numbers to their defaults. An empty interval
/// means the default interval.
pub fn parse_timing(duration: &str, interval: &str, app: &AppConfig) -> Timing {
    let defaults = Timing {
        duration_minutes: app.default_duration_minutes,
        interval_secs: app.default_interval_secs,
        used_defaults: true,
    };

    let Ok(duration_minutes) = duration.trim().parse::<f64>() else {
        return defaults;
    };
    if config::minutes(duration_minutes).is_none() {
        return defaults;
    }

    let interval = interval.trim();
    let interval_secs = if interval.is_empty() {
        app.default_interval_secs
    } else {
        match interval.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => return defaults,
        }
    };

    Timing { duration_minutes, interval_secs, used_defaults: false }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogChoice<'a> {
    Listed(&'a LogFileInfo),
    OutOfRange,
    Named(String),
}

/// A number picks from the listing; anything else is taken as a file name.
pub fn choose_log<'a>(input: &str, logs: &'a [LogFileInfo]) -> LogChoice<'a> {
    let input = input.trim();
    match input.parse::<usize>() {
        Ok(n) if n >= 1 && n <= logs.len() => LogChoice::Listed(&logs[n - 1]),
        Ok(_) => LogChoice::OutOfRange,
        Err(_) => LogChoice::Named(input.to_string()),
    }
}

pub struct Menu {
    config: AppConfig,
}

impl Menu {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<()> {
        println!("🌐 Website Monitoring Tool");
        println!("{}", "=".repeat(40));
        println!("\nOptions:");
        println!("1. Start new monitoring session");
        println!("2. Analyze existing log file");
        println!("3. List all log files");

        let choice = prompt("\nSelect option (1-3)")?;
        match choice.as_str() {
            "1" => self.start_session().await,
            "2" => {
                self.analyze_existing()?;
                Ok(())
            }
            "3" => {
                print_log_list(&self.config.log_dir);
                Ok(())
            }
            _ => {
                println!("Invalid option selected.");
                Ok(())
            }
        }
    }

    async fn start_session(&self) -> Result<()> {
        let url = prompt("Enter the URL to monitor")?;
        let recipient = prompt("Enter your email address to receive alerts")?;
        let sender = prompt("Enter the sender email address (for sending alerts)")?;
        let secret = prompt("Enter the sender app password")?;
        let duration = prompt("Enter monitoring duration (minutes)")?;
        let interval = prompt(&format!(
            "Enter check interval (seconds) [default: {}]",
            self.config.default_interval_secs
        ))?;

        let timing = parse_timing(&duration, &interval, &self.config);
        if timing.used_defaults {
            println!("Invalid input. Using defaults.");
        }

        let credentials = Credentials::from_parts(Some(recipient), Some(sender), Some(secret));
        let session = match SessionConfig::new(
            &url,
            Duration::from_secs(timing.interval_secs),
            Duration::from_secs(self.config.timeout_secs),
            credentials,
        ) {
            Ok(session) => session,
            Err(e) => {
                println!("❌ {}", e);
                return Ok(());
            }
        };
        let duration = config::minutes(timing.duration_minutes).unwrap_or_default();

        let report = run_session(&self.config, session, duration).await?;
        info!("Session log written to {}", report.log_path.display());

        let answer = prompt("\nWould you like to analyze the log file now? (y/n)")?;
        if answer.eq_ignore_ascii_case("y") {
            print_analysis(&report.log_path);
        }
        Ok(())
    }

    fn analyze_existing(&self) -> Result<()> {
        let logs = print_log_list(&self.config.log_dir);
        if logs.is_empty() {
            return Ok(());
        }

        let input = prompt("\nEnter file number to analyze (or full filename)")?;
        match choose_log(&input, &logs) {
            LogChoice::Listed(log) => print_analysis(&log.path),
            LogChoice::OutOfRange => println!("Invalid file number."),
            LogChoice::Named(name) => print_analysis(&resolve_log_path(&name, &self.config.log_dir)),
        }
        Ok(())
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).context("Failed to read from stdin")?;
    Ok(input.trim().to_string())
}
