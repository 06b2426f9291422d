use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod alert;
mod analyzer;
mod config;
mod engine;
mod history;
mod logger;
mod menu;
mod models;
mod prober;
mod utils;

use crate::config::{AppConfig, Credentials, SessionConfig};
use crate::menu::Menu;

#[derive(Parser)]
#[command(name = "pulsewatch", version, about = "Website availability poller")]
struct Cli {
    /// JSON file with tool-wide defaults
    #[arg(long, global = true, default_value = "pulsewatch.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one monitoring session without prompts
    Monitor {
        #[arg(long)]
        url: String,
        /// Session length in minutes
        #[arg(long)]
        duration: Option<f64>,
        /// Seconds between checks
        #[arg(long)]
        interval: Option<u64>,
        /// Per-check timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long, env = "PULSEWATCH_ALERT_TO")]
        alert_to: Option<String>,
        #[arg(long, env = "PULSEWATCH_SMTP_USER")]
        smtp_user: Option<String>,
        #[arg(long, env = "PULSEWATCH_SMTP_PASSWORD", hide_env_values = true)]
        smtp_password: Option<String>,
    },
    /// Summarize a recorded session log
    Analyze { file: String },
    /// List recorded session logs
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::setup_console();

    let cli = Cli::parse();
    let app = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let level = app.log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::WARN);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .init();

    match cli.command {
        None => Menu::new(app).run().await,
        Some(Command::Monitor {
            url,
            duration,
            interval,
            timeout,
            alert_to,
            smtp_user,
            smtp_password,
        }) => {
            let minutes = duration.unwrap_or(app.default_duration_minutes);
            let duration = config::minutes(minutes)
                .with_context(|| format!("Invalid duration: {} minutes", minutes))?;
            let session = SessionConfig::new(
                &url,
                Duration::from_secs(interval.unwrap_or(app.default_interval_secs)),
                Duration::from_secs(timeout.unwrap_or(app.timeout_secs)),
                Credentials::from_parts(alert_to, smtp_user, smtp_password),
            )?;
            menu::run_session(&app, session, duration).await?;
            Ok(())
        }
        Some(Command::Analyze { file }) => {
            menu::print_analysis(&analyzer::resolve_log_path(&file, &app.log_dir));
            Ok(())
        }
        Some(Command::List) => {
            menu::print_log_list(&app.log_dir);
            Ok(())
        }
    }
}
