use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{CheckOutcome, LogEntry};

/// Per-session JSON log. The file always holds one complete array.
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    /// Fixes the session's file path inside `dir`, creating `dir` if needed.
    pub fn create(dir: &Path, started_at: DateTime<Local>) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            println!("📁 Created '{}' directory for storing logs", dir.display());
        }
        let file_name = format!("monitor_log_{}.json", started_at.format("%Y%m%d_%H%M%S"));
        Ok(Self { path: dir.join(file_name) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-modify-write append. Unreadable content is dropped, not fatal.
    pub fn append(&self, url: &str, outcome: &CheckOutcome) -> Result<()> {
        let mut entries = match load_entries(&self.path) {
            Ok(entries) => entries,
            Err(LogError::NotFound(_)) => Vec::new(),
            Err(e) => {
                warn!("Starting fresh: {}", e);
                Vec::new()
            }
        };
        entries.push(LogEntry::new(url, outcome));

        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file '{}' not found", .0.display())]
    NotFound(PathBuf),
    #[error("log file '{}' is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Strict reader shared with the analyzer.
pub fn load_entries(path: &Path) -> Result<Vec<LogEntry>, LogError> {
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            LogError::NotFound(path.to_path_buf())
        } else {
            LogError::Io { path: path.to_path_buf(), source }
        }
    })?;
    serde_json::from_str(&content)
        .map_err(|source| LogError::Corrupt { path: path.to_path_buf(), source })
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogFileInfo {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
}

/// `*.json` files in `dir`, newest name first. `None` when `dir` is missing.
pub fn list_logs(dir: &Path) -> Result<Option<Vec<LogFileInfo>>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut logs = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let metadata = entry.metadata()?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        logs.push(LogFileInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            size_bytes: metadata.len(),
            modified: DateTime::<Local>::from(modified),
        });
    }
    logs.sort_by(|a, b| b.name.cmp(&a.name));
    info!("Found {} log file(s) in {}", logs.len(), dir.display());
    Ok(Some(logs))
}
