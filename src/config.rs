use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Tool-wide defaults, read from an optional JSON file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_interval_secs")]
    pub default_interval_secs: u64,
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_dir() -> PathBuf { PathBuf::from("Logs") }
pub fn default_interval_secs() -> u64 { 30 }
pub fn default_duration_minutes() -> f64 { 5.0 }
fn default_timeout_secs() -> u64 { 10 }
fn default_smtp_host() -> String { "smtp.gmail.com".into() }
fn default_smtp_port() -> u16 { 587 }
fn default_log_level() -> String { "warn".into() }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            default_interval_secs: default_interval_secs(),
            default_duration_minutes: default_duration_minutes(),
            timeout_secs: default_timeout_secs(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read { path: path.to_path_buf(), source });
            }
        };
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_interval_secs == 0 {
            return Err(ConfigError::Invalid("default_interval_secs must be > 0".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be > 0".into()));
        }
        if !(self.default_duration_minutes > 0.0) || minutes(self.default_duration_minutes).is_none() {
            return Err(ConfigError::Invalid(format!(
                "default_duration_minutes must be > 0 and at most {}",
                MAX_DURATION_MINUTES
            )));
        }
        Ok(())
    }
}

/// Sender/recipient triple for email alerts. Only exists when complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub recipient: String,
    pub sender: String,
    pub secret: String,
}

impl Credentials {
    pub fn from_parts(
        recipient: Option<String>,
        sender: Option<String>,
        secret: Option<String>,
    ) -> Option<Self> {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Some(Self {
            recipient: non_empty(recipient)?,
            sender: non_empty(sender)?,
            secret: non_empty(secret)?,
        })
    }
}

/// Parameters of one monitoring session. Fixed once the session starts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub credentials: Option<Credentials>,
}

impl SessionConfig {
    pub fn new(
        url: &str,
        interval: Duration,
        timeout: Duration,
        credentials: Option<Credentials>,
    ) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::Invalid("check interval must be > 0".into()));
        }
        if timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be > 0".into()));
        }
        let url = normalize_url(url);
        if url == "https://" {
            return Err(ConfigError::Invalid("URL must not be empty".into()));
        }
        Ok(Self { url, interval, timeout, credentials })
    }
}

/// Prepends `https://` to URLs given without a scheme.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Longest session accepted from user input: one year.
pub const MAX_DURATION_MINUTES: f64 = 60.0 * 24.0 * 365.0;

/// Converts a fractional minute count into a duration. Negatives, NaN and
/// anything past [`MAX_DURATION_MINUTES`] are rejected.
pub fn minutes(value: f64) -> Option<Duration> {
    if !(0.0..=MAX_DURATION_MINUTES).contains(&value) {
        return None;
    }
    Duration::try_from_secs_f64(value * 60.0).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("Logs"));
        assert_eq!(config.default_interval_secs, 30);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.smtp_port, 587);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulsewatch.json");
        std::fs::write(&path, r#"{"log_dir": "out", "timeout_secs": 3}"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.log_dir, PathBuf::from("out"));
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.smtp_host, "smtp.gmail.com");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulsewatch.json");
        std::fs::write(&path, r#"{"default_interval_secs": 0}"#).unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_oversized_default_duration_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulsewatch.json");
        std::fs::write(&path, r#"{"default_duration_minutes": 1e300}"#).unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulsewatch.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_credentials_all_or_nothing() {
        let some = |s: &str| Some(s.to_string());
        assert!(Credentials::from_parts(some("a@x.io"), some("b@x.io"), some("pw")).is_some());
        assert!(Credentials::from_parts(some("a@x.io"), some("b@x.io"), None).is_none());
        assert!(Credentials::from_parts(some("a@x.io"), some("  "), some("pw")).is_none());
        assert!(Credentials::from_parts(None, None, None).is_none());
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url(" http://example.com "), "http://example.com");
        assert_eq!(normalize_url("https://example.com/x"), "https://example.com/x");
    }

    #[test]
    fn test_session_config_rejects_zero_interval() {
        let result = SessionConfig::new(
            "example.com",
            Duration::ZERO,
            Duration::from_secs(10),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_minutes() {
        assert_eq!(minutes(0.05), Some(Duration::from_secs(3)));
        assert_eq!(minutes(-1.0), None);
        assert_eq!(minutes(f64::NAN), None);
        assert_eq!(minutes(f64::INFINITY), None);
    }

    #[test]
    fn test_minutes_rejects_huge_values() {
        assert_eq!(minutes(1e300), None);
        assert_eq!(minutes(1e18), None);
        assert_eq!(minutes(1e12), None);
        assert_eq!(minutes(MAX_DURATION_MINUTES + 1.0), None);
        assert_eq!(
            minutes(MAX_DURATION_MINUTES),
            Some(Duration::from_secs(365 * 24 * 60 * 60))
        );
    }
}
