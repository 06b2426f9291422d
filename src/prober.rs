use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::CheckOutcome;

/// A single availability check against one endpoint.
///
/// Implementations never fail: every transport problem becomes a DOWN outcome.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, url: &str, timeout: Duration) -> CheckOutcome;
}

pub struct HttpProber {
    http_client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Self {
        Self { http_client: reqwest::Client::new() }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn check(&self, url: &str, timeout: Duration) -> CheckOutcome {
        let start = Instant::now();
        match self.http_client.get(url).timeout(timeout).send().await {
            Ok(response) => {
                let elapsed = start.elapsed();
                debug!("GET {} -> {} in {:?}", url, response.status(), elapsed);
                CheckOutcome::up(response.status().as_u16(), elapsed)
            }
            Err(e) => {
                debug!("GET {} failed: {}", url, e);
                CheckOutcome::down(describe_error(&e, timeout))
            }
        }
    }
}

fn describe_error(e: &reqwest::Error, timeout: Duration) -> String {
    if e.is_timeout() {
        format!("Request Timeout after {}s: {}", timeout.as_secs_f64(), e)
    } else if e.is_connect() {
        format!("Connection Error: {}", e)
    } else if e.is_builder() {
        format!("Invalid Request: {}", e)
    } else {
        format!("Request Failed: {}", e)
    }
}
