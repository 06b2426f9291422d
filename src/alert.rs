//! Transition alerts: console banner, audible cue and email delivery.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::models::CheckOutcome;
use crate::utils;

pub const BEEP_FREQUENCY_HZ: u32 = 1000;
pub const BEEP_DURATION_MS: u32 = 500;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address '{0}'")]
    Address(String),
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// An email ready to hand to a [`Notifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub recipient: String,
    pub sender: String,
    pub secret: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Plays a short tone. May be unavailable on the host.
pub trait AudioCue: Send + Sync {
    fn beep(&self, frequency_hz: u32, duration_ms: u32) -> std::io::Result<()>;
}

pub struct SystemBeep;

impl AudioCue for SystemBeep {
    fn beep(&self, frequency_hz: u32, duration_ms: u32) -> std::io::Result<()> {
        utils::beep(frequency_hz, duration_ms)
    }
}

/// Authenticated STARTTLS relay delivery.
pub struct SmtpNotifier {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SmtpNotifier {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let from: Mailbox = message
            .sender
            .parse()
            .map_err(|_| NotifyError::Address(message.sender.clone()))?;
        let to: Mailbox = message
            .recipient
            .parse()
            .map_err(|_| NotifyError::Address(message.recipient.clone()))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(self.port)
            .timeout(Some(self.timeout))
            .credentials(SmtpCredentials::new(message.sender.clone(), message.secret.clone()))
            .build();

        transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        debug!("Alert email accepted by {}:{}", self.host, self.port);
        Ok(())
    }
}

/// What happened to the remote notification of one alert.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Sent,
    Skipped,
    Failed(String),
}

pub struct Alerter {
    credentials: Option<Credentials>,
    notifier: Arc<dyn Notifier>,
    audio: Option<Arc<dyn AudioCue>>,
}

impl Alerter {
    pub fn new(
        credentials: Option<Credentials>,
        notifier: Arc<dyn Notifier>,
        audio: Option<Arc<dyn AudioCue>>,
    ) -> Self {
        Self { credentials, notifier, audio }
    }

    /// Runs the banner, beep and email steps. None of them can stop the others.
    pub async fn on_transition(&self, url: &str, outcome: &CheckOutcome) -> Delivery {
        let error = outcome.error.as_deref().unwrap_or("unknown error");
        let timestamp = outcome.timestamp.to_rfc3339();

        println!("\n{}", "=".repeat(60));
        println!("🚨 ALERT: WEBSITE DOWN! 🚨");
        println!("URL: {}", url);
        println!("Time: {}", timestamp);
        println!("Error: {}", error);
        println!("{}\n", "=".repeat(60));
        warn!("[CHANGE] {} -> DOWN ({})", url, error);

        if let Some(audio) = &self.audio {
            if let Err(e) = audio.beep(BEEP_FREQUENCY_HZ, BEEP_DURATION_MS) {
                debug!("Audible alert unavailable: {}", e);
            }
        }

        let Some(creds) = &self.credentials else {
            println!("[!] Email credentials not set. Skipping email notification.");
            return Delivery::Skipped;
        };

        let message = compose(creds, url, &timestamp, error);
        match self.notifier.send(&message).await {
            Ok(()) => {
                println!("📧 Email notification sent to {}", creds.recipient);
                info!("Alert email sent to {}", creds.recipient);
                Delivery::Sent
            }
            Err(e) => {
                println!("[!] Failed to send email notification: {}", e);
                warn!("Alert email to {} failed: {}", creds.recipient, e);
                Delivery::Failed(e.to_string())
            }
        }
    }
}

fn compose(creds: &Credentials, url: &str, timestamp: &str, error: &str) -> EmailMessage {
    EmailMessage {
        recipient: creds.recipient.clone(),
        sender: creds.sender.clone(),
        secret: creds.secret.clone(),
        subject: format!("[ALERT] Website DOWN: {}", url),
        body: format!(
            "The monitored website is DOWN!\n\nURL: {}\nTime: {}\nError: {}\n",
            url, timestamp, error
        ),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub sent: Mutex<Vec<EmailMessage>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(message.clone());
            if self.fail {
                return Err(NotifyError::Transport("535 authentication failed".into()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct CountingBeep {
        pub calls: AtomicUsize,
        pub broken: bool,
    }

    impl AudioCue for CountingBeep {
        fn beep(&self, frequency_hz: u32, duration_ms: u32) -> std::io::Result<()> {
            assert_eq!((frequency_hz, duration_ms), (BEEP_FREQUENCY_HZ, BEEP_DURATION_MS));
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "no speaker"));
            }
            Ok(())
        }
    }

    fn creds() -> Credentials {
        Credentials {
            recipient: "ops@example.com".into(),
            sender: "monitor@example.com".into(),
            secret: "app-password".into(),
        }
    }

    #[tokio::test]
    async fn test_sends_email_with_url_and_error() {
        let notifier = Arc::new(RecordingNotifier::default());
        let beep = Arc::new(CountingBeep::default());
        let alerter = Alerter::new(Some(creds()), notifier.clone(), Some(beep.clone()));

        let outcome = CheckOutcome::down("Connection Error: refused");
        let delivery = alerter.on_transition("https://example.com", &outcome).await;

        assert_eq!(delivery, Delivery::Sent);
        assert_eq!(beep.calls.load(Ordering::SeqCst), 1);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "[ALERT] Website DOWN: https://example.com");
        assert_eq!(sent[0].recipient, "ops@example.com");
        assert!(sent[0].body.contains("Error: Connection Error: refused"));
        assert!(sent[0].body.contains(&outcome.timestamp.to_rfc3339()));
    }

    #[tokio::test]
    async fn test_missing_credentials_skip_email() {
        let notifier = Arc::new(RecordingNotifier::default());
        let alerter = Alerter::new(None, notifier.clone(), None);

        let delivery = alerter
            .on_transition("https://example.com", &CheckOutcome::down("timeout"))
            .await;

        assert_eq!(delivery, Delivery::Skipped);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_reported_not_raised() {
        let notifier = Arc::new(RecordingNotifier { fail: true, ..Default::default() });
        let alerter = Alerter::new(Some(creds()), notifier, None);

        let delivery = alerter
            .on_transition("https://example.com", &CheckOutcome::down("timeout"))
            .await;

        assert!(matches!(delivery, Delivery::Failed(msg) if msg.contains("535")));
    }

    #[tokio::test]
    async fn test_broken_audio_does_not_block_email() {
        let notifier = Arc::new(RecordingNotifier::default());
        let beep = Arc::new(CountingBeep { broken: true, ..Default::default() });
        let alerter = Alerter::new(Some(creds()), notifier.clone(), Some(beep.clone()));

        let delivery = alerter
            .on_transition("https://example.com", &CheckOutcome::down("dns"))
            .await;

        assert_eq!(delivery, Delivery::Sent);
        assert_eq!(beep.calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_smtp_rejects_bad_sender_address() {
        let notifier = SmtpNotifier::new("localhost", 2525);
        let message = EmailMessage {
            recipient: "ops@example.com".into(),
            sender: "not an address".into(),
            secret: "x".into(),
            subject: "s".into(),
            body: "b".into(),
        };
        assert!(matches!(notifier.send(&message).await, Err(NotifyError::Address(_))));
    }
}
