//! Outgoing application emails.
//!
//! [`compose_application`] builds the message for one recipient; a
//! [`Mailer`] delivers it. Two mailers ship with the server:
//!
//! - [`DryRunMailer`] logs the message and reports success
//! - [`RelayMailer`] posts the message as JSON to an HTTP mail relay
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sendtrack::mailer::{compose_application, Mailer, RelayMailer};
//!
//! let mailer = RelayMailer::new("https://relay.internal/send").with_token(token);
//! let email = compose_application(&sender, &recipient);
//! mailer.send(&email).await?;
//! ```

use std::time::Duration;

use futures::future::BoxFuture;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MailError, MailResult};
use crate::models::{Recipient, SenderProfile};

/// Default number of delivery attempts
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay between attempts in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Validate email format
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_RE.is_match(address)
}

/// A fully composed plain-text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Compose the application email for one recipient.
pub fn compose_application(sender: &SenderProfile, recipient: &Recipient) -> OutgoingEmail {
    let name = sender.display_name();
    let subject = format!("Application for a position at {} – {}", recipient.company, name);

    let mut body = format!(
        "Dear Hiring Team at {},\n\nI am writing to express my interest in joining {}.\n\n",
        recipient.company, recipient.company
    );
    if let Some(pitch) = sender.pitch.as_deref().filter(|p| !p.trim().is_empty()) {
        body.push_str(pitch.trim());
        body.push_str("\n\n");
    }
    body.push_str(
        "I look forward to discussing how my skills and experience align with this opportunity.\n\n",
    );
    body.push_str("Kind regards,\n");
    body.push_str(name);
    body.push('\n');
    if let Some(phone) = sender.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        body.push_str(&format!("Phone: {}\n", phone.trim()));
    }
    body.push_str(&format!("Email: {}\n", sender.email));

    OutgoingEmail {
        from: sender.email.clone(),
        to: recipient.email.clone(),
        subject,
        body,
    }
}

/// Delivers a single message.
///
/// Returns a boxed future so mailers can be shared as `Arc<dyn Mailer>`.
pub trait Mailer: Send + Sync {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, MailResult<()>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Mailer that only logs what it would send.
#[derive(Debug, Clone, Default)]
pub struct DryRunMailer;

impl Mailer for DryRunMailer {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, MailResult<()>> {
        Box::pin(async move {
            if !is_valid_email(&email.to) {
                return Err(MailError::InvalidAddress(email.to.clone()));
            }
            tracing::info!(to = %email.to, subject = %email.subject, "dry-run: email not sent");
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}

/// Mailer posting messages to an HTTP relay, with retries.
#[derive(Clone)]
pub struct RelayMailer {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl RelayMailer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            token: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    /// Set a bearer token sent with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the retry policy
    pub fn with_retries(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Single delivery attempt
    async fn try_send(&self, email: &OutgoingEmail) -> MailResult<()> {
        let mut request = self.client.post(&self.url).json(email);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(500).collect(),
        })
    }
}

impl Mailer for RelayMailer {
    fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, MailResult<()>> {
        Box::pin(async move {
            if !is_valid_email(&email.to) {
                return Err(MailError::InvalidAddress(email.to.clone()));
            }

            let mut attempt = 1;
            loop {
                match self.try_send(email).await {
                    Ok(()) => {
                        tracing::debug!(to = %email.to, attempt, "relay accepted email");
                        return Ok(());
                    }
                    Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                        tracing::warn!(to = %email.to, attempt, error = %e, "relay attempt failed, retrying");
                        tokio::time::sleep(self.retry_delay).await;
                        attempt += 1;
                    }
                    Err(e) => {
                        tracing::error!(to = %email.to, attempt, error = %e, "relay delivery failed");
                        return Err(e);
                    }
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "relay"
    }
}
