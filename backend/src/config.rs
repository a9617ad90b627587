//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first by the
//! binary) and can be overridden by CLI flags. Without a relay URL the
//! server runs with the dry-run mailer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::job::DEFAULT_SEND_DELAY;
use crate::mailer::{DryRunMailer, Mailer, RelayMailer};
use crate::models::SenderProfile;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RECIPIENTS_PATH: &str = "recipients.csv";

/// How outgoing mail is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailerConfig {
    DryRun,
    Relay { url: String, token: Option<String> },
}

impl MailerConfig {
    pub fn build(&self) -> Arc<dyn Mailer> {
        match self {
            MailerConfig::DryRun => Arc::new(DryRunMailer),
            MailerConfig::Relay { url, token } => {
                let mut mailer = RelayMailer::new(url.clone());
                if let Some(token) = token {
                    mailer = mailer.with_token(token.clone());
                }
                Arc::new(mailer)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub recipients_path: PathBuf,
    pub send_delay: Duration,
    pub mailer: MailerConfig,
    pub sender: SenderProfile,
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("SENDTRACK_PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue { key: "SENDTRACK_PORT", value: v })?,
            None => DEFAULT_PORT,
        };

        let send_delay = match get("SENDTRACK_SEND_DELAY_MS") {
            Some(v) => Duration::from_millis(
                v.parse::<u64>()
                    .map_err(|_| ConfigError::InvalidValue { key: "SENDTRACK_SEND_DELAY_MS", value: v })?,
            ),
            None => DEFAULT_SEND_DELAY,
        };

        let mailer = match get("SENDTRACK_RELAY_URL") {
            Some(url) => MailerConfig::Relay {
                url,
                token: get("SENDTRACK_RELAY_TOKEN"),
            },
            None => MailerConfig::DryRun,
        };

        let sender = SenderProfile {
            name: get("SENDTRACK_SENDER_NAME").unwrap_or_default(),
            email: get("SENDTRACK_SENDER_EMAIL").unwrap_or_else(|| SenderProfile::default().email),
            phone: get("SENDTRACK_SENDER_PHONE"),
            pitch: get("SENDTRACK_PITCH"),
        };

        Ok(Self {
            port,
            recipients_path: get("SENDTRACK_RECIPIENTS")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RECIPIENTS_PATH)),
            send_delay,
            mailer,
            sender,
        })
    }

    /// Relay mode needs a real sender address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.mailer, MailerConfig::Relay { .. })
            && self.sender.email == SenderProfile::default().email
        {
            return Err(ConfigError::Missing("SENDTRACK_SENDER_EMAIL"));
        }
        Ok(())
    }
}
