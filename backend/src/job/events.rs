//! Progress events streamed to clients during a bulk send.
//!
//! Serialized as JSON with a `type` discriminator, one event per SSE
//! message:
//!
//! ```text
//! {"type":"progress","sent":3,"total":10,"message":"Sending to Acme"}
//! {"type":"email_sent","company":"Acme"}
//! {"type":"email_failed","company":"Globex","error":"Invalid email format: x"}
//! {"type":"completed","sent":8,"total":10,"failed":2}
//! {"type":"cancelled"}
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Counter update; `sent` counts processed recipients
    Progress { sent: u32, total: u32, message: String },
    EmailSent { company: String },
    EmailFailed { company: String, error: String },
    /// Terminal: every recipient was processed
    Completed { sent: u32, total: u32, failed: u32 },
    /// Terminal: stopped on user request
    Cancelled,
}

impl ProgressEvent {
    pub fn progress(sent: u32, total: u32, message: impl Into<String>) -> Self {
        Self::Progress { sent, total, message: message.into() }
    }

    pub fn email_sent(company: impl Into<String>) -> Self {
        Self::EmailSent { company: company.into() }
    }

    pub fn email_failed(company: impl Into<String>, error: impl Into<String>) -> Self {
        Self::EmailFailed { company: company.into(), error: error.into() }
    }

    /// Whether this event ends the job's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Cancelled)
    }
}
