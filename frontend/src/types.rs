//! Common types used across the frontend application.
//!
//! # Categories
//!
//! - **Log Types** - Progress log entries
//! - **API Types** - Backend request/response structures
//! - **Error Types** - Frontend error handling

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Log Types
// =============================================================================

/// Log severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Informational message
    Info,
    /// Success/completion message
    Success,
    /// Error message
    Error,
}

impl LogLevel {
    /// Get CSS class for styling.
    pub fn css_class(&self) -> &'static str {
        match self {
            LogLevel::Info => "log-entry info",
            LogLevel::Success => "log-entry success",
            LogLevel::Error => "log-entry error",
        }
    }
}

/// A single line of the progress log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Severity level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Timestamp string (HH:MM:SS)
    pub timestamp: String,
}

impl LogEntry {
    /// Entry stamped with the current local time.
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

// =============================================================================
// API Types
// =============================================================================

/// A company offered by the recipient picker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub company: String,
    pub email: String,
}

/// Body sent to the job endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BulkEmailRequest {
    pub selected: Vec<String>,
}

/// Response from the job endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStartResponse {
    /// "started" on success
    pub status: String,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStartResponse {
    pub fn is_started(&self) -> bool {
        self.status == "started"
    }
}

/// Body of the cancellation request.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CancelRequest {
    pub cancel: bool,
}

// =============================================================================
// Error Types
// =============================================================================

/// Frontend application errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppError {
    /// Network/HTTP error.
    Network(String),
    /// Progress stream could not be opened.
    Stream(String),
    /// Invalid user input.
    Validation(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "{}", msg),
            AppError::Stream(msg) => write!(f, "Stream error: {}", msg),
            AppError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Result type alias for frontend operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_response_deserialization() {
        let started: JobStartResponse =
            serde_json::from_str(r#"{"status":"started","jobId":"j-1","total":3}"#).unwrap();
        assert!(started.is_started());
        assert_eq!(started.total, Some(3));

        let failed: JobStartResponse =
            serde_json::from_str(r#"{"status":"error","error":"Unknown recipient ids: 9"}"#).unwrap();
        assert!(!failed.is_started());
        assert_eq!(failed.error.as_deref(), Some("Unknown recipient ids: 9"));
    }

    #[test]
    fn test_log_entry_timestamp_shape() {
        let entry = LogEntry::now(LogLevel::Info, "hello");
        assert_eq!(entry.timestamp.len(), 8);
        assert_eq!(entry.timestamp.matches(':').count(), 2);
    }
}
