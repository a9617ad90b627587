//! Error types for the Sendtrack job server.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DirectoryError`] - Recipient CSV loading and lookup errors
//! - [`MailError`] - Message validation and delivery errors
//! - [`JobError`] - Bulk job orchestration errors
//! - [`ConfigError`] - Environment/CLI configuration errors
//! - [`ServerError`] - Top-level HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Recipient Directory Errors
// =============================================================================

/// Errors while loading or querying the recipient directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Failed to read file.
    #[error("Failed to read recipients file: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid CSV content.
    #[error("Invalid CSV at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Empty file.
    #[error("Recipients file is empty")]
    EmptyFile,

    /// A required column is absent from the header row.
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// Two rows share the same identifier.
    #[error("Duplicate recipient id '{id}' at line {line}")]
    DuplicateId { id: String, line: usize },

    /// Lookup of ids that the directory does not know.
    #[error("Unknown recipient ids: {}", .0.join(", "))]
    UnknownIds(Vec<String>),
}

// =============================================================================
// Mail Errors
// =============================================================================

/// Errors while composing or delivering a single email.
#[derive(Debug, Error)]
pub enum MailError {
    /// Address does not look like an email address.
    #[error("Invalid email format: {0}")]
    InvalidAddress(String),

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Relay answered with a non-success status.
    #[error("Relay rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl MailError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            MailError::InvalidAddress(_) => false,
            MailError::Http(_) => true,
            MailError::Rejected { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

// =============================================================================
// Job Errors
// =============================================================================

/// Errors when starting or controlling a bulk send job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Nothing was selected.
    #[error("Please select at least one company")]
    NoRecipients,

    /// Another job is still sending.
    #[error("A bulk send job is already running ({0})")]
    AlreadyRunning(String),

    /// Selection could not be resolved.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while assembling the server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    /// A variable is required in this mode but absent.
    #[error("Required setting '{0}' is not set")]
    Missing(&'static str),
}

// =============================================================================
// Server Errors (top-level)
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Recipient directory error.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Socket bind/serve failure.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Result type for mail operations.
pub type MailResult<T> = Result<T, MailError>;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
