//! # Sendtrack - Bulk application mailer with live progress
//!
//! Sendtrack sends one application email per selected company and streams
//! progress to the browser over Server-Sent Events.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Recipients  │────▶│  Job runner │────▶│   Mailer    │     │   Browser   │
//! │  (CSV file) │     │ (one at a   │     │ (dry-run or │     │  progress   │
//! └─────────────┘     │    time)    │     │  HTTP relay)│     │   client    │
//!                     └──────┬──────┘     └─────────────┘     └──────▲──────┘
//!                            │ ProgressEvent (broadcast)             │ SSE
//!                            └───────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Recipient, SenderProfile)
//! - [`directory`] - Recipient CSV loading with auto-detection
//! - [`mailer`] - Message composition and delivery
//! - [`job`] - Bulk send runner and progress events
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;
pub mod config;

// Recipients
pub mod directory;

// Delivery
pub mod mailer;
pub mod job;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, DirectoryError, JobError, MailError, ServerError};

pub use models::{Recipient, SenderProfile};

pub use directory::RecipientDirectory;

pub use mailer::{compose_application, is_valid_email, DryRunMailer, Mailer, OutgoingEmail, RelayMailer};

pub use job::{JobManager, JobStatus, JobTicket, ProgressEvent};

pub use config::{MailerConfig, ServerConfig};

pub use api::types::{BulkEmailRequest, CancelRequest, CancelResponse, JobStartResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, serve, start_server, AppState};
}
