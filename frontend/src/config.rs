//! Application configuration.
//!
//! Centralized configuration for the Sendtrack frontend.
//! In development, these are hardcoded. In production, they could be
//! injected at build time.

use std::time::Duration;

/// Backend API base URL.
pub const BACKEND_URL: &str = "http://localhost:3000";

/// Server-sent progress events.
pub const PROGRESS_STREAM_PATH: &str = "/api/progress-stream";

/// Out-of-band cancellation request.
pub const CANCEL_PATH: &str = "/api/cancel";

/// Job start endpoint.
pub const BULK_EMAIL_PATH: &str = "/api/bulk-email";

/// Recipient list for the picker.
pub const RECIPIENTS_PATH: &str = "/api/recipients";

/// How long the progress surface stays up after a completed run.
pub const COMPLETE_HIDE_DELAY: Duration = Duration::from_secs(3);

/// How long the progress surface stays up after a cancelled run.
pub const CANCEL_HIDE_DELAY: Duration = Duration::from_secs(2);

/// Join the backend base URL and an API path.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
