//! REST API types for frontend integration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::job::JobTicket;

/// Body of `POST /api/bulk-email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkEmailRequest {
    /// Recipient ids picked in the UI
    #[serde(default)]
    pub selected: Vec<String>,
}

/// Response to a job start request.
///
/// `status` is `"started"` on success, `"error"` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStartResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<JobTicket> for JobStartResponse {
    fn from(ticket: JobTicket) -> Self {
        Self {
            status: "started".to_string(),
            job_id: Some(ticket.job_id),
            total: Some(ticket.total),
            error: None,
        }
    }
}

/// Body of `POST /api/cancel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub cancel: bool,
}

/// Response to a cancel request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResponse {
    /// Whether a running job was flagged
    pub cancelled: bool,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}
