//! HTTP calls to the Sendtrack backend.

use gloo_net::http::Request;
use wasm_bindgen_futures::spawn_local;

use crate::config::{endpoint, BULK_EMAIL_PATH, RECIPIENTS_PATH};
use crate::progress::CancelRequester;
use crate::types::{AppError, AppResult, BulkEmailRequest, CancelRequest, JobStartResponse, Recipient};

/// Fetch the recipients offered by the picker.
pub async fn fetch_recipients(backend_url: &str) -> AppResult<Vec<Recipient>> {
    let url = endpoint(backend_url, RECIPIENTS_PATH);
    let response = Request::get(&url)
        .send()
        .await
        .map_err(|e| AppError::Network(format!("HTTP request failed: {}", e)))?;

    if !response.ok() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::Network(format!(
            "Server error ({}): {}",
            response.status(),
            error_text
        )));
    }

    response
        .json::<Vec<Recipient>>()
        .await
        .map_err(|e| AppError::Network(format!("Failed to parse response: {}", e)))
}

/// Ask the backend to start a job for `selected`.
///
/// Rejections (400/409) still carry a JSON body, which is returned as-is so
/// the caller can tell "refused" from "unreachable".
pub async fn post_bulk_job(backend_url: &str, selected: Vec<String>) -> AppResult<JobStartResponse> {
    let url = endpoint(backend_url, BULK_EMAIL_PATH);
    let request = Request::post(&url)
        .json(&BulkEmailRequest { selected })
        .map_err(|e| AppError::Network(format!("Failed to build request: {}", e)))?;

    let response = request
        .send()
        .await
        .map_err(|e| AppError::Network(format!("HTTP request failed: {}", e)))?;

    let status = response.status();
    match response.json::<JobStartResponse>().await {
        Ok(body) => Ok(body),
        Err(_) if !response.ok() => Err(AppError::Network(format!("Server error ({})", status))),
        Err(e) => Err(AppError::Network(format!("Failed to parse response: {}", e))),
    }
}

async fn post_cancel(url: &str) -> AppResult<()> {
    let response = Request::post(url)
        .json(&CancelRequest { cancel: true })
        .map_err(|e| AppError::Network(format!("Failed to build request: {}", e)))?
        .send()
        .await
        .map_err(|e| AppError::Network(format!("HTTP request failed: {}", e)))?;

    if !response.ok() {
        return Err(AppError::Network(format!("Server error ({})", response.status())));
    }
    Ok(())
}

/// Fire-and-forget cancellation over `fetch`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpCancelRequester;

impl CancelRequester for HttpCancelRequester {
    fn request_cancel(&self, url: &str) {
        let url = url.to_string();
        spawn_local(async move {
            if let Err(e) = post_cancel(&url).await {
                log::warn!("Cancel request failed: {}", e);
            }
        });
    }
}
