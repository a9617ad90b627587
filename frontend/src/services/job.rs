//! Starting a bulk send job and wiring it to the progress client.

use wasm_bindgen_futures::spawn_local;

use crate::progress::ProgressStreamClient;
use crate::services::api::post_bulk_job;
use crate::types::{AppError, AppResult, JobStartResponse, LogLevel};

pub const EMPTY_SELECTION_WARNING: &str = "Please select at least one company to send emails to.";

/// Reject an empty selection before anything is sent.
pub fn validate_selection(selected: &[String]) -> AppResult<()> {
    if selected.is_empty() {
        return Err(AppError::Validation(EMPTY_SELECTION_WARNING.to_string()));
    }
    Ok(())
}

/// Reflect the job endpoint's answer in the progress log.
pub fn apply_job_response(client: &ProgressStreamClient, result: AppResult<JobStartResponse>) {
    match result {
        Ok(response) if response.is_started() => {
            log::info!(
                "Job {} started for {} recipients",
                response.job_id.as_deref().unwrap_or("?"),
                response.total.unwrap_or_default()
            );
            client.log("Email sending process started", LogLevel::Info);
        }
        Ok(response) => {
            log::warn!(
                "Job refused: {}",
                response.error.as_deref().unwrap_or(&response.status)
            );
            client.log("Failed to start email sending", LogLevel::Error);
            client.hide();
        }
        Err(e) => {
            log::error!("Job request failed: {}", e);
            client.log(format!("Error: {}", e), LogLevel::Error);
            client.hide();
        }
    }
}

/// Validate, open the progress stream, and hand the selection to `post`
/// once the server has accepted the subscription.
///
/// Nothing is posted when the stream cannot be opened; the surface is
/// hidden and the error returned.
pub fn begin_bulk_job(
    client: &ProgressStreamClient,
    selected: Vec<String>,
    post: impl FnOnce(Vec<String>) + 'static,
) -> AppResult<()> {
    validate_selection(&selected)?;

    let total = u32::try_from(selected.len()).unwrap_or(u32::MAX);
    if let Err(e) = client.start_then(total, move || post(selected)) {
        client.hide();
        return Err(e);
    }
    Ok(())
}

/// Start a bulk send job against `backend_url`, tracked by `client`.
pub fn submit_bulk_job(
    client: &ProgressStreamClient,
    backend_url: String,
    selected: Vec<String>,
) -> AppResult<()> {
    let poster = client.clone();
    begin_bulk_job(client, selected, move |selected| {
        spawn_local(async move {
            let result = post_bulk_job(&backend_url, selected).await;
            apply_job_response(&poster, result);
        });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::testing::harness;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn response(json: &str) -> JobStartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_validate_selection() {
        assert_eq!(
            validate_selection(&[]),
            Err(AppError::Validation(EMPTY_SELECTION_WARNING.to_string()))
        );
        assert!(validate_selection(&["1".to_string()]).is_ok());
    }

    #[test]
    fn test_started_keeps_run_alive() {
        let h = harness();
        h.client.start(3).unwrap();
        apply_job_response(&h.client, Ok(response(r#"{"status":"started","jobId":"j","total":3}"#)));

        assert_eq!(h.surface.messages(), vec!["Email sending process started"]);
        assert!(h.client.is_running());
        assert!(h.surface.visible.get());
    }

    #[test]
    fn test_refused_job_hides_surface() {
        let h = harness();
        h.client.start(3).unwrap();
        apply_job_response(
            &h.client,
            Ok(response(r#"{"status":"error","error":"A job is already running"}"#)),
        );

        assert_eq!(h.surface.messages(), vec!["Failed to start email sending"]);
        let snap = h.client.snapshot();
        assert!(!snap.is_running);
        assert!(!snap.stream_open);
        assert!(!h.surface.visible.get());
    }

    #[test]
    fn test_network_error_hides_surface() {
        let h = harness();
        h.client.start(2).unwrap();
        apply_job_response(&h.client, Err(AppError::Network("HTTP request failed: offline".into())));

        assert_eq!(h.surface.messages(), vec!["Error: HTTP request failed: offline"]);
        assert!(!h.client.is_running());
        assert_eq!(h.transport.open_count(), 0);
    }

    /// Collects what would have been posted.
    fn recording_post() -> (Rc<RefCell<Vec<Vec<String>>>>, impl FnOnce(Vec<String>) + 'static) {
        let posted = Rc::new(RefCell::new(Vec::new()));
        let sink = posted.clone();
        (posted, move |ids: Vec<String>| sink.borrow_mut().push(ids))
    }

    #[test]
    fn test_empty_selection_opens_nothing() {
        let h = harness();
        let (posted, post) = recording_post();

        let err = begin_bulk_job(&h.client, Vec::new(), post).unwrap_err();
        assert_eq!(err, AppError::Validation(EMPTY_SELECTION_WARNING.to_string()));
        assert_eq!(h.transport.opened.borrow().len(), 0);
        assert!(posted.borrow().is_empty());
        assert!(!h.surface.visible.get());
    }

    #[test]
    fn test_job_posted_only_after_stream_opens() {
        let h = harness();
        let (posted, post) = recording_post();

        begin_bulk_job(&h.client, vec!["1".into(), "2".into()], post).unwrap();
        assert!(h.client.is_running());
        assert!(posted.borrow().is_empty());

        h.transport.accept();
        assert_eq!(*posted.borrow(), vec![vec!["1".to_string(), "2".to_string()]]);

        // A fast job: every event arrives after the subscription is live.
        apply_job_response(&h.client, Ok(response(r#"{"status":"started","jobId":"j","total":2}"#)));
        h.transport.push(r#"{"type":"email_sent","company":"Acme"}"#);
        h.transport.push(r#"{"type":"email_sent","company":"Globex"}"#);
        h.transport.push(r#"{"type":"completed","sent":2,"total":2,"failed":0}"#);
        assert!(!h.client.is_running());
        assert!(h.client.snapshot().hide_pending);
    }

    #[test]
    fn test_refused_stream_skips_post_and_hides() {
        let h = harness();
        h.transport.refuse.set(true);
        let (posted, post) = recording_post();

        let err = begin_bulk_job(&h.client, vec!["1".into(), "2".into(), "3".into()], post).unwrap_err();
        assert_eq!(err, AppError::Stream("refused".into()));
        assert!(posted.borrow().is_empty());

        let snap = h.client.snapshot();
        assert!(!snap.visible);
        assert!(!snap.is_running);
        assert!(!snap.ready_pending);
        assert!(!h.surface.visible.get());

        h.client.cancel();
        assert!(h.canceller.requests.borrow().is_empty());
    }

    #[test]
    fn test_stream_error_before_open_skips_post() {
        let h = harness();
        let (posted, post) = recording_post();

        begin_bulk_job(&h.client, vec!["1".into()], post).unwrap();
        h.transport.fail();
        h.transport.accept_on(0);

        assert!(posted.borrow().is_empty());
        assert!(!h.client.is_running());
        h.scheduler.advance(Duration::from_secs(2));
        assert!(!h.surface.visible.get());
    }
}
