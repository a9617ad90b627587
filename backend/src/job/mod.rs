//! Bulk send job runner.
//!
//! At most one job runs at a time. The job walks its recipients in order,
//! emitting [`ProgressEvent`]s on a broadcast channel that the SSE endpoint
//! relays to browsers. Cancellation is cooperative: the flag is checked
//! before each recipient.
//!
//! ```text
//! start() ──▶ progress(0/n) ─▶ email_sent | email_failed ─▶ … ─▶ completed
//!                                        │
//!                          cancel() ─────┴──────────────────────▶ cancelled
//! ```

pub mod events;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{JobError, JobResult};
use crate::mailer::{compose_application, Mailer};
use crate::models::{Recipient, SenderProfile};

pub use events::ProgressEvent;

/// Capacity of the progress channel; slow subscribers lag past this.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default pause between two emails
pub const DEFAULT_SEND_DELAY: Duration = Duration::from_secs(1);

/// Handle returned when a job is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    pub job_id: String,
    pub total: usize,
}

/// Snapshot of the active job slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub running: bool,
    pub job_id: Option<String>,
    pub started_at: Option<String>,
    pub total: Option<usize>,
    pub cancel_requested: bool,
}

#[derive(Debug, Clone)]
struct ActiveJob {
    id: Uuid,
    started_at: DateTime<Utc>,
    total: usize,
    cancel: Arc<AtomicBool>,
}

/// Owns the single active job and the progress channel.
pub struct JobManager {
    mailer: Arc<dyn Mailer>,
    sender: SenderProfile,
    events: broadcast::Sender<ProgressEvent>,
    active: Mutex<Option<ActiveJob>>,
    send_delay: Duration,
}

impl JobManager {
    pub fn new(mailer: Arc<dyn Mailer>, sender: SenderProfile) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            mailer,
            sender,
            events,
            active: Mutex::new(None),
            send_delay: DEFAULT_SEND_DELAY,
        }
    }

    /// Set the pause between two emails
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// Get a receiver for SSE streaming.
    ///
    /// Events are not replayed: a receiver only sees what is emitted after
    /// this call, so clients subscribe before starting a job.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<ActiveJob>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start sending to `recipients` in a background task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>, recipients: Vec<Recipient>) -> JobResult<JobTicket> {
        if recipients.is_empty() {
            return Err(JobError::NoRecipients);
        }

        let job = {
            let mut slot = self.slot();
            if let Some(running) = slot.as_ref() {
                return Err(JobError::AlreadyRunning(running.id.to_string()));
            }
            let job = ActiveJob {
                id: Uuid::new_v4(),
                started_at: Utc::now(),
                total: recipients.len(),
                cancel: Arc::new(AtomicBool::new(false)),
            };
            *slot = Some(job.clone());
            job
        };

        tracing::info!(job_id = %job.id, total = job.total, mailer = self.mailer.name(), "bulk send started");

        let ticket = JobTicket {
            job_id: job.id.to_string(),
            total: job.total,
        };
        let manager = Arc::clone(self);
        tokio::spawn(async move { manager.run(job, recipients).await });

        Ok(ticket)
    }

    /// Request cancellation of the active job.
    ///
    /// Returns `false` when no job is running.
    pub fn cancel(&self) -> bool {
        match self.slot().as_ref() {
            Some(job) => {
                job.cancel.store(true, Ordering::SeqCst);
                tracing::info!(job_id = %job.id, "cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn status(&self) -> JobStatus {
        match self.slot().as_ref() {
            Some(job) => JobStatus {
                running: true,
                job_id: Some(job.id.to_string()),
                started_at: Some(job.started_at.to_rfc3339()),
                total: Some(job.total),
                cancel_requested: job.cancel.load(Ordering::SeqCst),
            },
            None => JobStatus {
                running: false,
                job_id: None,
                started_at: None,
                total: None,
                cancel_requested: false,
            },
        }
    }

    fn emit(&self, event: ProgressEvent) {
        // No subscribers is fine: nobody is watching.
        let _ = self.events.send(event);
    }

    /// Release the slot if it still belongs to `id`.
    fn finish(&self, id: Uuid) {
        let mut slot = self.slot();
        if slot.as_ref().is_some_and(|job| job.id == id) {
            *slot = None;
        }
    }

    async fn run(self: Arc<Self>, job: ActiveJob, recipients: Vec<Recipient>) {
        let total = recipients.len() as u32;
        let mut succeeded = 0u32;
        let mut failed = 0u32;

        for (index, recipient) in recipients.iter().enumerate() {
            if job.cancel.load(Ordering::SeqCst) {
                tracing::info!(job_id = %job.id, processed = index, "bulk send cancelled");
                self.finish(job.id);
                self.emit(ProgressEvent::Cancelled);
                return;
            }

            self.emit(ProgressEvent::progress(
                index as u32,
                total,
                format!("Sending to {}", recipient.company),
            ));

            let email = compose_application(&self.sender, recipient);
            match self.mailer.send(&email).await {
                Ok(()) => {
                    succeeded += 1;
                    self.emit(ProgressEvent::email_sent(&recipient.company));
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(job_id = %job.id, company = %recipient.company, error = %e, "email failed");
                    self.emit(ProgressEvent::email_failed(&recipient.company, e.to_string()));
                }
            }

            if index + 1 < recipients.len() && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
        }

        tracing::info!(job_id = %job.id, succeeded, failed, "bulk send completed");
        self.finish(job.id);
        self.emit(ProgressEvent::progress(total, total, "All emails processed!"));
        self.emit(ProgressEvent::Completed { sent: succeeded, total, failed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MailError, MailResult};
    use crate::mailer::OutgoingEmail;
    use futures::future::BoxFuture;

    /// Fails every address on the `fail.test` domain.
    struct FakeMailer {
        sent: Mutex<Vec<String>>,
    }

    impl FakeMailer {
        fn new() -> Arc<Self> {
            Arc::new(Self { sent: Mutex::new(Vec::new()) })
        }
    }

    impl Mailer for FakeMailer {
        fn send<'a>(&'a self, email: &'a OutgoingEmail) -> BoxFuture<'a, MailResult<()>> {
            Box::pin(async move {
                if email.to.ends_with("@fail.test") {
                    return Err(MailError::Rejected { status: 550, body: "mailbox unavailable".into() });
                }
                self.sent.lock().unwrap().push(email.to.clone());
                Ok(())
            })
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn recipients() -> Vec<Recipient> {
        vec![
            Recipient::new("1", "Acme", "jobs@acme.test"),
            Recipient::new("2", "Globex", "hr@fail.test"),
            Recipient::new("3", "Initech", "careers@initech.test"),
        ]
    }

    async fn collect_until_terminal(rx: &mut broadcast::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        loop {
            let event = rx.recv().await.unwrap();
            let done = event.is_terminal();
            events.push(event);
            if done {
                return events;
            }
        }
    }

    #[tokio::test]
    async fn test_full_run_event_sequence() {
        let mailer = FakeMailer::new();
        let manager = Arc::new(
            JobManager::new(mailer.clone(), SenderProfile::default()).with_send_delay(Duration::ZERO),
        );
        let mut rx = manager.subscribe();

        let ticket = manager.start(recipients()).unwrap();
        assert_eq!(ticket.total, 3);

        let events = collect_until_terminal(&mut rx).await;
        assert_eq!(
            events,
            vec![
                ProgressEvent::progress(0, 3, "Sending to Acme"),
                ProgressEvent::email_sent("Acme"),
                ProgressEvent::progress(1, 3, "Sending to Globex"),
                ProgressEvent::email_failed("Globex", "Relay rejected message (550): mailbox unavailable"),
                ProgressEvent::progress(2, 3, "Sending to Initech"),
                ProgressEvent::email_sent("Initech"),
                ProgressEvent::progress(3, 3, "All emails processed!"),
                ProgressEvent::Completed { sent: 2, total: 3, failed: 1 },
            ]
        );
        assert_eq!(
            *mailer.sent.lock().unwrap(),
            vec!["jobs@acme.test".to_string(), "careers@initech.test".to_string()]
        );
        assert!(!manager.status().running);
    }

    #[tokio::test]
    async fn test_events_are_not_replayed() {
        let manager = Arc::new(
            JobManager::new(FakeMailer::new(), SenderProfile::default()).with_send_delay(Duration::ZERO),
        );
        let mut early = manager.subscribe();
        manager.start(vec![Recipient::new("1", "Acme", "jobs@acme.test")]).unwrap();

        let events = collect_until_terminal(&mut early).await;
        assert_eq!(events.last(), Some(&ProgressEvent::Completed { sent: 1, total: 1, failed: 0 }));

        let mut late = manager.subscribe();
        assert!(matches!(late.try_recv(), Err(broadcast::error::TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_empty_selection_rejected() {
        let manager = Arc::new(JobManager::new(FakeMailer::new(), SenderProfile::default()));
        assert!(matches!(manager.start(Vec::new()), Err(JobError::NoRecipients)));
        assert!(!manager.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_between_emails() {
        let manager = Arc::new(
            JobManager::new(FakeMailer::new(), SenderProfile::default())
                .with_send_delay(Duration::from_secs(60)),
        );
        let mut rx = manager.subscribe();
        manager.start(recipients()).unwrap();

        assert_eq!(rx.recv().await.unwrap(), ProgressEvent::progress(0, 3, "Sending to Acme"));
        assert_eq!(rx.recv().await.unwrap(), ProgressEvent::email_sent("Acme"));

        assert!(manager.cancel());
        assert!(manager.status().cancel_requested);
        assert_eq!(rx.recv().await.unwrap(), ProgressEvent::Cancelled);
        assert!(!manager.status().running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_active_job() {
        let manager = Arc::new(
            JobManager::new(FakeMailer::new(), SenderProfile::default())
                .with_send_delay(Duration::from_secs(60)),
        );
        let mut rx = manager.subscribe();

        let first = manager.start(recipients()).unwrap();
        match manager.start(recipients()) {
            Err(JobError::AlreadyRunning(id)) => assert_eq!(id, first.job_id),
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }
        let status = manager.status();
        assert!(status.running);
        assert_eq!(status.job_id.as_deref(), Some(first.job_id.as_str()));

        manager.cancel();
        let events = collect_until_terminal(&mut rx).await;
        assert_eq!(events.last(), Some(&ProgressEvent::Cancelled));

        // The slot is free as soon as the terminal event is observable.
        assert!(manager.start(recipients()).is_ok());
    }
}
