use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::{
    percentage, CancelRequester, PendingTask, ProgressEvent, ProgressSurface, Scheduler, StreamHandle,
    StreamSink, StreamTransport,
};
use crate::config::{endpoint, BACKEND_URL, CANCEL_HIDE_DELAY, CANCEL_PATH, COMPLETE_HIDE_DELAY, PROGRESS_STREAM_PATH};
use crate::types::{AppResult, LogEntry, LogLevel};

const PREPARING_MESSAGE: &str = "Preparing to send emails...";
const COMPLETED_MESSAGE: &str = "All emails processed!";
const CANCELLING_MESSAGE: &str = "Cancelling email sending...";
const CANCELLED_MESSAGE: &str = "Email sending cancelled by user";
const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Please refresh if progress stops.";
const START_ABANDONED_MESSAGE: &str = "Failed to start email sending";

/// Endpoints and delays for one client instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub stream_url: String,
    pub cancel_url: String,
    pub complete_hide_delay: Duration,
    pub cancel_hide_delay: Duration,
}

impl ClientConfig {
    /// Default paths and delays against `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            stream_url: endpoint(base_url, PROGRESS_STREAM_PATH),
            cancel_url: endpoint(base_url, CANCEL_PATH),
            complete_hide_delay: COMPLETE_HIDE_DELAY,
            cancel_hide_delay: CANCEL_HIDE_DELAY,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(BACKEND_URL)
    }
}

/// Last values pushed to the surface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressView {
    pub sent: u32,
    pub total: u32,
    pub percent: u32,
    pub detail: String,
}

/// Point-in-time copy of the client state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSnapshot {
    pub is_running: bool,
    pub cancelled: bool,
    pub run_id: u64,
    pub visible: bool,
    pub stream_open: bool,
    /// The server has accepted the subscription.
    pub stream_ready: bool,
    /// A `start_then` callback is waiting for the subscription.
    pub ready_pending: bool,
    pub hide_pending: bool,
    pub view: ProgressView,
    pub log: Vec<LogEntry>,
}

#[derive(Default)]
struct ClientState {
    is_running: bool,
    cancelled: bool,
    /// Bumped by every `start`; callbacks carry the value they were made for.
    run_id: u64,
    visible: bool,
    stream: Option<Box<dyn StreamHandle>>,
    stream_ready: bool,
    on_ready: Option<Box<dyn FnOnce()>>,
    pending_hide: Option<Box<dyn PendingTask>>,
    view: ProgressView,
    log: Vec<LogEntry>,
}

struct Inner {
    config: ClientConfig,
    transport: Box<dyn StreamTransport>,
    canceller: Box<dyn CancelRequester>,
    scheduler: Box<dyn Scheduler>,
    surface: Box<dyn ProgressSurface>,
    state: RefCell<ClientState>,
}

/// Client for the server-sent progress stream of a bulk send job.
///
/// Cheap to clone; clones share state. Invariant: `is_running` holds
/// exactly while a stream handle is open, and at most one is ever open.
/// No `RefCell` borrow is held while calling into a collaborator.
#[derive(Clone)]
pub struct ProgressStreamClient {
    inner: Rc<Inner>,
}

impl ProgressStreamClient {
    pub fn new(
        config: ClientConfig,
        transport: impl StreamTransport + 'static,
        canceller: impl CancelRequester + 'static,
        scheduler: impl Scheduler + 'static,
        surface: impl ProgressSurface + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                transport: Box::new(transport),
                canceller: Box::new(canceller),
                scheduler: Box::new(scheduler),
                surface: Box::new(surface),
                state: RefCell::new(ClientState::default()),
            }),
        }
    }

    fn from_weak(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.borrow().is_running
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        let st = self.inner.state.borrow();
        ClientSnapshot {
            is_running: st.is_running,
            cancelled: st.cancelled,
            run_id: st.run_id,
            visible: st.visible,
            stream_open: st.stream.is_some(),
            stream_ready: st.stream_ready,
            ready_pending: st.on_ready.is_some(),
            hide_pending: st.pending_hide.is_some(),
            view: st.view.clone(),
            log: st.log.clone(),
        }
    }

    /// Begin tracking a run of `total` emails.
    ///
    /// Any previous subscription and pending hide are released first. Fails
    /// when the subscription cannot be opened; the client then stays idle
    /// with the error in its log.
    pub fn start(&self, total: u32) -> AppResult<()> {
        self.begin(total, None)
    }

    /// Like [`start`](Self::start), then run `on_ready` once the server has
    /// accepted the subscription.
    ///
    /// Events published before that moment are never delivered, so anything
    /// that makes the server emit (starting the job) belongs in `on_ready`.
    /// If the stream fails before opening, `on_ready` is dropped and the run
    /// ends as if cancelled.
    pub fn start_then(&self, total: u32, on_ready: impl FnOnce() + 'static) -> AppResult<()> {
        self.begin(total, Some(Box::new(on_ready)))
    }

    fn begin(&self, total: u32, on_ready: Option<Box<dyn FnOnce()>>) -> AppResult<()> {
        let (prior_stream, prior_hide, prior_ready, run_id) = {
            let mut st = self.inner.state.borrow_mut();
            st.run_id += 1;
            st.is_running = false;
            st.cancelled = false;
            st.stream_ready = false;
            st.visible = true;
            st.log.clear();
            (st.stream.take(), st.pending_hide.take(), st.on_ready.take(), st.run_id)
        };
        drop(prior_ready);
        if let Some(mut stream) = prior_stream {
            log::debug!("closing previous progress stream before restart");
            stream.close();
        }
        if let Some(mut task) = prior_hide {
            task.cancel();
        }

        let surface = &self.inner.surface;
        self.render_progress(0, total, PREPARING_MESSAGE);
        surface.clear_log();
        surface.set_visible(true);

        match self.inner.transport.open(&self.inner.config.stream_url, self.sink(run_id)) {
            Ok(handle) => {
                let mut st = self.inner.state.borrow_mut();
                st.stream = Some(handle);
                st.is_running = true;
                st.on_ready = on_ready;
                log::info!("📡 Progress stream opened (run {})", run_id);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to open progress stream: {}", e);
                self.log(format!("Could not connect to progress stream: {}", e), LogLevel::Error);
                Err(e)
            }
        }
    }

    /// The server accepted the subscription; release a waiting `start_then`.
    pub fn on_stream_open(&self) {
        let ready = {
            let mut st = self.inner.state.borrow_mut();
            st.stream_ready = true;
            st.on_ready.take()
        };
        if let Some(ready) = ready {
            log::debug!("Progress stream ready, running deferred start");
            ready();
        }
    }

    /// Handle one raw stream payload. Malformed payloads are dropped.
    pub fn on_message(&self, raw: &str) {
        match ProgressEvent::parse(raw) {
            Some(event) => self.apply(event),
            None => log::debug!("Dropping unrecognised progress payload: {}", raw),
        }
    }

    /// Dispatch a decoded event.
    pub fn apply(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Progress { sent, total, message } => {
                self.render_progress(sent, total, &message);
            }
            ProgressEvent::EmailSent { company } => {
                self.log(format!("✓ Email sent to {}", company), LogLevel::Success);
            }
            ProgressEvent::EmailFailed { company, error } => {
                self.log(format!("✗ Failed to send to {}: {}", company, error), LogLevel::Error);
            }
            ProgressEvent::Completed { sent, total, failed } => {
                self.finish_run();
                let rate = percentage(sent, total);
                self.render_progress(sent, total, COMPLETED_MESSAGE);
                self.log(
                    format!("Completed! {} sent, {} failed ({}% success rate)", sent, failed, rate),
                    LogLevel::Info,
                );
                self.schedule_hide(self.inner.config.complete_hide_delay);
            }
            ProgressEvent::Cancelled => {
                self.finish_run();
                self.log(CANCELLED_MESSAGE, LogLevel::Error);
                self.schedule_hide(self.inner.config.cancel_hide_delay);
            }
        }
    }

    /// The stream reported a transport failure. The run keeps going, unless
    /// a `start_then` was still waiting for the stream to open.
    pub fn on_transport_error(&self) {
        log::warn!("Progress stream error");
        self.log(CONNECTION_ERROR_MESSAGE, LogLevel::Error);

        let abandoned = {
            let mut st = self.inner.state.borrow_mut();
            if st.stream_ready {
                None
            } else {
                st.on_ready.take()
            }
        };
        if abandoned.is_some() {
            log::warn!("Progress stream failed before opening; deferred start dropped");
            self.finish_run();
            self.log(START_ABANDONED_MESSAGE, LogLevel::Error);
            self.schedule_hide(self.inner.config.cancel_hide_delay);
        }
    }

    /// Ask the server to stop. The stream's own `cancelled` event ends the run.
    pub fn cancel(&self) {
        {
            let mut st = self.inner.state.borrow_mut();
            if !st.is_running {
                return;
            }
            st.cancelled = true;
        }
        self.inner.canceller.request_cancel(&self.inner.config.cancel_url);
        self.log(CANCELLING_MESSAGE, LogLevel::Info);
    }

    /// Hide the surface and release the subscription. Idempotent.
    pub fn hide(&self) {
        let (stream, pending, ready) = {
            let mut st = self.inner.state.borrow_mut();
            st.is_running = false;
            st.cancelled = false;
            st.stream_ready = false;
            st.visible = false;
            (st.stream.take(), st.pending_hide.take(), st.on_ready.take())
        };
        drop(ready);
        self.inner.surface.set_visible(false);
        if let Some(mut stream) = stream {
            stream.close();
        }
        if let Some(mut task) = pending {
            task.cancel();
        }
    }

    /// Append a log line.
    pub fn log(&self, message: impl Into<String>, level: LogLevel) {
        let entry = LogEntry::now(level, message);
        self.inner.state.borrow_mut().log.push(entry.clone());
        self.inner.surface.append_log(&entry);
    }

    fn render_progress(&self, sent: u32, total: u32, message: &str) {
        let percent = percentage(sent, total);
        let detail = format!("{} ({}/{})", message, sent, total);

        self.inner.state.borrow_mut().view = ProgressView {
            sent,
            total,
            percent,
            detail: detail.clone(),
        };

        let surface = &self.inner.surface;
        surface.set_fill(percent);
        surface.set_percentage_label(&format!("{}%", percent));
        surface.set_detail(&detail);
    }

    /// Terminal event observed: stop running and close the stream.
    fn finish_run(&self) {
        let stream = {
            let mut st = self.inner.state.borrow_mut();
            st.is_running = false;
            st.cancelled = false;
            st.stream_ready = false;
            st.on_ready = None;
            st.stream.take()
        };
        if let Some(mut stream) = stream {
            stream.close();
        }
    }

    fn schedule_hide(&self, delay: Duration) {
        let run_id = self.inner.state.borrow().run_id;
        let weak = Rc::downgrade(&self.inner);
        let task = self.inner.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(client) = Self::from_weak(&weak) {
                    client.hide_if_current(run_id);
                }
            }),
        );

        let previous = self.inner.state.borrow_mut().pending_hide.replace(task);
        if let Some(mut previous) = previous {
            previous.cancel();
        }
    }

    fn hide_if_current(&self, run_id: u64) {
        if self.inner.state.borrow().run_id == run_id {
            self.hide();
        } else {
            log::debug!("Ignoring stale hide timer from run {}", run_id);
        }
    }

    /// A message or error belongs to the live subscription of `run_id`.
    fn is_live(&self, run_id: u64) -> bool {
        let st = self.inner.state.borrow();
        st.run_id == run_id && st.stream.is_some()
    }

    fn sink(&self, run_id: u64) -> StreamSink {
        let on_open = {
            let weak = Rc::downgrade(&self.inner);
            move || {
                if let Some(client) = Self::from_weak(&weak) {
                    if client.is_live(run_id) {
                        client.on_stream_open();
                    }
                }
            }
        };
        let on_message = {
            let weak = Rc::downgrade(&self.inner);
            move |raw: &str| {
                if let Some(client) = Self::from_weak(&weak) {
                    if client.is_live(run_id) {
                        client.on_message(raw);
                    }
                }
            }
        };
        let on_error = {
            let weak = Rc::downgrade(&self.inner);
            move || {
                if let Some(client) = Self::from_weak(&weak) {
                    if client.is_live(run_id) {
                        client.on_transport_error();
                    }
                }
            }
        };
        StreamSink::new(on_open, on_message, on_error)
    }
}
