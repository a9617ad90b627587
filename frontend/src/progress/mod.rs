//! Live progress tracking for a bulk send job.
//!
//! [`ProgressStreamClient`] subscribes to the server's progress stream,
//! turns [`ProgressEvent`]s into bar/label/detail updates and log lines, and
//! hides the surface a little while after the run ends.
//!
//! The client never touches the browser directly. Everything it talks to
//! is injected:
//!
//! | Seam                  | Browser implementation                        |
//! |-----------------------|-----------------------------------------------|
//! | [`StreamTransport`]   | `services::EventSourceTransport`              |
//! | [`CancelRequester`]   | `services::HttpCancelRequester`               |
//! | [`Scheduler`]         | `services::TimeoutScheduler`                  |
//! | [`ProgressSurface`]   | `components::SignalSurface`                   |
//!
//! All callbacks run on the single browser thread.

mod client;
mod events;

use std::rc::Rc;
use std::time::Duration;

use crate::types::{AppResult, LogEntry};

pub use client::{ClientConfig, ClientSnapshot, ProgressStreamClient, ProgressView};
pub use events::ProgressEvent;

#[cfg(test)]
pub(crate) use client::testing;

/// Percentage of `sent` over `total`, rounded half up.
///
/// Returns 0 when `total` is 0 and never exceeds 100.
pub fn percentage(sent: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let sent = u64::from(sent.min(total));
    let total = u64::from(total);
    ((200 * sent + total) / (2 * total)) as u32
}

/// Receiver side of one stream subscription.
///
/// Handed to [`StreamTransport::open`]; the transport calls it once the
/// server has accepted the subscription, then for every message and
/// transport error. Calls must happen from the event loop, never
/// synchronously inside `open`.
#[derive(Clone)]
pub struct StreamSink {
    on_open: Rc<dyn Fn()>,
    on_message: Rc<dyn Fn(&str)>,
    on_error: Rc<dyn Fn()>,
}

impl StreamSink {
    pub fn new(
        on_open: impl Fn() + 'static,
        on_message: impl Fn(&str) + 'static,
        on_error: impl Fn() + 'static,
    ) -> Self {
        Self {
            on_open: Rc::new(on_open),
            on_message: Rc::new(on_message),
            on_error: Rc::new(on_error),
        }
    }

    /// The subscription is live; events published from now on arrive.
    pub fn opened(&self) {
        (self.on_open)()
    }

    pub fn message(&self, raw: &str) {
        (self.on_message)(raw)
    }

    pub fn error(&self) {
        (self.on_error)()
    }
}

/// An open subscription. Exclusively owned by the client.
pub trait StreamHandle {
    /// Close the subscription. Must be idempotent.
    fn close(&mut self);
}

/// Opens one-way event subscriptions.
pub trait StreamTransport {
    fn open(&self, url: &str, sink: StreamSink) -> AppResult<Box<dyn StreamHandle>>;
}

/// Fire-and-forget cancellation request.
pub trait CancelRequester {
    /// Send `{"cancel": true}` to `url`. Failures are only logged.
    fn request_cancel(&self, url: &str);
}

/// A deferred callback that has not fired yet.
pub trait PendingTask {
    /// Prevent the callback from running. Idempotent.
    fn cancel(&mut self);
}

/// Runs callbacks after a delay.
pub trait Scheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Box<dyn PendingTask>;
}

/// The rendered regions the client writes to.
pub trait ProgressSurface {
    /// Overlay and container visibility.
    fn set_visible(&self, visible: bool);
    /// Fill-bar width in percent.
    fn set_fill(&self, percent: u32);
    fn set_percentage_label(&self, text: &str);
    fn set_detail(&self, text: &str);
    fn clear_log(&self);
    fn append_log(&self, entry: &LogEntry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(3, 10), 30);
        assert_eq!(percentage(8, 10), 80);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5 rounds up
        assert_eq!(percentage(1, 200), 1); // 0.5 rounds up
        assert_eq!(percentage(0, 7), 0);
        assert_eq!(percentage(7, 7), 100);
    }

    #[test]
    fn test_percentage_edges() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(5, 0), 0);
        assert_eq!(percentage(12, 10), 100);
        assert_eq!(percentage(u32::MAX, u32::MAX), 100);
        assert_eq!(percentage(u32::MAX - 1, u32::MAX), 100);
    }

    #[test]
    fn test_percentage_always_in_range() {
        for total in 1..=60u32 {
            for sent in 0..=total {
                let p = percentage(sent, total);
                assert!(p <= 100);
                let exact = 100.0 * sent as f64 / total as f64;
                assert!((p as f64 - exact).abs() <= 0.5, "{sent}/{total} -> {p}");
            }
        }
    }
}
