//! Delayed callbacks on `setTimeout`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use gloo_timers::callback::Timeout;

use crate::progress::{PendingTask, Scheduler};

#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutScheduler;

/// What a pending task can do with its browser timer.
trait TimerHandle {
    /// Stop the timer before it fires.
    fn clear(self);
    /// Give up ownership without dropping the JS closure.
    fn leak(self);
}

impl TimerHandle for Timeout {
    fn clear(self) {
        // Dropping a `Timeout` calls `clearTimeout`.
        drop(self);
    }

    fn leak(self) {
        let _ = self.forget();
    }
}

/// A scheduled callback. Cancelling before it fires clears the browser
/// timer. Once fired, cancellation may come from inside the callback
/// itself (a hide cancels its own pending task), so the closure is leaked
/// rather than dropped mid-call.
struct TimeoutTask<H: TimerHandle = Timeout> {
    handle: Option<H>,
    fired: Rc<Cell<bool>>,
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Box<dyn PendingTask> {
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);

        let timeout = Timeout::new(millis, move || {
            if !flag.get() {
                flag.set(true);
                callback();
            }
        });

        Box::new(TimeoutTask {
            handle: Some(timeout),
            fired,
        })
    }
}

impl<H: TimerHandle> PendingTask for TimeoutTask<H> {
    fn cancel(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if self.fired.replace(true) {
            handle.leak();
        } else {
            handle.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Released {
        Cleared,
        Leaked,
    }

    struct FakeTimer(Rc<Cell<Option<Released>>>);

    impl TimerHandle for FakeTimer {
        fn clear(self) {
            self.0.set(Some(Released::Cleared));
        }

        fn leak(self) {
            self.0.set(Some(Released::Leaked));
        }
    }

    fn task(fired: bool) -> (TimeoutTask<FakeTimer>, Rc<Cell<Option<Released>>>) {
        let released = Rc::new(Cell::new(None));
        let task = TimeoutTask {
            handle: Some(FakeTimer(released.clone())),
            fired: Rc::new(Cell::new(fired)),
        };
        (task, released)
    }

    #[test]
    fn test_cancel_before_firing_clears_timer() {
        let (mut task, released) = task(false);
        task.cancel();

        assert_eq!(released.get(), Some(Released::Cleared));
        assert!(task.fired.get(), "callback guard must be closed");
    }

    #[test]
    fn test_cancel_after_firing_leaks_closure() {
        let (mut task, released) = task(true);
        task.cancel();
        assert_eq!(released.get(), Some(Released::Leaked));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let (mut task, released) = task(false);
        task.cancel();
        released.set(None);
        task.cancel();
        assert_eq!(released.get(), None);
    }
}
