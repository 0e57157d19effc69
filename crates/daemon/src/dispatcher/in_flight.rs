//! A waitgroup for in-flight handler tasks: shutdown awaits it reaching
//! zero before the process exits, satisfying invariant I8.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Default)]
pub struct InFlight {
    count: AtomicUsize,
    notify: Notify,
}

impl InFlight {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers one in-flight handler. The returned guard decrements the
    /// count on drop, covering both normal return and task cancellation.
    pub fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard { inflight: Arc::clone(self) }
    }

    pub fn current(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Resolves once the count reaches zero. Enables the notification
    /// future before checking the count — `Notify::notified()` only
    /// registers as a waiter once polled, so the check has to happen after
    /// `enable()`, not just after the future is constructed, or a
    /// concurrent decrement-to-zero between construction and `.await` is
    /// missed and this waits forever.
    pub async fn wait_for_zero(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

pub struct InFlightGuard {
    inflight: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.inflight.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inflight.notify.notify_waiters();
        }
    }
}

#[cfg(test)]
#[path = "in_flight_tests.rs"]
mod tests;
