//! Cancellable scheduled task used to debounce search input.
//!
//! Each collection owns one [`Debouncer`]. Scheduling replaces any timer that
//! has not fired yet. Once a timer fires, its task is detached and runs to
//! completion; later keystrokes can no longer cancel it, so stale results must
//! be rejected where they are applied.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Timer handle tagged with the schedule call that created it.
type PendingTimer = Option<(u64, JoinHandle<()>)>;

pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<PendingTimer>>,
    scheduled: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(None)),
            scheduled: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the timer; `task` runs once the delay elapses without another
    /// call to `schedule` or `cancel`.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if let Some((_, handle)) = pending.take() {
            handle.abort();
        }

        let ticket = self.scheduled.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = self.delay;
        let slot = Arc::clone(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Fired: from here on the task is no longer cancellable.
            {
                let mut slot = slot.lock();
                if slot.as_ref().is_some_and(|(t, _)| *t == ticket) {
                    slot.take();
                }
            }
            tokio::spawn(task);
        });
        *pending = Some((ticket, handle));
    }

    /// Drop the pending timer, if any. Tasks that already fired keep running.
    ///
    /// On a multi-thread runtime a timer that has just woken can still spawn
    /// its task while `cancel` runs: nothing between the wake-up and the
    /// spawn is an await point, so `abort` cannot land there. Callers reject
    /// such late tasks through their own staleness checks.
    pub fn cancel(&self) {
        if let Some((_, handle)) = self.pending.lock().take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
