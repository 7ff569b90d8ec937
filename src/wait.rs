//! Interruptible timed pause.
//!
//! A wait runs in two phases: a fixed grace period that nothing can shorten,
//! then an interruptible tail that ends on `cancel()` or when the optional
//! safety ceiling runs out. Cancellation is signalled through a condvar, so the
//! waiting thread sleeps instead of polling.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

/// Lock ignoring poison: a panicked canceller must not wedge the waiter
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Default)]
struct Signal {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

/// Cancellation token for one in-flight wait (cheap to clone, thread-safe)
#[derive(Debug, Clone, Default)]
pub struct WaitHandle {
    signal: Arc<Signal>,
}

impl WaitHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request early completion. Idempotent and non-blocking beyond a short lock.
    pub fn cancel(&self) {
        let mut cancelled = lock(&self.signal.cancelled);
        if !*cancelled {
            *cancelled = true;
            self.signal.cond.notify_all();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *lock(&self.signal.cancelled)
    }

    /// True if both handles refer to the same wait
    pub fn same_wait(&self, other: &WaitHandle) -> bool {
        Arc::ptr_eq(&self.signal, &other.signal)
    }
}

/// How a wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Ended by `cancel()` after the grace period
    Cancelled,
    /// Ended by the safety ceiling
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
pub struct WaitReport {
    pub outcome: WaitOutcome,
    pub elapsed: Duration,
}

/// A wait that has begun but not yet been awaited
#[derive(Debug)]
pub struct PendingWait {
    handle: WaitHandle,
    grace: Duration,
    ceiling: Option<Duration>,
    started: Instant,
}

/// Start a wait with an uninterruptible `grace` period and an optional
/// `ceiling` on the interruptible tail (`None` waits for `cancel()` forever).
pub fn begin_wait(grace: Duration, ceiling: Option<Duration>) -> PendingWait {
    PendingWait {
        handle: WaitHandle::new(),
        grace,
        ceiling,
        started: Instant::now(),
    }
}

impl PendingWait {
    pub fn handle(&self) -> WaitHandle {
        self.handle.clone()
    }

    /// Block until the wait completes
    pub fn wait(self) -> WaitReport {
        self.wait_with(|_| {})
    }

    /// Block until the wait completes, calling `on_interruptible` once the
    /// grace period is over and before the interruptible tail starts.
    pub fn wait_with<F>(self, on_interruptible: F) -> WaitReport
    where
        F: FnOnce(&WaitHandle),
    {
        let remaining = self.grace.saturating_sub(self.started.elapsed());
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }

        on_interruptible(&self.handle);

        let guard = lock(&self.handle.signal.cancelled);
        let cond = &self.handle.signal.cond;
        let outcome = match self.ceiling {
            Some(ceiling) => {
                let (guard, _) = cond
                    .wait_timeout_while(guard, ceiling, |cancelled| !*cancelled)
                    .unwrap_or_else(|e| e.into_inner());
                if *guard {
                    WaitOutcome::Cancelled
                } else {
                    WaitOutcome::TimedOut
                }
            }
            None => {
                let _guard = cond
                    .wait_while(guard, |cancelled| !*cancelled)
                    .unwrap_or_else(|e| e.into_inner());
                WaitOutcome::Cancelled
            }
        };

        WaitReport {
            outcome,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Slot holding the sequencer's current interruptible wait, if any.
///
/// Shared between the sequencing thread (arms/disarms) and the beat thread
/// (cancels). Cancelling an empty slot is a no-op.
#[derive(Debug, Clone, Default)]
pub struct ActiveWait {
    current: Arc<Mutex<Option<WaitHandle>>>,
}

impl ActiveWait {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `handle` as the current wait, replacing any stale one
    pub fn arm(&self, handle: WaitHandle) {
        *lock(&self.current) = Some(handle);
    }

    /// Clear the slot if it still holds `handle`
    pub fn disarm(&self, handle: &WaitHandle) {
        let mut current = lock(&self.current);
        if current.as_ref().is_some_and(|h| h.same_wait(handle)) {
            *current = None;
        }
    }

    /// Cancel the current wait. Returns false when nothing was armed.
    pub fn cancel(&self) -> bool {
        match lock(&self.current).as_ref() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.current).is_some()
    }
}
