#![forbid(unsafe_code)]

//! Cooperative stop flag for the render loop.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

type Shared = Arc<(Mutex<bool>, Condvar)>;

fn flag(inner: &Shared) -> MutexGuard<'_, bool> {
    inner.0.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observer side of the stop flag.
///
/// The loop checks it between frames and sleeps on it for frame pacing, so a
/// stop request cuts the sleep short but never a frame in progress.
#[derive(Debug, Clone)]
pub struct StopSignal {
    inner: Shared,
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    pub fn new() -> (Self, StopTrigger) {
        let inner: Shared = Arc::new((Mutex::new(false), Condvar::new()));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            StopTrigger { inner },
        )
    }

    pub fn is_stopped(&self) -> bool {
        *flag(&self.inner)
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if the full duration elapsed.
    /// Spurious wakeups resume the wait for the time left.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (_, cvar) = &*self.inner;
        let mut stopped = flag(&self.inner);
        let deadline = Instant::now() + duration;
        loop {
            if *stopped {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let (guard, result) = cvar
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            stopped = guard;
            if result.timed_out() {
                return *stopped;
            }
        }
    }
}

/// Requesting side of the stop flag. Cloned into input and signal threads.
#[derive(Debug, Clone)]
pub struct StopTrigger {
    inner: Shared,
}

impl StopTrigger {
    /// Request a stop; wakes a pacing sleep immediately. Idempotent.
    pub fn stop(&self) {
        let mut stopped = flag(&self.inner);
        *stopped = true;
        self.inner.1.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *flag(&self.inner)
    }
}
