//! Cooperative shutdown coordination.
//! Provides a cancellation token shared by the interrupt path (writer) and the worker (reader).
//!
//! Notes:
//! - The flag is one-way: once triggered it never clears for the lifetime of the token.
//! - `trigger()` is what the Ctrl-C path calls; it never panics and repeated calls are no-ops.
//! - `wait()` doubles as the worker's sleep so shutdown latency is bounded by a single wait.
//!
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    triggered: AtomicBool,
    lock: Mutex<()>,
    cond: Condvar,
}

/// Shared, cloneable cancellation signal with a blocking wait-with-timeout.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative shutdown (idempotent).
    pub fn trigger(&self) {
        if self.inner.triggered.swap(true, Ordering::AcqRel) {
            return;
        }
        // Taking the lock orders the store against a waiter that has checked the
        // flag but not yet parked on the condvar, so the notify cannot be lost.
        drop(self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner));
        self.inner.cond.notify_all();
    }

    /// Check whether a shutdown has been requested.
    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::Acquire)
    }

    /// Block until the token is triggered or `timeout` elapses.
    ///
    /// Returns `true` if cancellation was observed. Returns immediately when the
    /// token is already triggered or `timeout` is zero.
    pub fn wait(&self, timeout: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        if timeout.is_zero() {
            return false;
        }
        let guard = self.inner.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (_guard, _res) = self
            .inner
            .cond
            .wait_timeout_while(guard, timeout, |_| !self.is_triggered())
            .unwrap_or_else(PoisonError::into_inner);
        self.is_triggered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn starts_untriggered() {
        let token = CancellationToken::new();
        assert!(!token.is_triggered());
    }

    #[test]
    fn trigger_is_idempotent_and_monotone() {
        let token = CancellationToken::new();
        token.trigger();
        assert!(token.is_triggered());
        token.trigger();
        token.trigger();
        assert!(token.is_triggered());
    }

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        other.trigger();
        assert!(token.is_triggered());
    }

    #[test]
    fn zero_timeout_does_not_block() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(!token.wait(Duration::ZERO));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn wait_returns_immediately_when_already_triggered() {
        let token = CancellationToken::new();
        token.trigger();
        let start = Instant::now();
        assert!(token.wait(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn wait_times_out_without_trigger() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert!(!token.wait(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn in_flight_wait_wakes_on_trigger() {
        let token = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let seen = token.wait(Duration::from_secs(30));
                (seen, start.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(50));
        token.trigger();
        let (seen, elapsed) = waiter.join().unwrap();
        assert!(seen);
        assert!(elapsed < Duration::from_secs(5), "waited {elapsed:?}");
    }
}
