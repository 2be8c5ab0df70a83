#![forbid(unsafe_code)]

//! Stop signals for background threads.
//!
//! A [`StopSignal`] is the waiting side, a [`StopTrigger`] the firing side.
//! Timers and the playback timeline sleep with [`StopSignal::wait_timeout`],
//! so a shutdown wakes them immediately instead of after the full duration.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

type Shared = Arc<(Mutex<bool>, Condvar)>;

/// Signal that a background thread should stop.
#[derive(Debug, Clone)]
pub struct StopSignal {
    inner: Shared,
}

impl StopSignal {
    /// Create a new (signal, trigger) pair.
    #[must_use]
    pub fn new() -> (Self, StopTrigger) {
        let inner: Shared = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: Arc::clone(&inner),
        };
        (signal, StopTrigger { inner })
    }

    /// Check if the stop signal has been triggered.
    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out. Spurious wakeups are
    /// absorbed by re-waiting for the remaining time.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        if *stopped {
            return true;
        }

        let start = Instant::now();
        let mut remaining = duration;

        loop {
            let (guard, result) = cvar
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(|e| e.into_inner());
            stopped = guard;
            if *stopped {
                return true;
            }
            if result.timed_out() {
                return false;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }

    /// Block until stopped.
    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        while !*stopped {
            stopped = cvar.wait(stopped).unwrap_or_else(|e| e.into_inner());
        }
    }
}

/// Fires a [`StopSignal`].
#[derive(Debug, Clone)]
pub struct StopTrigger {
    inner: Shared,
}

impl StopTrigger {
    /// Signal every waiter to stop. Idempotent.
    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        cvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn stop_signal_starts_false() {
        let (signal, _trigger) = StopSignal::new();
        assert!(!signal.is_stopped());
    }

    #[test]
    fn stop_signal_becomes_true_after_trigger() {
        let (signal, trigger) = StopSignal::new();
        trigger.stop();
        trigger.stop();
        assert!(signal.is_stopped());
    }

    #[test]
    fn wait_returns_true_when_stopped() {
        let (signal, trigger) = StopSignal::new();
        trigger.stop();
        assert!(signal.wait_timeout(Duration::from_millis(100)));
    }

    #[test]
    fn wait_returns_false_on_timeout() {
        let (signal, _trigger) = StopSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn trigger_wakes_a_long_wait() {
        let (signal, trigger) = StopSignal::new();
        let waiter = thread::spawn(move || {
            let start = Instant::now();
            let stopped = signal.wait_timeout(Duration::from_secs(30));
            (stopped, start.elapsed())
        });
        thread::sleep(Duration::from_millis(20));
        trigger.stop();
        let (stopped, elapsed) = waiter.join().unwrap();
        assert!(stopped);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn wait_blocks_until_trigger() {
        let (signal, trigger) = StopSignal::new();
        let clone = signal.clone();
        let waiter = thread::spawn(move || clone.wait());
        thread::sleep(Duration::from_millis(10));
        trigger.stop();
        waiter.join().unwrap();
        assert!(signal.is_stopped());
    }
}
