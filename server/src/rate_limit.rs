//! In-memory login throttling.
//!
//! DESIGN
//! ======
//! Sliding-window failure counters backed by `HashMap<String, VecDeque<Instant>>`,
//! keyed by the lowercased username. Once an account collects
//! `max_failures` failed attempts inside the lockout window, further attempts
//! are refused until the oldest failure ages out. A successful login clears
//! the account's history.
//!
//! TRADE-OFFS
//! ==========
//! Unknown usernames are tracked the same way as real ones so the lockout
//! response does not reveal which accounts exist. Counters live in process
//! memory and reset on restart.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThrottleError {
    #[error("too many failed login attempts; retry in {retry_after_secs}s")]
    LockedOut { retry_after_secs: u64 },
}

#[derive(Clone)]
pub struct LoginThrottle {
    inner: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    max_failures: usize,
    window: Duration,
}

fn key(username: &str) -> String {
    username.trim().to_lowercase()
}

impl LoginThrottle {
    #[must_use]
    pub fn new(max_failures: usize, window: Duration) -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())), max_failures: max_failures.max(1), window }
    }

    /// Refuse the attempt if the account is currently locked.
    ///
    /// # Errors
    ///
    /// Returns [`ThrottleError::LockedOut`] while the failure window is full.
    pub fn check(&self, username: &str) -> Result<(), ThrottleError> {
        self.check_at(username, Instant::now())
    }

    fn check_at(&self, username: &str, now: Instant) -> Result<(), ThrottleError> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(failures) = inner.get_mut(&key(username)) else {
            return Ok(());
        };
        prune_window(failures, now, self.window);
        if failures.len() < self.max_failures {
            return Ok(());
        }
        let oldest = failures.front().copied().unwrap_or(now);
        let remaining = self.window.saturating_sub(now.duration_since(oldest));
        Err(ThrottleError::LockedOut { retry_after_secs: remaining.as_secs().max(1) })
    }

    /// Record a failed attempt. Returns `true` when this failure locked the account.
    pub fn record_failure(&self, username: &str) -> bool {
        self.record_failure_at(username, Instant::now())
    }

    fn record_failure_at(&self, username: &str, now: Instant) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let failures = inner.entry(key(username)).or_default();
        prune_window(failures, now, self.window);
        failures.push_back(now);
        failures.len() == self.max_failures
    }

    pub fn record_success(&self, username: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.remove(&key(username));
    }

    /// Drop entries whose failures have all aged out.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let before = inner.len();
        inner.retain(|_, failures| {
            prune_window(failures, now, self.window);
            !failures.is_empty()
        });
        before - inner.len()
    }
}

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) >= window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
