//! Sampler bookkeeping for status reporting.
//!
//! Counters are plain atomics; the last error message sits behind a mutex
//! because it is only touched once per cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Live counters updated by the sampler after every cycle.
#[derive(Debug, Default)]
pub struct SamplerStats {
    cycles: AtomicU64,
    successes: AtomicU64,
    consecutive_failures: AtomicU64,
    last_success_epoch: AtomicU64,
    last_stored: AtomicU64,
    last_error: Mutex<Option<String>>,
}

/// Point-in-time copy of `SamplerStats`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SamplerStatus {
    pub enabled: bool,
    pub cycles: u64,
    pub successes: u64,
    pub consecutive_failures: u64,
    /// Unix seconds of the last successful cycle, if any.
    pub last_success_epoch: Option<u64>,
    /// Samples stored by the last successful cycle.
    pub last_stored: u64,
    pub last_error: Option<String>,
}

impl SamplerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, stored: usize) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.last_success_epoch.store(epoch_secs(), Ordering::Relaxed);
        self.last_stored.store(stored as u64, Ordering::Relaxed);
        *self.last_error.lock() = None;
    }

    pub fn record_failure(&self, error: &impl std::fmt::Display) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.lock() = Some(error.to_string());
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, enabled: bool) -> SamplerStatus {
        let last_success = self.last_success_epoch.load(Ordering::Relaxed);
        SamplerStatus {
            enabled,
            cycles: self.cycles.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            last_success_epoch: (last_success > 0).then_some(last_success),
            last_stored: self.last_stored.load(Ordering::Relaxed),
            last_error: self.last_error.lock().clone(),
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
