//! Time sources.
//!
//! [`SystemClock`] reads wall-clock UTC seconds. [`ManualClock`] is a shared,
//! externally advanced clock for simulations and tests; clones observe the
//! same time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use accrual_core::traits::Clock;
use accrual_core::types::Timestamp;

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // pre-epoch readings clamp to zero
        chrono::Utc::now().timestamp().max(0) as Timestamp
    }
}

#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move time forward by `secs`, saturating at `u64::MAX`. Returns the new time.
    pub fn advance(&self, secs: u64) -> Timestamp {
        let mut current = self.now.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(secs);
            match self
                .now
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Set the time, never moving it backwards. Returns the resulting time.
    pub fn set(&self, to: Timestamp) -> Timestamp {
        self.now.fetch_max(to, Ordering::SeqCst).max(to)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
