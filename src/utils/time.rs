//! Time source abstraction.
//!
//! Price staleness is the engine's only time-based semantic, so the clock
//! sits behind a narrow capability that tests can pin to a fixed instant.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of the current Unix timestamp in seconds
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in seconds
    fn unix_now(&self) -> u64;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_now(&self) -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

/// Deterministic clock for tests and replay.
///
/// Clones share the same instant, so a harness can keep a handle and
/// advance time while the engine owns the clock.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a manual clock pinned at the given timestamp
    pub fn at(now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    /// Set the current timestamp
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::Release);
    }

    /// Advance the current timestamp by `secs`
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn unix_now(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::at(1_000);
        assert_eq!(clock.unix_now(), 1_000);

        clock.advance(500);
        assert_eq!(clock.unix_now(), 1_500);

        let handle = clock.clone();
        handle.set(2_000);
        assert_eq!(clock.unix_now(), 2_000);
    }

    #[test]
    fn test_system_clock_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.unix_now();
        let b = clock.unix_now();
        assert!(b >= a);
    }
}
