//! Non-reentrant execution guard.
//!
//! Every top-level state-mutating entry point holds this guard for its full
//! duration, including the external-call boundary where control can reach
//! untrusted code. Nested entry into any guarded entry point fails with
//! [`Error::ReentrancyRejected`]. Acquisition is scoped: the guard is
//! released on every exit path, error paths included.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared non-reentrant guard.
///
/// Handles are cheap clones over the same flag, so collaborator
/// implementations can probe whether a unit of work is in flight at the
/// moment they are called.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    entered: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    /// Create a new, unheld guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the guard for the duration of a unit of work.
    ///
    /// Fails with [`Error::ReentrancyRejected`] if a unit of work is
    /// already in flight.
    pub fn enter(&self) -> Result<EnterToken> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::ReentrancyRejected);
        }

        Ok(EnterToken {
            entered: Arc::clone(&self.entered),
        })
    }

    /// Whether a unit of work currently holds the guard
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Scoped acquisition token; releases the guard when dropped
#[derive(Debug)]
pub struct EnterToken {
    entered: Arc<AtomicBool>,
}

impl Drop for EnterToken {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}
