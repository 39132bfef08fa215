//! Cancellation token for stopping a training run between units of work.
//!
//! The trainer checks the token before each candidate algorithm and the
//! pipeline checks it between stages. A cancelled run returns
//! [`LearningError::Cancelled`](crate::LearningError::Cancelled).
//!
//! # Example
//!
//! ```
//! use car_price_learning::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let for_handler = token.clone();
//!
//! for_handler.cancel();
//! assert!(token.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared flag signalling that a run should stop.
///
/// Clones share state, so a token handed to a background thread can be
/// cancelled from the thread that started it.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

// the pipeline runs under spawn_blocking while handlers keep a clone
static_assertions::assert_impl_all!(CancellationToken: Send, Sync);

impl CancellationToken {
    /// Creates a token in the non-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel()`](Self::cancel) was called on this token or a clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            Err(crate::LearningError::Cancelled)
        } else {
            Ok(())
        }
    }
}
