//! A minimal cooperative cancellation signal.
//!
//! An explicit, cloneable token threaded through every operation that may
//! suspend on I/O. Checking it is always the caller's responsibility —
//! cancellation here never preempts a running future, it only lets the next
//! checkpoint observe that it should stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheaply cloneable, shareable cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signals cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns `Err(Error::Canceled)` if this token has been canceled.
    pub fn check(&self) -> crate::errors::Result<()> {
        if self.is_cancelled() {
            Err(crate::errors::Error::Canceled)
        } else {
            Ok(())
        }
    }
}
