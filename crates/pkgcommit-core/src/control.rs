//! Process-wide "exit requested" flag.
//!
//! Set from a signal handler or user input; every wait that could block
//! (prompts, retries, download progress) checks it and backs out with an
//! abort-equivalent result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared exit-request token. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct ExitFlag {
    requested: Arc<AtomicBool>,
}

impl ExitFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every cooperating wait point to give up.
    pub fn request_exit(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Withdraw a pending request (the user chose to retry after all).
    pub fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
