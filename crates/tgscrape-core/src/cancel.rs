//! Cooperative cancellation via a shared atomic flag

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag.
///
/// Cloning shares the same underlying flag, so a UI thread or signal handler
/// can hold one clone while the harvester polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Request cancellation, returning whether it had already been requested.
    ///
    /// Signal handlers use this to escalate on a second signal.
    pub fn swap_cancel(&self) -> bool {
        self.0.swap(true, Ordering::Relaxed)
    }
}
