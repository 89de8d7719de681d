//! Cooperative cancellation.
//!
//! The flag is set from a signal handler and polled by the orchestrator
//! between archives and by the downloader between retry attempts. Nothing
//! observes it mid-transfer: an attempt that has started runs to completion.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared, clonable "stop requested" flag. All clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Returns `true` if this call set the flag,
    /// `false` if it was already set.
    pub fn cancel(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_visible_through_clones() {
        let flag = CancellationFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());

        assert!(flag.cancel());
        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_second_cancel_reports_already_set() {
        let flag = CancellationFlag::new();
        assert!(flag.cancel());
        assert!(!flag.cancel());
        assert!(flag.is_cancelled());
    }
}
