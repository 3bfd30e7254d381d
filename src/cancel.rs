//! Cooperative cancellation for blocking store calls.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{BundleToolkitError, Result};

/// Cooperative cancellation token.
///
/// Cloning the token shares the underlying flag; any clone can cancel, and
/// all clones observe it. The executor checks the token between operations
/// and hands it to every blocking store call.
///
/// # Example
///
/// ```
/// use bundle_toolkit::CancelToken;
///
/// let token = CancelToken::new();
/// let shared = token.clone();
/// assert!(!shared.is_cancelled());
/// token.cancel();
/// assert!(shared.is_cancelled());
/// assert!(shared.check().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    /// Shared cancellation flag.
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// What: Create a fresh, un-cancelled token.
    ///
    /// Output:
    /// - A token whose `is_cancelled` is `false`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Request cancellation.
    ///
    /// Details:
    /// - Idempotent; later calls are no-ops.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// What: Check whether cancellation was requested.
    ///
    /// Output:
    /// - `true` once any clone of this token was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// What: Convert the flag into a result for `?` chaining.
    ///
    /// Output:
    /// - `Ok(())` while not cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`BundleToolkitError::Cancelled`] once cancellation was
    /// requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BundleToolkitError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[test]
    fn test_cancel_is_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(
            token.check(),
            Err(BundleToolkitError::Cancelled)
        ));
    }
}
