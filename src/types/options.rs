//! Transaction configuration.

use serde::{Deserialize, Serialize};

use crate::types::deploy::PullFlags;

/// Configuration of a transaction, immutable for its lifetime.
///
/// # Example
///
/// ```
/// use bundle_toolkit::TransactionOptions;
///
/// let options = TransactionOptions {
///     no_pull: true,
///     ..TransactionOptions::default()
/// };
/// assert!(options.add_deps);
/// assert!(options.add_related);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)] // independent behavior toggles
pub struct TransactionOptions {
    /// Skip pulling; operate on already-fetched objects only.
    pub no_pull: bool,
    /// Pull but do not deploy results.
    pub no_deploy: bool,
    /// Resolve and enqueue missing runtime dependencies of app refs.
    pub add_deps: bool,
    /// Resolve and enqueue related refs (locales, debug info, extensions).
    pub add_related: bool,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            no_pull: false,
            no_deploy: false,
            add_deps: true,
            add_related: true,
        }
    }
}

impl TransactionOptions {
    /// What: Derive the pull flags forwarded to store calls.
    ///
    /// Output:
    /// - A [`PullFlags`] carrying `no_pull` and `no_deploy`.
    #[must_use]
    pub const fn pull_flags(&self) -> PullFlags {
        PullFlags {
            no_pull: self.no_pull,
            no_deploy: self.no_deploy,
        }
    }
}
