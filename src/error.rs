//! Unified error type for bundle-toolkit.

use thiserror::Error;

/// Unified error type for all bundle-toolkit operations.
///
/// This error type covers all possible failure modes across different modules,
/// providing clear, actionable error messages.
#[derive(Error, Debug)]
pub enum BundleToolkitError {
    /// Ref string cannot be decomposed into `kind/name/arch/branch`.
    #[error("Invalid ref format: {0}")]
    MalformedRef(String),

    /// Update target is not installed in the scope.
    #[error("{0} not installed")]
    NotInstalled(String),

    /// Install target is already present in the scope. Also reported by the
    /// store for no-op updates, where the executor converts it to success.
    #[error("{0} already installed")]
    AlreadyInstalled(String),

    /// A required runtime could not be located, or the user aborted the
    /// remote selection for it.
    #[error("The required runtime {0} was not found")]
    RuntimeMissing(String),

    /// OCI manifest lacks the ref annotation identifying a bundle.
    #[error("Image is not an application bundle (missing ref annotation)")]
    NotABundle,

    /// Opaque pass-through from the store layer.
    #[error("Store error: {0}")]
    Store(String),

    /// Cooperative cancellation was requested.
    #[error("Operation was cancelled")]
    Cancelled,

    /// Generic outer error set when at least one fatal operation failed.
    #[error("One or more operations failed")]
    Failed,

    /// Network or HTTP request error.
    #[cfg(feature = "oci")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input parameter.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for bundle-toolkit operations.
pub type Result<T> = std::result::Result<T, BundleToolkitError>;
