//! Ref string utilities.
//!
//! Installable artifacts are identified by refs of the form
//! `kind/name/arch/branch`, where `kind` is either `app` or `runtime`.
//! This module decomposes ref strings into typed parts and derives the
//! "pretty" `name/arch/branch` suffix used in user-facing messages.
//!
//! # Examples
//!
//! ```
//! use bundle_toolkit::refs;
//!
//! let parts = refs::decompose("app/org.gnome.Recipes/x86_64/stable").unwrap();
//! assert_eq!(parts.name, "org.gnome.Recipes");
//! assert_eq!(parts.pretty(), "org.gnome.Recipes/x86_64/stable");
//! assert!(refs::is_app("app/org.gnome.Recipes/x86_64/stable"));
//! ```

use crate::error::{BundleToolkitError, Result};
use serde::{Deserialize, Serialize};

/// Kind of an installable artifact, the first segment of a ref.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefKind {
    /// Sandboxed application bundle.
    App,
    /// Shared base environment that apps depend on.
    Runtime,
}

impl RefKind {
    /// What: Parse a ref kind from its string form.
    ///
    /// Inputs:
    /// - `s`: Kind segment, expected to be `app` or `runtime`.
    ///
    /// Output:
    /// - Returns `Some(RefKind)` for a recognized kind, `None` otherwise.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "app" => Some(Self::App),
            "runtime" => Some(Self::Runtime),
            _ => None,
        }
    }

    /// What: Return the canonical string form of the kind.
    ///
    /// Output:
    /// - `"app"` or `"runtime"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Runtime => "runtime",
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decomposed form of a `kind/name/arch/branch` ref.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefParts {
    /// Artifact kind (`app` or `runtime`).
    pub kind: RefKind,
    /// Reverse-DNS artifact name (e.g. `org.gnome.Recipes`).
    pub name: String,
    /// Target architecture (e.g. `x86_64`).
    pub arch: String,
    /// Branch (e.g. `stable`, `3.28`).
    pub branch: String,
}

impl RefParts {
    /// What: Derive the pretty `name/arch/branch` suffix for user messages.
    ///
    /// Output:
    /// - The ref string with the leading kind segment removed.
    #[must_use]
    pub fn pretty(&self) -> String {
        format!("{}/{}/{}", self.name, self.arch, self.branch)
    }
}

impl std::fmt::Display for RefParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.kind, self.name, self.arch, self.branch
        )
    }
}

/// What: Decompose a ref string into its typed parts.
///
/// Inputs:
/// - `target`: Full ref string of the form `kind/name/arch/branch`.
///
/// Output:
/// - Returns `Ok(RefParts)` when the ref has exactly four non-empty
///   segments and a recognized kind.
///
/// Details:
/// - Refs are compared by exact string equality elsewhere; decomposition is
///   only needed for validation and for deriving display forms.
///
/// # Errors
///
/// Returns [`BundleToolkitError::MalformedRef`] when the ref does not have
/// four non-empty segments or the kind is not `app` or `runtime`.
///
/// # Example
///
/// ```
/// use bundle_toolkit::refs::{decompose, RefKind};
///
/// let parts = decompose("runtime/org.gnome.Platform/x86_64/3.28").unwrap();
/// assert_eq!(parts.kind, RefKind::Runtime);
/// assert!(decompose("not-a-ref").is_err());
/// ```
pub fn decompose(target: &str) -> Result<RefParts> {
    let mut segments = target.split('/');
    let (kind, name, arch, branch) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(kind), Some(name), Some(arch), Some(branch), None) => (kind, name, arch, branch),
        _ => return Err(BundleToolkitError::MalformedRef(target.to_string())),
    };

    if name.is_empty() || arch.is_empty() || branch.is_empty() {
        return Err(BundleToolkitError::MalformedRef(target.to_string()));
    }

    let kind =
        RefKind::parse(kind).ok_or_else(|| BundleToolkitError::MalformedRef(target.to_string()))?;

    Ok(RefParts {
        kind,
        name: name.to_string(),
        arch: arch.to_string(),
        branch: branch.to_string(),
    })
}

/// What: Derive the pretty `name/arch/branch` suffix of a ref.
///
/// Inputs:
/// - `target`: Full ref string.
///
/// Output:
/// - The substring after the first `/`.
///
/// # Errors
///
/// Returns [`BundleToolkitError::MalformedRef`] when the ref contains no `/`.
///
/// # Example
///
/// ```
/// use bundle_toolkit::refs::pretty;
///
/// assert_eq!(pretty("app/org.foo/x86_64/stable").unwrap(), "org.foo/x86_64/stable");
/// assert!(pretty("org.foo").is_err());
/// ```
pub fn pretty(target: &str) -> Result<&str> {
    target
        .split_once('/')
        .map(|(_, rest)| rest)
        .ok_or_else(|| BundleToolkitError::MalformedRef(target.to_string()))
}

/// What: Check whether a ref names an application bundle.
///
/// Inputs:
/// - `target`: Full ref string.
///
/// Output:
/// - `true` iff the ref starts with `app/`.
#[must_use]
pub fn is_app(target: &str) -> bool {
    target.starts_with("app/")
}

/// What: Build a full runtime ref from its `name/arch/branch` suffix.
///
/// Inputs:
/// - `name_arch_branch`: Pretty form of a runtime, as declared in app
///   metadata (e.g. `org.gnome.Platform/x86_64/3.28`).
///
/// Output:
/// - The suffix prefixed with `runtime/`.
#[must_use]
pub fn runtime_ref(name_arch_branch: &str) -> String {
    format!("runtime/{name_arch_branch}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_app_ref() {
        let parts = decompose("app/org.gnome.Recipes/x86_64/stable").expect("valid ref");
        assert_eq!(parts.kind, RefKind::App);
        assert_eq!(parts.name, "org.gnome.Recipes");
        assert_eq!(parts.arch, "x86_64");
        assert_eq!(parts.branch, "stable");
        assert_eq!(parts.to_string(), "app/org.gnome.Recipes/x86_64/stable");
    }

    #[test]
    fn test_decompose_runtime_ref() {
        let parts = decompose("runtime/org.gnome.Platform/x86_64/3.28").expect("valid ref");
        assert_eq!(parts.kind, RefKind::Runtime);
        assert_eq!(parts.pretty(), "org.gnome.Platform/x86_64/3.28");
    }

    #[test]
    fn test_decompose_rejects_malformed() {
        // Wrong segment count
        assert!(decompose("app/org.foo/x86_64").is_err());
        assert!(decompose("app/org.foo/x86_64/stable/extra").is_err());
        assert!(decompose("").is_err());

        // Unknown kind
        assert!(decompose("extension/org.foo/x86_64/stable").is_err());

        // Empty segments
        assert!(decompose("app//x86_64/stable").is_err());
        assert!(decompose("app/org.foo/x86_64/").is_err());
    }

    #[test]
    fn test_pretty() {
        assert_eq!(
            pretty("app/org.foo/x86_64/stable").expect("has separator"),
            "org.foo/x86_64/stable"
        );
        assert!(pretty("no-separator").is_err());
    }

    #[test]
    fn test_is_app() {
        assert!(is_app("app/org.foo/x86_64/stable"));
        assert!(!is_app("runtime/org.foo/x86_64/stable"));
        assert!(!is_app("application/org.foo/x86_64/stable"));
    }

    #[test]
    fn test_runtime_ref() {
        assert_eq!(
            runtime_ref("org.gnome.Platform/x86_64/3.28"),
            "runtime/org.gnome.Platform/x86_64/3.28"
        );
    }
}
