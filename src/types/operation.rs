//! Operation data types for transaction planning.

use serde::{Deserialize, Serialize};

// === Enums ===

/// Subpath filter attached to an operation.
///
/// The three states are deliberately distinct: collapsing `Inherit` and
/// `All` changes what the store materializes for refs that already carry a
/// recorded filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Subpaths {
    /// No filter supplied; preserve whatever the store already recorded for
    /// this ref.
    #[default]
    Inherit,
    /// Pull all subpaths (the wildcard).
    All,
    /// Restrict to the listed subpaths. Non-empty by construction when
    /// created through [`Subpaths::from_slice`].
    Only(Vec<String>),
}

impl Subpaths {
    /// What: Build a filter from an explicitly supplied subpath list.
    ///
    /// Inputs:
    /// - `subpaths`: Supplied list; an empty list means "all subpaths".
    ///
    /// Output:
    /// - `Subpaths::All` for an empty list, `Subpaths::Only` otherwise.
    ///
    /// Details:
    /// - Use this only when the caller actually supplied a list; absence of
    ///   a list is `Subpaths::Inherit`, not an empty one.
    #[must_use]
    pub fn from_slice(subpaths: &[String]) -> Self {
        if subpaths.is_empty() {
            Self::All
        } else {
            Self::Only(subpaths.to_vec())
        }
    }

    /// What: Check whether this filter restricts the pulled subpaths.
    ///
    /// Output:
    /// - `true` only for a non-empty `Only` list.
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        matches!(self, Self::Only(list) if !list.is_empty())
    }

    /// What: Expose the restriction list, if any.
    ///
    /// Output:
    /// - `Some(list)` for `Only`, `None` for `Inherit` and `All`.
    #[must_use]
    pub fn as_filter(&self) -> Option<&[String]> {
        match self {
            Self::Only(list) => Some(list),
            Self::Inherit | Self::All => None,
        }
    }
}

/// Intent of a planned operation.
///
/// `InstallOrUpdate` is produced when the planner cannot predict whether the
/// ref will be present at execution time (e.g. a runtime another op may have
/// just installed); the executor narrows it by probing the scope once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Install the ref; fails if already present.
    Install,
    /// Update the ref; requires it to be present.
    Update,
    /// Whichever of install or update applies at execution time.
    InstallOrUpdate,
}

impl OperationKind {
    /// What: Check whether this intent may install.
    ///
    /// Output:
    /// - `true` for `Install` and `InstallOrUpdate`.
    #[must_use]
    pub const fn installs(self) -> bool {
        matches!(self, Self::Install | Self::InstallOrUpdate)
    }

    /// What: Check whether this intent may update.
    ///
    /// Output:
    /// - `true` for `Update` and `InstallOrUpdate`.
    #[must_use]
    pub const fn updates(self) -> bool {
        matches!(self, Self::Update | Self::InstallOrUpdate)
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Install => f.write_str("install"),
            Self::Update => f.write_str("update"),
            Self::InstallOrUpdate => f.write_str("install-or-update"),
        }
    }
}

// === Core Structs ===

/// A planned action on exactly one ref.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Repository to pull from; non-empty by execution time.
    pub remote: String,
    /// Full ref this operation acts on.
    pub target: String,
    /// Subpath filter for the pull.
    pub subpaths: Subpaths,
    /// Pinned commit id (OCI installs and explicit updates).
    pub commit: Option<String>,
    /// Operation intent.
    pub kind: OperationKind,
    /// Failures of this operation are warnings, not errors.
    pub non_fatal: bool,
}
