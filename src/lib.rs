//! Rust toolkit for managing sandboxed application bundles.
//!
//! This crate plans and executes transactions against an installation
//! scope: given requests like "install X" or "update Y", it builds a
//! closed set of operations — the requested refs plus missing runtime
//! dependencies and companion refs (locale packs, debug info,
//! extensions) — chooses remotes, orders the operations, and executes
//! them with well-defined partial-failure behavior. Bundles published as
//! OCI images are supported through an ephemeral origin remote bound to
//! the registry.
//!
//! The content store itself (pull, checkout, deploy) is a collaborator
//! behind the [`Installation`] trait; [`MockInstallation`] is provided so
//! front-ends can test transaction logic without one.
//!
//! # Examples
//!
//! ## Installing an app and whatever it needs
//!
//! ```
//! use std::sync::Arc;
//! use bundle_toolkit::interact::SelectFirst;
//! use bundle_toolkit::{CancelToken, MockInstallation, Transaction, TransactionOptions};
//!
//! # fn main() -> Result<(), bundle_toolkit::Error> {
//! let scope = Arc::new(
//!     MockInstallation::new()
//!         .with_ref_metadata(
//!             "flathub",
//!             "app/org.gnome.Recipes/x86_64/stable",
//!             "[Application]\nruntime=org.gnome.Platform/x86_64/3.28\n",
//!         )
//!         .with_dependency_remotes("runtime/org.gnome.Platform/x86_64/3.28", &["flathub"]),
//! );
//!
//! let mut transaction =
//!     Transaction::new(scope, TransactionOptions::default()).with_chooser(SelectFirst);
//! transaction.add_install("flathub", "app/org.gnome.Recipes/x86_64/stable", None)?;
//!
//! // The runtime was planned first, so it executes first
//! assert_eq!(transaction.operations().len(), 2);
//! transaction.run(false, &CancelToken::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Updating everything that has an origin
//!
//! ```
//! use std::sync::Arc;
//! use bundle_toolkit::{CancelToken, MockInstallation, Transaction, TransactionOptions};
//!
//! # fn main() -> Result<(), bundle_toolkit::Error> {
//! let scope = Arc::new(MockInstallation::new().with_deployed(
//!     "app/org.foo/x86_64/stable",
//!     "flathub",
//!     "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
//! ));
//! let mut transaction = Transaction::new(scope, TransactionOptions::default());
//! transaction.add_update("app/org.foo/x86_64/stable", None, None)?;
//! transaction.run(false, &CancelToken::new())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Non-interactive front-ends
//!
//! The remote chooser is the sole interactive surface; inject
//! [`interact::SelectFirst`] (trust remote priority order) or your own
//! [`interact::RemoteChooser`] to run without a terminal, and an
//! [`interact::TransactionOutput`] to capture the user-visible output.

pub mod cancel;
pub mod error;
pub mod interact;
pub mod metadata;
pub mod refs;
pub mod related;
pub mod store;
pub mod transaction;
pub mod types;

#[cfg(feature = "oci")]
pub mod oci;

/// Prelude module for convenient imports.
///
/// This module re-exports commonly used types, traits, and functions,
/// allowing you to import everything you need with a single
/// `use bundle_toolkit::prelude::*;`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use bundle_toolkit::prelude::*;
///
/// # fn main() -> Result<()> {
/// let scope = Arc::new(MockInstallation::new());
/// let mut transaction = Transaction::new(scope, TransactionOptions::default());
/// transaction.add_install("flathub", "app/org.foo/x86_64/stable", None)?;
/// transaction.run(false, &CancelToken::new())?;
/// # Ok(())
/// # }
/// ```
pub mod prelude;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use error::{BundleToolkitError as Error, Result};
pub use store::{Installation, MockInstallation};
pub use transaction::Transaction;
pub use types::{
    DeployData, Operation, OperationKind, PullFlags, RelatedRef, Subpaths, TransactionOptions,
};

#[cfg(feature = "oci")]
pub use oci::{HttpOciClient, MockOciRegistry, OciRegistryClient};
