//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types, traits, and functions from
//! bundle-toolkit, allowing you to import everything you need with a
//! single `use bundle_toolkit::prelude::*;`.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```
//! use std::sync::Arc;
//! use bundle_toolkit::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let scope = Arc::new(MockInstallation::new());
//! let mut transaction = Transaction::new(scope, TransactionOptions::default());
//! transaction.add_install("flathub", "app/org.foo/x86_64/stable", None)?;
//! assert!(transaction.contains("app/org.foo/x86_64/stable"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the Mock Scope for Testing
//!
//! ```
//! use bundle_toolkit::prelude::*;
//!
//! let mock = MockInstallation::new().with_deployed(
//!     "app/org.foo/x86_64/stable",
//!     "flathub",
//!     "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
//! );
//! assert!(mock.deployed_path("app/org.foo/x86_64/stable").is_some());
//! ```

// Core transaction types
pub use crate::transaction::Transaction;

// Data types
pub use crate::types::{
    DeployData, Operation, OperationKind, PullFlags, RelatedRef, Subpaths, TransactionOptions,
};

// Error handling
pub use crate::error::{BundleToolkitError as Error, Result};

// Cancellation
pub use crate::cancel::CancelToken;

// Traits
pub use crate::interact::{RemoteChooser, TransactionOutput};
pub use crate::store::Installation;

// Interaction strategies
pub use crate::interact::{ConsoleChooser, ConsoleOutput, SelectFirst, SelectNone};

// Testing
pub use crate::interact::RecordingOutput;
pub use crate::store::MockInstallation;

#[cfg(feature = "oci")]
pub use crate::oci::{HttpOciClient, MockOciRegistry, OciRegistryClient};
