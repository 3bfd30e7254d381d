//! Shared data types for bundle-toolkit.

pub mod deploy;
pub mod operation;
pub mod options;

pub use deploy::{DeployData, PullFlags, RelatedRef};
pub use operation::{Operation, OperationKind, Subpaths};
pub use options::TransactionOptions;
