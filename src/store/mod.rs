//! Installation-scope seam consumed by the transaction.
//!
//! The content store and deploy engine live outside this crate; the
//! [`Installation`] trait is the contract the transaction planner and
//! executor program against. A user scope and a system scope coexist on a
//! host; a user scope exposes its system counterpart through
//! [`Installation::system_scope`] so dependency checks can consult both.
//!
//! [`MockInstallation`] is exported for unit testing code built on top of
//! the transaction without a real store.

mod mock;
pub mod probe;

pub use mock::{CreatedRemote, MockInstallation, StoreCall};

use std::path::PathBuf;
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::types::{DeployData, PullFlags, RelatedRef, Subpaths};

/// Contract of an installation scope, as consumed by the transaction.
///
/// Implementations are expected to be internally synchronized; the
/// transaction itself is single-threaded and relies on the store's own
/// process-level locking.
pub trait Installation: Send + Sync {
    /// What: Check whether this is a per-user scope.
    ///
    /// Output:
    /// - `true` for a user scope, `false` for the system scope.
    fn is_user(&self) -> bool;

    /// What: Expose the system scope paired with a user scope.
    ///
    /// Output:
    /// - `Some(scope)` from a user scope, `None` from the system scope.
    fn system_scope(&self) -> Option<Arc<dyn Installation>>;

    /// What: Look up the deploy directory of a ref in this scope.
    ///
    /// Inputs:
    /// - `target`: Full ref.
    ///
    /// Output:
    /// - `Some(path)` when the ref is deployed here, `None` otherwise.
    fn deployed_path(&self, target: &str) -> Option<PathBuf>;

    /// What: Read the deploy metadata recorded for a ref in this scope.
    ///
    /// Inputs:
    /// - `target`: Full ref.
    ///
    /// Output:
    /// - `Some(DeployData)` when the ref is deployed here, `None` otherwise.
    fn deploy_data(&self, target: &str) -> Option<DeployData>;

    /// What: Check whether a configured remote is disabled.
    ///
    /// Inputs:
    /// - `remote`: Remote name.
    ///
    /// Output:
    /// - `true` when the remote exists but is marked disabled.
    fn remote_disabled(&self, remote: &str) -> bool;

    /// What: Read the cached metadata of a ref from a remote's ref cache.
    ///
    /// Inputs:
    /// - `remote`: Remote name.
    /// - `target`: Full ref.
    ///
    /// Output:
    /// - `Some(text)` on a cache hit, `None` on a miss.
    fn cached_metadata(&self, remote: &str, target: &str) -> Option<String>;

    /// What: Enumerate related refs using the local index.
    ///
    /// Inputs:
    /// - `remote`: Remote name.
    /// - `target`: Full ref the companions attach to.
    ///
    /// Output:
    /// - The companion refs recorded locally, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns a store error when the local index cannot be read.
    fn local_related(&self, remote: &str, target: &str) -> Result<Vec<RelatedRef>>;

    /// What: Enumerate related refs using the remote index.
    ///
    /// Inputs:
    /// - `remote`: Remote name.
    /// - `target`: Full ref the companions attach to.
    ///
    /// Output:
    /// - The companion refs the remote advertises, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns a store error when the remote index cannot be fetched.
    fn remote_related(&self, remote: &str, target: &str) -> Result<Vec<RelatedRef>>;

    /// What: Find configured remotes that can provide a dependency ref.
    ///
    /// Inputs:
    /// - `target`: Full ref of the dependency.
    ///
    /// Output:
    /// - Remote names offering the ref, in configuration priority order;
    ///   empty when no configured remote has it.
    fn search_for_dependency(&self, target: &str) -> Vec<String>;

    /// What: Install a ref into this scope.
    ///
    /// Inputs:
    /// - `flags`: Pull behavior.
    /// - `remote`: Remote to pull from.
    /// - `target`: Full ref.
    /// - `subpaths`: Subpath filter for the materialized tree.
    /// - `cancel`: Cooperative cancellation token, checked during blocking
    ///   phases.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInstalled` when the ref is present, `Cancelled` on
    /// cancellation, or an opaque store error.
    fn install(
        &self,
        flags: PullFlags,
        remote: &str,
        target: &str,
        subpaths: &Subpaths,
        cancel: &CancelToken,
    ) -> Result<()>;

    /// What: Update a deployed ref in this scope.
    ///
    /// Inputs:
    /// - `flags`: Pull behavior.
    /// - `remote`: Remote to pull from.
    /// - `target`: Full ref.
    /// - `commit`: Optional pinned commit to update to; latest otherwise.
    /// - `subpaths`: Subpath filter; `Inherit` keeps the recorded filter.
    /// - `cancel`: Cooperative cancellation token.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInstalled` for a no-op update (already at the target
    /// revision), `NotInstalled` when the ref is absent, `Cancelled` on
    /// cancellation, or an opaque store error.
    fn update(
        &self,
        flags: PullFlags,
        remote: &str,
        target: &str,
        commit: Option<&str>,
        subpaths: &Subpaths,
        cancel: &CancelToken,
    ) -> Result<()>;

    /// What: Provision an origin remote pointing at an external source.
    ///
    /// Inputs:
    /// - `id`: Stable remote id.
    /// - `title`: Human-readable remote title.
    /// - `main_ref`: Ref the remote was created for.
    /// - `uri`: Source URI.
    /// - `tag`: Source tag.
    ///
    /// Output:
    /// - The final remote name; implementations may uniquify the id.
    ///
    /// # Errors
    ///
    /// Returns a store error when the remote configuration cannot be
    /// written.
    fn create_origin_remote(
        &self,
        id: &str,
        title: &str,
        main_ref: &str,
        uri: &str,
        tag: &str,
    ) -> Result<String>;

    /// What: Reopen the underlying repository handle.
    ///
    /// Details:
    /// - Required after provisioning a remote so subsequent pulls observe
    ///   the new configuration.
    ///
    /// # Errors
    ///
    /// Returns a store error when the repository cannot be reopened.
    fn recreate_repo(&self) -> Result<()>;
}
