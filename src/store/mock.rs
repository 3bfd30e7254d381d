//! Mock implementation of [`Installation`] for testing purposes.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::cancel::CancelToken;
use crate::error::{BundleToolkitError, Result};
use crate::store::Installation;
use crate::types::{DeployData, PullFlags, RelatedRef, Subpaths};

/// Commit id assigned to refs installed through the mock.
const INSTALL_COMMIT: &str = "1f4e8c2a9b7d3e5f6a8c0b2d4e6f8a0c1d3e5f7a9b1c3d5e7f9a0b2c4d6e8f0a";

/// Commit id assigned by mock updates when none is pinned or configured.
const UPDATE_COMMIT: &str = "9a7c5e3f1d9b7a5c3e1f0d8b6a4c2e0f9d7b5a3c1e0f8d6b4a2c0e9f7d5b3a1c";

/// A store entry point invocation recorded by the mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    /// An `install` dispatch.
    Install {
        /// Remote the install pulled from.
        remote: String,
        /// Installed ref.
        target: String,
        /// Subpath filter the caller supplied.
        subpaths: Subpaths,
    },
    /// An `update` dispatch.
    Update {
        /// Remote the update pulled from.
        remote: String,
        /// Updated ref.
        target: String,
        /// Pinned commit, if any.
        commit: Option<String>,
        /// Subpath filter the caller supplied.
        subpaths: Subpaths,
    },
}

/// Arguments of a recorded `create_origin_remote` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatedRemote {
    /// Requested remote id.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Ref the remote was created for.
    pub main_ref: String,
    /// Source URI.
    pub uri: String,
    /// Source tag.
    pub tag: String,
}

/// What: Mock implementation of [`Installation`] for testing.
///
/// Inputs: None (created via `MockInstallation::new()` or builder methods)
///
/// Output:
/// - `MockInstallation` instance that can be configured with predefined
///   deploys, metadata, related refs, and failure injections
///
/// Details:
/// - Builder pattern (`with_*` methods) for configuration before sharing
/// - Mock installs and updates mutate the deployed set, so intent narrowing
///   during a run observes refs installed earlier in the same run
/// - Records every install/update dispatch for order and argument
///   assertions, reachable through [`MockInstallation::calls`]
/// - Thread-safe via `Mutex` for the mutable state
#[derive(Debug, Default)]
pub struct MockInstallation {
    /// Whether this mock models a per-user scope.
    user: bool,
    /// Paired system scope, consulted by cross-scope probes.
    system: Option<Arc<MockInstallation>>,
    /// Base directory deploy paths are derived from.
    root: PathBuf,
    /// Deployed refs and their recorded metadata.
    deployed: Mutex<HashMap<String, DeployData>>,
    /// Remotes marked disabled.
    disabled_remotes: HashSet<String>,
    /// Cached ref metadata, keyed by (remote, ref).
    ref_metadata: HashMap<(String, String), String>,
    /// Local-index related refs, keyed by (remote, ref); `Err` holds a
    /// store error message.
    local_related: HashMap<(String, String), std::result::Result<Vec<RelatedRef>, String>>,
    /// Remote-index related refs, keyed by (remote, ref); `Err` holds a
    /// store error message.
    remote_related: HashMap<(String, String), std::result::Result<Vec<RelatedRef>, String>>,
    /// Remotes offering a dependency ref, keyed by ref.
    dependency_remotes: HashMap<String, Vec<String>>,
    /// Injected install failures, keyed by ref.
    install_errors: HashMap<String, BundleToolkitError>,
    /// Injected update failures, keyed by ref.
    update_errors: HashMap<String, BundleToolkitError>,
    /// Commit ids successful updates move refs to, keyed by ref.
    post_update_commits: HashMap<String, String>,
    /// Recorded install/update dispatches in call order.
    calls: Mutex<Vec<StoreCall>>,
    /// Recorded origin-remote provisioning calls.
    created_remotes: Mutex<Vec<CreatedRemote>>,
    /// Number of `recreate_repo` calls.
    recreate_repo_calls: AtomicUsize,
}

/// What: Lock a mutex, recovering the guard from a poisoned lock.
///
/// Details:
/// - Mock state stays usable even when a test thread panicked while
///   holding the lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// What: Clone an injected error for repeated delivery.
///
/// Details:
/// - Non-clonable variants (`Network`) degrade to opaque store errors,
///   mirroring how opaque failures reach the transaction in production.
fn clone_error(error: &BundleToolkitError) -> BundleToolkitError {
    match error {
        BundleToolkitError::MalformedRef(s) => BundleToolkitError::MalformedRef(s.clone()),
        BundleToolkitError::NotInstalled(s) => BundleToolkitError::NotInstalled(s.clone()),
        BundleToolkitError::AlreadyInstalled(s) => BundleToolkitError::AlreadyInstalled(s.clone()),
        BundleToolkitError::RuntimeMissing(s) => BundleToolkitError::RuntimeMissing(s.clone()),
        BundleToolkitError::NotABundle => BundleToolkitError::NotABundle,
        BundleToolkitError::Store(s) => BundleToolkitError::Store(s.clone()),
        BundleToolkitError::Cancelled => BundleToolkitError::Cancelled,
        BundleToolkitError::Failed => BundleToolkitError::Failed,
        #[cfg(feature = "oci")]
        BundleToolkitError::Network(_) => {
            BundleToolkitError::Store("Mock network error".to_string())
        }
        BundleToolkitError::Json(_) => BundleToolkitError::Store("Mock JSON error".to_string()),
        BundleToolkitError::InvalidInput(s) => BundleToolkitError::InvalidInput(s.clone()),
    }
}

/// What: Derive the pretty form of a ref, tolerating malformed input.
fn pretty_or_full(target: &str) -> String {
    crate::refs::pretty(target).unwrap_or(target).to_string()
}

impl MockInstallation {
    /// What: Create a mock system scope with empty configuration.
    ///
    /// Output:
    /// - `MockInstallation` ready for `with_*` configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/var/lib/bundles"),
            ..Self::default()
        }
    }

    /// What: Create a mock per-user scope.
    ///
    /// Details:
    /// - Pair it with a system scope via [`MockInstallation::with_system`]
    ///   to exercise cross-scope dependency checks.
    #[must_use]
    pub fn user() -> Self {
        Self {
            user: true,
            root: PathBuf::from("/home/user/.local/share/bundles"),
            ..Self::default()
        }
    }

    /// What: Attach the system scope consulted by cross-scope probes.
    #[must_use]
    pub fn with_system(mut self, system: Arc<Self>) -> Self {
        self.system = Some(system);
        self
    }

    /// What: Set the base directory deploy paths are derived from.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// What: Mark a ref as deployed in this scope.
    ///
    /// Inputs:
    /// - `target`: Full ref.
    /// - `origin`: Remote recorded at deploy time.
    /// - `commit`: Deployed commit id.
    #[must_use]
    pub fn with_deployed(self, target: &str, origin: &str, commit: &str) -> Self {
        lock(&self.deployed).insert(
            target.to_string(),
            DeployData {
                origin: origin.to_string(),
                commit: commit.to_string(),
                subpaths: Vec::new(),
            },
        );
        self
    }

    /// What: Mark a remote as disabled.
    #[must_use]
    pub fn with_disabled_remote(mut self, remote: &str) -> Self {
        self.disabled_remotes.insert(remote.to_string());
        self
    }

    /// What: Seed the ref cache with metadata for a (remote, ref) pair.
    #[must_use]
    pub fn with_ref_metadata(mut self, remote: &str, target: &str, metadata: &str) -> Self {
        self.ref_metadata
            .insert((remote.to_string(), target.to_string()), metadata.to_string());
        self
    }

    /// What: Seed the local index with related refs for a (remote, ref)
    /// pair.
    #[must_use]
    pub fn with_local_related(mut self, remote: &str, target: &str, related: Vec<RelatedRef>) -> Self {
        self.local_related
            .insert((remote.to_string(), target.to_string()), Ok(related));
        self
    }

    /// What: Seed the remote index with related refs for a (remote, ref)
    /// pair.
    #[must_use]
    pub fn with_remote_related(
        mut self,
        remote: &str,
        target: &str,
        related: Vec<RelatedRef>,
    ) -> Self {
        self.remote_related
            .insert((remote.to_string(), target.to_string()), Ok(related));
        self
    }

    /// What: Make the remote-index related lookup fail for a (remote, ref)
    /// pair.
    #[must_use]
    pub fn with_remote_related_error(mut self, remote: &str, target: &str, message: &str) -> Self {
        self.remote_related.insert(
            (remote.to_string(), target.to_string()),
            Err(message.to_string()),
        );
        self
    }

    /// What: Declare which remotes offer a dependency ref.
    #[must_use]
    pub fn with_dependency_remotes(mut self, target: &str, remotes: &[&str]) -> Self {
        self.dependency_remotes.insert(
            target.to_string(),
            remotes.iter().copied().map(ToString::to_string).collect(),
        );
        self
    }

    /// What: Make installs of a ref fail with the given error.
    #[must_use]
    pub fn with_install_error(mut self, target: &str, error: BundleToolkitError) -> Self {
        self.install_errors.insert(target.to_string(), error);
        self
    }

    /// What: Make updates of a ref fail with the given error.
    ///
    /// Details:
    /// - Injecting `AlreadyInstalled` models a no-op update.
    #[must_use]
    pub fn with_update_error(mut self, target: &str, error: BundleToolkitError) -> Self {
        self.update_errors.insert(target.to_string(), error);
        self
    }

    /// What: Set the commit a successful update moves a ref to.
    #[must_use]
    pub fn with_post_update_commit(mut self, target: &str, commit: &str) -> Self {
        self.post_update_commits
            .insert(target.to_string(), commit.to_string());
        self
    }

    /// What: Snapshot the install/update dispatches recorded so far.
    ///
    /// Output:
    /// - Calls in dispatch order.
    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    /// What: Snapshot the origin remotes provisioned so far.
    #[must_use]
    pub fn created_remotes(&self) -> Vec<CreatedRemote> {
        lock(&self.created_remotes).clone()
    }

    /// What: Count the `recreate_repo` calls observed so far.
    #[must_use]
    pub fn recreate_repo_calls(&self) -> usize {
        self.recreate_repo_calls.load(Ordering::SeqCst)
    }
}

impl Installation for MockInstallation {
    fn is_user(&self) -> bool {
        self.user
    }

    fn system_scope(&self) -> Option<Arc<dyn Installation>> {
        self.system
            .clone()
            .map(|system| system as Arc<dyn Installation>)
    }

    fn deployed_path(&self, target: &str) -> Option<PathBuf> {
        lock(&self.deployed)
            .contains_key(target)
            .then(|| self.root.join(target))
    }

    fn deploy_data(&self, target: &str) -> Option<DeployData> {
        lock(&self.deployed).get(target).cloned()
    }

    fn remote_disabled(&self, remote: &str) -> bool {
        self.disabled_remotes.contains(remote)
    }

    fn cached_metadata(&self, remote: &str, target: &str) -> Option<String> {
        self.ref_metadata
            .get(&(remote.to_string(), target.to_string()))
            .cloned()
    }

    fn local_related(&self, remote: &str, target: &str) -> Result<Vec<RelatedRef>> {
        match self
            .local_related
            .get(&(remote.to_string(), target.to_string()))
        {
            Some(Ok(related)) => Ok(related.clone()),
            Some(Err(message)) => Err(BundleToolkitError::Store(message.clone())),
            None => Ok(Vec::new()),
        }
    }

    fn remote_related(&self, remote: &str, target: &str) -> Result<Vec<RelatedRef>> {
        match self
            .remote_related
            .get(&(remote.to_string(), target.to_string()))
        {
            Some(Ok(related)) => Ok(related.clone()),
            Some(Err(message)) => Err(BundleToolkitError::Store(message.clone())),
            None => Ok(Vec::new()),
        }
    }

    fn search_for_dependency(&self, target: &str) -> Vec<String> {
        self.dependency_remotes
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    fn install(
        &self,
        _flags: PullFlags,
        remote: &str,
        target: &str,
        subpaths: &Subpaths,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        lock(&self.calls).push(StoreCall::Install {
            remote: remote.to_string(),
            target: target.to_string(),
            subpaths: subpaths.clone(),
        });

        if let Some(error) = self.install_errors.get(target) {
            return Err(clone_error(error));
        }

        let mut deployed = lock(&self.deployed);
        if deployed.contains_key(target) {
            return Err(BundleToolkitError::AlreadyInstalled(pretty_or_full(target)));
        }
        deployed.insert(
            target.to_string(),
            DeployData {
                origin: remote.to_string(),
                commit: INSTALL_COMMIT.to_string(),
                subpaths: subpaths.as_filter().map_or_else(Vec::new, <[String]>::to_vec),
            },
        );
        Ok(())
    }

    fn update(
        &self,
        _flags: PullFlags,
        remote: &str,
        target: &str,
        commit: Option<&str>,
        subpaths: &Subpaths,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        lock(&self.calls).push(StoreCall::Update {
            remote: remote.to_string(),
            target: target.to_string(),
            commit: commit.map(ToString::to_string),
            subpaths: subpaths.clone(),
        });

        if let Some(error) = self.update_errors.get(target) {
            return Err(clone_error(error));
        }

        let mut deployed = lock(&self.deployed);
        let Some(data) = deployed.get_mut(target) else {
            return Err(BundleToolkitError::NotInstalled(pretty_or_full(target)));
        };
        data.commit = commit.map_or_else(
            || {
                self.post_update_commits
                    .get(target)
                    .cloned()
                    .unwrap_or_else(|| UPDATE_COMMIT.to_string())
            },
            ToString::to_string,
        );
        if let Some(filter) = subpaths.as_filter() {
            data.subpaths = filter.to_vec();
        }
        Ok(())
    }

    fn create_origin_remote(
        &self,
        id: &str,
        title: &str,
        main_ref: &str,
        uri: &str,
        tag: &str,
    ) -> Result<String> {
        lock(&self.created_remotes).push(CreatedRemote {
            id: id.to_string(),
            title: title.to_string(),
            main_ref: main_ref.to_string(),
            uri: uri.to_string(),
            tag: tag.to_string(),
        });
        Ok(id.to_string())
    }

    fn recreate_repo(&self) -> Result<()> {
        self.recreate_repo_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
