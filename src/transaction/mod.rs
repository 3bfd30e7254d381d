//! Transaction planning: closing a set of requested refs over their
//! dependency and related edges.
//!
//! A [`Transaction`] is created empty, mutated by the `add_*` operations,
//! and consumed by [`Transaction::run`]. Each add-operation consults the
//! scope, resolves the missing runtime dependency of app refs, and
//! enqueues companion refs, merging duplicate requests so every ref is
//! planned at most once. Execution order is insertion order: dependencies
//! and companions are enqueued while their dependent is being added, so
//! they run first (dependencies) or right after their parent (companions).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bundle_toolkit::interact::SelectFirst;
//! use bundle_toolkit::{CancelToken, MockInstallation, Transaction, TransactionOptions};
//!
//! # fn main() -> Result<(), bundle_toolkit::Error> {
//! let scope = Arc::new(MockInstallation::new());
//! let mut transaction =
//!     Transaction::new(scope, TransactionOptions::default()).with_chooser(SelectFirst);
//! transaction.add_install("flathub", "app/org.foo/x86_64/stable", None)?;
//! assert!(transaction.contains("app/org.foo/x86_64/stable"));
//! transaction.run(false, &CancelToken::new())?;
//! # Ok(())
//! # }
//! ```

mod plan;
mod run;

use std::sync::Arc;

use crate::error::{BundleToolkitError, Result};
use crate::interact::{ConsoleChooser, ConsoleOutput, RemoteChooser, TransactionOutput};
use crate::metadata::MetadataFetcher;
use crate::refs;
use crate::related;
use crate::store::{Installation, probe};
use crate::types::{Operation, OperationKind, Subpaths, TransactionOptions};

#[cfg(feature = "oci")]
use crate::oci::{self, HttpOciClient, OciRegistryClient};

/// A planned set of install/update operations against one scope.
///
/// See the [module documentation](self) for the lifecycle.
pub struct Transaction {
    /// Scope the transaction operates on.
    scope: Arc<dyn Installation>,
    /// Immutable configuration.
    options: TransactionOptions,
    /// The operation set under construction.
    plan: plan::Plan,
    /// Memoizing runtime-dependency fetcher.
    metadata: MetadataFetcher,
    /// Strategy for picking among candidate remotes for a dependency.
    chooser: Box<dyn RemoteChooser>,
    /// Sink for user-visible output.
    output: Box<dyn TransactionOutput>,
    /// Registry client for OCI installs; built on first use when not
    /// injected.
    #[cfg(feature = "oci")]
    registry: Option<Box<dyn OciRegistryClient>>,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("options", &self.options)
            .field("operations", &self.plan.operations().len())
            .finish_non_exhaustive()
    }
}

impl Transaction {
    /// What: Create an empty transaction against a scope.
    ///
    /// Inputs:
    /// - `scope`: Installation scope to plan against.
    /// - `options`: Transaction configuration, immutable from here on.
    ///
    /// Details:
    /// - Defaults to the interactive console chooser and console output;
    ///   replace them via [`Transaction::with_chooser`] and
    ///   [`Transaction::with_output`].
    #[must_use]
    pub fn new(scope: Arc<dyn Installation>, options: TransactionOptions) -> Self {
        Self {
            scope,
            options,
            plan: plan::Plan::new(),
            metadata: MetadataFetcher::new(),
            chooser: Box::new(ConsoleChooser),
            output: Box::new(ConsoleOutput),
            #[cfg(feature = "oci")]
            registry: None,
        }
    }

    /// What: Replace the remote-selection strategy.
    #[must_use]
    pub fn with_chooser(mut self, chooser: impl RemoteChooser + 'static) -> Self {
        self.chooser = Box::new(chooser);
        self
    }

    /// What: Replace the user-visible output sink.
    #[must_use]
    pub fn with_output(mut self, output: impl TransactionOutput + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// What: Replace the OCI registry client.
    #[cfg(feature = "oci")]
    #[must_use]
    pub fn with_registry(mut self, registry: impl OciRegistryClient + 'static) -> Self {
        self.registry = Some(Box::new(registry));
        self
    }

    /// What: Check whether a ref is already planned.
    #[must_use]
    pub fn contains(&self, target: &str) -> bool {
        self.plan.contains(target)
    }

    /// What: Expose the planned operations in execution order.
    ///
    /// Details:
    /// - Intended for front-ends rendering a summary before `run`.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        self.plan.operations()
    }

    /// What: Request installation of a ref from a remote.
    ///
    /// Inputs:
    /// - `remote`: Remote to pull from; must be non-empty.
    /// - `target`: Full ref.
    /// - `subpaths`: Optional subpath filter; absence means all subpaths.
    ///
    /// Details:
    /// - With `add_deps` set, the missing runtime dependency of an app ref
    ///   is resolved and enqueued first; with `add_related`, companion
    ///   refs are enqueued after.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty remote, `MalformedRef` for an
    /// undecomposable ref, `AlreadyInstalled` when the ref is deployed in
    /// this scope, and `RuntimeMissing` when a required runtime cannot be
    /// located or its selection was aborted.
    pub fn add_install(
        &mut self,
        remote: &str,
        target: &str,
        subpaths: Option<&[String]>,
    ) -> Result<()> {
        if remote.is_empty() {
            return Err(BundleToolkitError::InvalidInput(
                "install requires a remote".to_string(),
            ));
        }
        let subpaths = subpaths.map_or(Subpaths::All, Subpaths::from_slice);
        self.add_ref(remote, target, subpaths, None, false)
    }

    /// What: Request an update of an installed ref.
    ///
    /// Inputs:
    /// - `target`: Full ref.
    /// - `subpaths`: Optional subpath filter; absence keeps the filter the
    ///   store recorded at deploy time.
    /// - `commit`: Optional commit to update to; latest otherwise.
    ///
    /// Details:
    /// - The remote is the deploy origin. An update whose origin remote is
    ///   disabled is silently skipped and reports success.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRef` for an undecomposable ref and `NotInstalled`
    /// when the ref is not deployed in this scope.
    pub fn add_update(
        &mut self,
        target: &str,
        subpaths: Option<&[String]>,
        commit: Option<&str>,
    ) -> Result<()> {
        let subpaths = subpaths.map_or(Subpaths::Inherit, Subpaths::from_slice);
        self.add_ref("", target, subpaths, commit, true)
    }

    /// What: Request installation of a bundle published as an OCI image.
    ///
    /// Inputs:
    /// - `uri`: Registry URI.
    /// - `tag`: Image tag to install.
    ///
    /// Details:
    /// - Recovers the canonical ref and commit checksum from the image
    ///   manifest annotations, provisions an origin remote named
    ///   `oci-<pretty>` pointing at the registry, reopens the repository
    ///   so pulls observe it, and enqueues an install pinned to the
    ///   annotated commit.
    ///
    /// # Errors
    ///
    /// Returns a network error when the registry or manifest cannot be
    /// fetched, `NotABundle` when the manifest lacks the ref annotation,
    /// `MalformedRef` when the annotated ref is undecomposable, and store
    /// errors from remote provisioning.
    #[cfg(feature = "oci")]
    pub fn add_install_from_oci(&mut self, uri: &str, tag: &str) -> Result<()> {
        let annotations = {
            let registry = self.registry()?;
            registry.open(uri)?;
            let manifest = registry.choose_image(uri, tag)?;
            oci::manifest_annotations(&manifest)
        };

        let Some(target) = annotations.target_ref else {
            return Err(BundleToolkitError::NotABundle);
        };
        let parts = refs::decompose(&target)?;
        let pretty = parts.pretty();

        let id = format!("oci-{pretty}");
        let title = format!("OCI remote for {pretty}");
        let remote = self
            .scope
            .create_origin_remote(&id, &title, &target, uri, tag)?;
        self.scope.recreate_repo()?;
        tracing::debug!("provisioned origin remote {} for {}", remote, target);

        // TODO: resolve the runtime dependency and related refs once the
        // registry exposes per-ref metadata alongside the manifest.
        self.plan.add_op(
            &remote,
            &target,
            Subpaths::All,
            annotations.commit,
            OperationKind::Install,
            false,
        );
        Ok(())
    }

    /// What: Get the registry client, building the HTTP default on first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns a network error when the default client cannot be built.
    #[cfg(feature = "oci")]
    fn registry(&mut self) -> Result<&dyn OciRegistryClient> {
        if self.registry.is_none() {
            self.registry = Some(Box::new(HttpOciClient::new()?));
        }
        self.registry.as_deref().ok_or_else(|| {
            BundleToolkitError::InvalidInput("OCI registry client unavailable".to_string())
        })
    }

    /// What: Validate a request and enqueue it with its dependency and
    /// related edges.
    ///
    /// Inputs:
    /// - `remote`: Remote for installs; ignored for updates (the deploy
    ///   origin is used).
    /// - `target`: Full ref.
    /// - `subpaths`: Subpath filter.
    /// - `commit`: Optional pinned commit.
    /// - `is_update`: Whether this is an update request.
    fn add_ref(
        &mut self,
        remote: &str,
        target: &str,
        subpaths: Subpaths,
        commit: Option<&str>,
        is_update: bool,
    ) -> Result<()> {
        let parts = refs::decompose(target)?;
        let pretty = parts.pretty();

        let remote = if is_update {
            let Some(origin) = probe::origin_of(self.scope.as_ref(), target) else {
                return Err(BundleToolkitError::NotInstalled(pretty));
            };
            if self.scope.remote_disabled(&origin) {
                tracing::debug!("Remote {} disabled, ignoring {} update", origin, pretty);
                return Ok(());
            }
            origin
        } else {
            if self.scope.deployed_path(target).is_some() {
                return Err(BundleToolkitError::AlreadyInstalled(pretty));
            }
            remote.to_string()
        };

        if self.options.add_deps {
            if is_update {
                // An update of something already working should not fail
                // because its runtime can no longer be located; execution
                // surfaces the real problem if there is one.
                if let Err(error) = self.resolve_runtime_dep(&remote, target) {
                    tracing::debug!(
                        "ignoring dependency resolution failure for {} update: {}",
                        pretty,
                        error
                    );
                }
            } else {
                self.resolve_runtime_dep(&remote, target)?;
            }
        }

        let kind = if is_update {
            OperationKind::Update
        } else {
            OperationKind::Install
        };
        self.plan.add_op(
            &remote,
            target,
            subpaths,
            commit.map(ToString::to_string),
            kind,
            false,
        );

        if self.options.add_related {
            self.add_related_refs(&remote, target);
        }
        Ok(())
    }

    /// What: Resolve the runtime an app ref declares and plan whatever it
    /// needs.
    ///
    /// Inputs:
    /// - `remote`: Remote the app ref is pulled from (its ref cache holds
    ///   the metadata).
    /// - `target`: Full ref of the dependent.
    ///
    /// Details:
    /// - A runtime already planned, or satisfied by the paired scope, needs
    ///   nothing. One deployed in this scope is refreshed alongside the
    ///   dependent. Otherwise the configured remotes are searched and the
    ///   chooser picks one; the resulting op carries both intents and the
    ///   executor narrows to whichever applies.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeMissing` when no configured remote offers the
    /// runtime or the selection was aborted.
    fn resolve_runtime_dep(&mut self, remote: &str, target: &str) -> Result<()> {
        let Some(runtime) = self
            .metadata
            .runtime_ref_for(self.scope.as_ref(), remote, target)
        else {
            return Ok(());
        };

        let full = refs::runtime_ref(&runtime);
        if self.plan.contains(&full) {
            return Ok(());
        }

        let mut runtime_remote = None;
        if probe::is_installed(self.scope.as_ref(), &full) {
            if let Some(data) = self.scope.deploy_data(&full) {
                // Deployed in this scope: keep it fresh alongside the dependent
                runtime_remote = Some(data.origin.clone());
                self.plan.add_op(
                    &data.origin,
                    &full,
                    Subpaths::Inherit,
                    None,
                    OperationKind::Update,
                    false,
                );
            }
        } else {
            let remotes = self.scope.search_for_dependency(&full);
            if remotes.is_empty() {
                self.output.message(&format!(
                    "The required runtime {runtime} was not found in a configured remote."
                ));
                return Err(BundleToolkitError::RuntimeMissing(runtime));
            }
            let Some(chosen) = self.chooser.choose(&remotes) else {
                return Err(BundleToolkitError::RuntimeMissing(runtime));
            };
            tracing::debug!("installing required runtime {} from {}", full, chosen);
            self.plan.add_op(
                &chosen,
                &full,
                Subpaths::Inherit,
                None,
                OperationKind::InstallOrUpdate,
                false,
            );
            runtime_remote = Some(chosen);
        }

        if let Some(runtime_remote) = runtime_remote
            && self.options.add_related
        {
            self.add_related_refs(&runtime_remote, &full);
        }
        Ok(())
    }

    /// What: Enqueue the downloadable companions of a ref.
    ///
    /// Inputs:
    /// - `remote`: Remote the primary ref is pulled from.
    /// - `target`: Full ref of the primary artifact.
    ///
    /// Details:
    /// - Companions carry both intents and are non-fatal: their failures
    ///   warn instead of failing the transaction.
    fn add_related_refs(&mut self, remote: &str, target: &str) {
        let related = related::find_related(
            self.scope.as_ref(),
            remote,
            target,
            self.options.no_pull,
            self.output.as_ref(),
        );
        for rel in related {
            if !rel.download {
                tracing::debug!("skipping related ref {} (download disabled)", rel.target);
                continue;
            }
            self.plan.add_op(
                remote,
                &rel.target,
                Subpaths::from_slice(&rel.subpaths),
                None,
                OperationKind::InstallOrUpdate,
                true,
            );
        }
    }
}
