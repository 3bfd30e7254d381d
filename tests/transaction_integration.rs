//! Integration tests for transaction planning and execution.
//!
//! These tests drive the transaction against the mock installation scope,
//! covering dependency resolution, related-ref handling, duplicate-request
//! merging, and the executor's partial-failure policy.

use std::sync::Arc;

use bundle_toolkit::error::{BundleToolkitError, Result};
use bundle_toolkit::interact::{OutputKind, RecordingOutput, SelectFirst, SelectNone};
use bundle_toolkit::store::StoreCall;
use bundle_toolkit::{
    CancelToken, Installation, MockInstallation, OperationKind, RelatedRef, Subpaths, Transaction,
    TransactionOptions,
};

const APP: &str = "app/org.gnome.Recipes/x86_64/stable";
const APP_PRETTY: &str = "org.gnome.Recipes/x86_64/stable";
const RUNTIME: &str = "runtime/org.gnome.Platform/x86_64/3.28";
const RUNTIME_PRETTY: &str = "org.gnome.Platform/x86_64/3.28";
const LOCALE: &str = "runtime/org.gnome.Recipes.Locale/x86_64/stable";
const METADATA: &str = "[Application]\n\
                        name=org.gnome.Recipes\n\
                        runtime=org.gnome.Platform/x86_64/3.28\n";
const COMMIT: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// Build a transaction with deterministic interaction surfaces.
fn transaction_with(scope: &Arc<MockInstallation>, output: &RecordingOutput) -> Transaction {
    Transaction::new(scope.clone(), TransactionOptions::default())
        .with_chooser(SelectFirst)
        .with_output(output.clone())
}

/// Simple install: the declared runtime is planned first, both as installs.
#[test]
fn test_install_plans_missing_runtime_first() -> Result<()> {
    let scope = Arc::new(
        MockInstallation::new()
            .with_ref_metadata("flathub", APP, METADATA)
            .with_dependency_remotes(RUNTIME, &["flathub"]),
    );
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_install("flathub", APP, None)?;

    let ops = transaction.operations();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].target, RUNTIME);
    assert_eq!(ops[1].target, APP);
    assert!(ops[0].kind.installs());
    assert!(ops[1].kind.installs());

    // Dependency precedence carries through to execution order
    transaction.run(false, &CancelToken::new())?;
    let calls = scope.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], StoreCall::Install { target, .. } if target == RUNTIME));
    assert!(matches!(&calls[1], StoreCall::Install { target, .. } if target == APP));

    let messages = output.lines_of(OutputKind::Message);
    assert_eq!(
        messages,
        vec![
            format!("Installing: {RUNTIME_PRETTY} from flathub"),
            format!("Installing: {APP_PRETTY} from flathub"),
        ]
    );
    Ok(())
}

/// A runtime already deployed in the same scope is refreshed, not installed.
#[test]
fn test_install_updates_runtime_deployed_in_same_scope() -> Result<()> {
    let scope = Arc::new(
        MockInstallation::new()
            .with_ref_metadata("flathub", APP, METADATA)
            .with_deployed(RUNTIME, "flathub", COMMIT),
    );
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_install("flathub", APP, None)?;

    let ops = transaction.operations();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].target, RUNTIME);
    assert_eq!(ops[0].kind, OperationKind::Update);
    assert!(!ops[0].kind.installs());
    Ok(())
}

/// An update whose origin remote is disabled is a silent no-op.
#[test]
fn test_update_of_disabled_remote_is_silent_noop() -> Result<()> {
    let scope = Arc::new(
        MockInstallation::new()
            .with_deployed("app/X/a/b", "dormant", COMMIT)
            .with_disabled_remote("dormant"),
    );
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_update("app/X/a/b", None, None)?;

    assert!(transaction.operations().is_empty());
    assert!(output.lines().is_empty());
    Ok(())
}

/// Installing an already-deployed ref fails and leaves the plan untouched.
#[test]
fn test_install_of_installed_ref_fails() {
    let scope = Arc::new(MockInstallation::new().with_deployed("app/X/a/b", "flathub", COMMIT));
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    let result = transaction.add_install("flathub", "app/X/a/b", None);
    assert!(matches!(
        result,
        Err(BundleToolkitError::AlreadyInstalled(pretty)) if pretty == "X/a/b"
    ));
    assert!(transaction.operations().is_empty());
}

/// Updating a ref that is not installed fails.
#[test]
fn test_update_of_missing_ref_fails() {
    let scope = Arc::new(MockInstallation::new());
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    let result = transaction.add_update("app/X/a/b", None, None);
    assert!(matches!(
        result,
        Err(BundleToolkitError::NotInstalled(pretty)) if pretty == "X/a/b"
    ));
}

/// Malformed refs are rejected before touching the plan.
#[test]
fn test_malformed_ref_is_rejected() {
    let scope = Arc::new(MockInstallation::new());
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    assert!(matches!(
        transaction.add_install("flathub", "org.foo", None),
        Err(BundleToolkitError::MalformedRef(_))
    ));
    assert!(matches!(
        transaction.add_install("", APP, None),
        Err(BundleToolkitError::InvalidInput(_))
    ));
}

/// A runtime no configured remote offers fails the install and tells the
/// user where the search ended.
#[test]
fn test_missing_runtime_fails_install() {
    let scope = Arc::new(MockInstallation::new().with_ref_metadata("flathub", APP, METADATA));
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    let result = transaction.add_install("flathub", APP, None);
    assert!(matches!(
        result,
        Err(BundleToolkitError::RuntimeMissing(pretty)) if pretty == RUNTIME_PRETTY
    ));
    assert!(transaction.operations().is_empty());

    let messages = output.lines_of(OutputKind::Message);
    assert_eq!(
        messages,
        vec![format!(
            "The required runtime {RUNTIME_PRETTY} was not found in a configured remote."
        )]
    );
}

/// Aborting the remote selection fails the install the same way.
#[test]
fn test_aborted_remote_selection_fails_install() {
    let scope = Arc::new(
        MockInstallation::new()
            .with_ref_metadata("flathub", APP, METADATA)
            .with_dependency_remotes(RUNTIME, &["flathub", "gnome-nightly"]),
    );
    let output = RecordingOutput::new();
    let mut transaction = Transaction::new(scope.clone(), TransactionOptions::default())
        .with_chooser(SelectNone)
        .with_output(output);

    assert!(matches!(
        transaction.add_install("flathub", APP, None),
        Err(BundleToolkitError::RuntimeMissing(_))
    ));
}

/// In a user scope, a runtime satisfied by the system scope is not planned.
#[test]
fn test_runtime_satisfied_by_system_scope_is_not_planned() -> Result<()> {
    let system = Arc::new(MockInstallation::new().with_deployed(RUNTIME, "flathub", COMMIT));
    let scope = Arc::new(
        MockInstallation::user()
            .with_system(system)
            .with_ref_metadata("flathub", APP, METADATA),
    );
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_install("flathub", APP, None)?;

    let ops = transaction.operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].target, APP);
    Ok(())
}

/// Re-adding an identical install neither grows the plan nor changes it.
#[test]
fn test_planning_is_idempotent() -> Result<()> {
    let scope = Arc::new(
        MockInstallation::new()
            .with_ref_metadata("flathub", APP, METADATA)
            .with_dependency_remotes(RUNTIME, &["flathub"]),
    );
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_install("flathub", APP, None)?;
    let before = transaction.operations().to_vec();
    transaction.add_install("flathub", APP, None)?;

    assert_eq!(transaction.operations(), before.as_slice());
    Ok(())
}

/// An unfiltered request dominates an earlier filtered one.
#[test]
fn test_unfiltered_install_dominates_filtered() -> Result<()> {
    let scope = Arc::new(MockInstallation::new());
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_install("flathub", APP, Some(&["/en".to_string()]))?;
    transaction.add_install("flathub", APP, Some(&[]))?;

    let ops = transaction.operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].subpaths, Subpaths::All);
    Ok(())
}

/// OCI install: the annotated ref lands in the plan, pinned to the
/// annotated commit, against an ephemeral origin remote.
#[cfg(feature = "oci")]
#[test]
fn test_install_from_oci_registry() -> Result<()> {
    use bundle_toolkit::MockOciRegistry;
    use oci_manifest::sample_manifest;

    let scope = Arc::new(MockInstallation::new());
    let output = RecordingOutput::new();
    let registry = MockOciRegistry::new().with_manifest(
        "https://registry.example.com/recipes",
        "latest",
        sample_manifest(),
    );
    let mut transaction = transaction_with(&scope, &output).with_registry(registry);

    transaction.add_install_from_oci("https://registry.example.com/recipes", "latest")?;

    let ops = transaction.operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].target, "app/org.foo/x86_64/stable");
    assert_eq!(ops[0].remote, "oci-org.foo/x86_64/stable");
    assert_eq!(ops[0].subpaths, Subpaths::All);
    assert_eq!(
        ops[0].commit.as_deref(),
        Some("abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789")
    );
    assert_eq!(ops[0].kind, OperationKind::Install);

    let created = scope.created_remotes();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id, "oci-org.foo/x86_64/stable");
    assert_eq!(created[0].title, "OCI remote for org.foo/x86_64/stable");
    assert_eq!(created[0].uri, "https://registry.example.com/recipes");
    assert_eq!(created[0].tag, "latest");
    assert_eq!(scope.recreate_repo_calls(), 1);
    Ok(())
}

/// An image without the ref annotation is not a bundle.
#[cfg(feature = "oci")]
#[test]
fn test_oci_image_without_ref_annotation_fails() {
    use bundle_toolkit::MockOciRegistry;
    use oci_manifest::plain_manifest;

    let scope = Arc::new(MockInstallation::new());
    let output = RecordingOutput::new();
    let registry =
        MockOciRegistry::new().with_manifest("https://reg", "latest", plain_manifest());
    let mut transaction = transaction_with(&scope, &output).with_registry(registry);

    assert!(matches!(
        transaction.add_install_from_oci("https://reg", "latest"),
        Err(BundleToolkitError::NotABundle)
    ));
    assert!(scope.created_remotes().is_empty());
}

/// A failing related ref warns but never fails the transaction.
#[test]
fn test_related_ref_failure_is_non_fatal() -> Result<()> {
    let locale = RelatedRef {
        target: LOCALE.to_string(),
        subpaths: vec!["/en".to_string()],
        download: true,
    };
    let scope = Arc::new(
        MockInstallation::new()
            .with_remote_related("flathub", APP, vec![locale])
            .with_install_error(LOCALE, BundleToolkitError::Store("pull failed".to_string())),
    );
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_install("flathub", APP, None)?;

    let ops = transaction.operations();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[1].target, LOCALE);
    assert!(ops[1].non_fatal);
    assert_eq!(
        ops[1].subpaths,
        Subpaths::Only(vec!["/en".to_string()])
    );

    transaction.run(false, &CancelToken::new())?;

    let warnings = output.lines_of(OutputKind::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Failed to install"));
    assert!(output.lines_of(OutputKind::Error).is_empty());
    Ok(())
}

/// Related tuples without the download flag are skipped.
#[test]
fn test_related_refs_without_download_are_skipped() -> Result<()> {
    let debug_info = RelatedRef {
        target: "runtime/org.gnome.Recipes.Debug/x86_64/stable".to_string(),
        subpaths: Vec::new(),
        download: false,
    };
    let scope = Arc::new(MockInstallation::new().with_remote_related("flathub", APP, vec![debug_info]));
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_install("flathub", APP, None)?;
    assert_eq!(transaction.operations().len(), 1);
    Ok(())
}

/// With pulling disabled, related refs come from the local index.
#[test]
fn test_no_pull_uses_local_related_index() -> Result<()> {
    let locale = RelatedRef {
        target: LOCALE.to_string(),
        subpaths: Vec::new(),
        download: true,
    };
    let scope = Arc::new(MockInstallation::new().with_local_related("flathub", APP, vec![locale]));
    let output = RecordingOutput::new();
    let options = TransactionOptions {
        no_pull: true,
        ..TransactionOptions::default()
    };
    let mut transaction = Transaction::new(scope.clone(), options)
        .with_chooser(SelectFirst)
        .with_output(output);

    transaction.add_install("flathub", APP, None)?;
    assert_eq!(transaction.operations().len(), 2);
    Ok(())
}

/// A successful update reports the new commit, truncated to twelve
/// characters.
#[test]
fn test_update_reports_new_commit() -> Result<()> {
    let scope = Arc::new(
        MockInstallation::new()
            .with_deployed("app/org.foo/x86_64/stable", "flathub", COMMIT)
            .with_post_update_commit(
                "app/org.foo/x86_64/stable",
                "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210",
            ),
    );
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_update("app/org.foo/x86_64/stable", None, None)?;
    transaction.run(false, &CancelToken::new())?;

    let messages = output.lines_of(OutputKind::Message);
    assert_eq!(
        messages,
        vec![
            "Updating: org.foo/x86_64/stable from flathub".to_string(),
            "Now at fedcba987654.".to_string(),
        ]
    );
    Ok(())
}

/// An update the store reports as already current succeeds with
/// "No updates.".
#[test]
fn test_noop_update_is_success() -> Result<()> {
    let scope = Arc::new(
        MockInstallation::new()
            .with_deployed("app/org.foo/x86_64/stable", "flathub", COMMIT)
            .with_update_error(
                "app/org.foo/x86_64/stable",
                BundleToolkitError::AlreadyInstalled("org.foo/x86_64/stable".to_string()),
            ),
    );
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_update("app/org.foo/x86_64/stable", None, None)?;
    transaction.run(false, &CancelToken::new())?;

    let messages = output.lines_of(OutputKind::Message);
    assert_eq!(
        messages,
        vec![
            "Updating: org.foo/x86_64/stable from flathub".to_string(),
            "No updates.".to_string(),
        ]
    );
    assert!(output.lines_of(OutputKind::Error).is_empty());
    Ok(())
}

/// A pinned update commit is forwarded to the store.
#[test]
fn test_update_forwards_pinned_commit() -> Result<()> {
    let scope =
        Arc::new(MockInstallation::new().with_deployed("app/org.foo/x86_64/stable", "flathub", COMMIT));
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_update("app/org.foo/x86_64/stable", None, Some(COMMIT))?;
    transaction.run(false, &CancelToken::new())?;

    let calls = scope.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        &calls[0],
        StoreCall::Update { commit: Some(commit), .. } if commit == COMMIT
    ));
    Ok(())
}

/// Without stop-on-first-error, fatal failures are reported and execution
/// continues; the transaction reports the generic failure at the end.
#[test]
fn test_fatal_failure_continues_and_fails_run() -> Result<()> {
    let scope = Arc::new(MockInstallation::new().with_install_error(
        "app/org.broken/x86_64/stable",
        BundleToolkitError::Store("pull failed".to_string()),
    ));
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_install("flathub", "app/org.broken/x86_64/stable", None)?;
    transaction.add_install("flathub", "app/org.ok/x86_64/stable", None)?;

    let error = transaction
        .run(false, &CancelToken::new())
        .expect_err("run fails");
    assert!(matches!(error, BundleToolkitError::Failed));
    assert_eq!(error.to_string(), "One or more operations failed");

    // The second operation still executed
    assert_eq!(scope.calls().len(), 2);
    let errors = output.lines_of(OutputKind::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Failed to install org.broken/x86_64/stable"));
    Ok(())
}

/// With stop-on-first-error, the concrete store error propagates and later
/// operations never run.
#[test]
fn test_stop_on_first_error_halts() -> Result<()> {
    let scope = Arc::new(MockInstallation::new().with_install_error(
        "app/org.broken/x86_64/stable",
        BundleToolkitError::Store("pull failed".to_string()),
    ));
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_install("flathub", "app/org.broken/x86_64/stable", None)?;
    transaction.add_install("flathub", "app/org.ok/x86_64/stable", None)?;

    let result = transaction.run(true, &CancelToken::new());
    assert!(matches!(result, Err(BundleToolkitError::Store(_))));
    assert_eq!(scope.calls().len(), 1);
    Ok(())
}

/// Cancellation between operations obeys the fatality policy.
#[test]
fn test_cancellation_before_first_op() -> Result<()> {
    let scope = Arc::new(MockInstallation::new());
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);
    transaction.add_install("flathub", APP, None)?;

    let cancel = CancelToken::new();
    cancel.cancel();
    let result = transaction.run(true, &cancel);
    assert!(matches!(result, Err(BundleToolkitError::Cancelled)));
    assert!(scope.calls().is_empty());
    Ok(())
}

/// A dependency-resolution failure during an update is swallowed; the
/// update itself still lands in the plan.
#[test]
fn test_update_survives_dependency_resolution_failure() -> Result<()> {
    // The app's metadata names a runtime that no remote offers anymore
    let scope = Arc::new(
        MockInstallation::new()
            .with_deployed(APP, "flathub", COMMIT)
            .with_ref_metadata("flathub", APP, METADATA),
    );
    let output = RecordingOutput::new();
    let mut transaction = transaction_with(&scope, &output);

    transaction.add_update(APP, None, None)?;

    let ops = transaction.operations();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].target, APP);
    assert_eq!(ops[0].kind, OperationKind::Update);
    Ok(())
}

/// Deploy paths derived by the mock scope live under its configured root.
#[test]
fn test_mock_scope_paths_follow_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let scope = MockInstallation::new()
        .with_root(dir.path())
        .with_deployed(APP, "flathub", COMMIT);
    let path = scope.deployed_path(APP).expect("deployed");
    assert!(path.starts_with(dir.path()));
}

/// Manifest fixtures for the OCI tests.
#[cfg(feature = "oci")]
mod oci_manifest {
    use oci_spec::image::ImageManifest;

    /// Manifest carrying bundle annotations.
    const BUNDLE_MANIFEST: &str = r#"{
        "schemaVersion": 2,
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "digest": "sha256:2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f70819",
            "size": 7023
        },
        "layers": [],
        "annotations": {
            "org.flatpak.ref": "app/org.foo/x86_64/stable",
            "org.flatpak.commit": "abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789"
        }
    }"#;

    /// Manifest of an ordinary container image, no bundle annotations.
    const PLAIN_MANIFEST: &str = r#"{
        "schemaVersion": 2,
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "digest": "sha256:2a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f70819",
            "size": 7023
        },
        "layers": []
    }"#;

    /// Parse the bundle manifest fixture.
    pub fn sample_manifest() -> ImageManifest {
        serde_json::from_str(BUNDLE_MANIFEST).expect("fixture parses")
    }

    /// Parse the plain manifest fixture.
    pub fn plain_manifest() -> ImageManifest {
        serde_json::from_str(PLAIN_MANIFEST).expect("fixture parses")
    }
}
