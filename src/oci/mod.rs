//! OCI registry access and bundle annotation parsing.
//!
//! Application bundles published as OCI images carry their canonical ref
//! and commit checksum in image-manifest annotations under the well-known
//! `org.flatpak.*` keys. This module parses those annotations and defines
//! the registry seam the transaction consumes; [`http::HttpOciClient`] is
//! the default implementation speaking the OCI image-layout-over-HTTP
//! convention.

pub mod http;

pub use http::HttpOciClient;

use std::collections::HashMap;
use std::sync::Mutex;

use oci_spec::image::ImageManifest;

use crate::error::{BundleToolkitError, Result};

/// Annotation key carrying the canonical ref of the bundled artifact.
pub const ANNOTATION_REF: &str = "org.flatpak.ref";

/// Annotation key carrying the commit checksum of the bundled artifact.
pub const ANNOTATION_COMMIT: &str = "org.flatpak.commit";

/// Commit-level annotations recovered from an image manifest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitAnnotations {
    /// Canonical `kind/name/arch/branch` ref, when present.
    pub target_ref: Option<String>,
    /// Commit checksum, when present.
    pub commit: Option<String>,
}

/// What: Extract bundle commit annotations from a manifest annotation map.
///
/// Inputs:
/// - `annotations`: Manifest annotations.
///
/// Output:
/// - The recognized annotation values; unrecognized keys are ignored.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use bundle_toolkit::oci::{parse_commit_annotations, ANNOTATION_REF};
///
/// let mut annotations = HashMap::new();
/// annotations.insert(ANNOTATION_REF.to_string(), "app/org.foo/x86_64/stable".to_string());
/// let parsed = parse_commit_annotations(&annotations);
/// assert_eq!(parsed.target_ref.as_deref(), Some("app/org.foo/x86_64/stable"));
/// assert_eq!(parsed.commit, None);
/// ```
#[must_use]
pub fn parse_commit_annotations(annotations: &HashMap<String, String>) -> CommitAnnotations {
    CommitAnnotations {
        target_ref: annotations.get(ANNOTATION_REF).cloned(),
        commit: annotations.get(ANNOTATION_COMMIT).cloned(),
    }
}

/// What: Extract bundle commit annotations from an image manifest.
///
/// Inputs:
/// - `manifest`: Parsed image manifest.
///
/// Output:
/// - The recognized annotation values; a manifest without annotations
///   yields an empty record.
#[must_use]
pub fn manifest_annotations(manifest: &ImageManifest) -> CommitAnnotations {
    manifest
        .annotations()
        .as_ref()
        .map(parse_commit_annotations)
        .unwrap_or_default()
}

/// Registry seam consumed by the transaction's OCI entry point.
pub trait OciRegistryClient: Send + Sync {
    /// What: Verify the registry at `uri` is reachable and well-formed.
    ///
    /// # Errors
    ///
    /// Returns a network or store error when the registry cannot be
    /// opened.
    fn open(&self, uri: &str) -> Result<()>;

    /// What: Fetch the image manifest published under a tag.
    ///
    /// Inputs:
    /// - `uri`: Registry URI.
    /// - `tag`: Image tag to select.
    ///
    /// Output:
    /// - The parsed image manifest.
    ///
    /// # Errors
    ///
    /// Returns a network error on transport failure, or `InvalidInput`
    /// when the tag does not exist.
    fn choose_image(&self, uri: &str, tag: &str) -> Result<ImageManifest>;
}

/// Mock implementation of [`OciRegistryClient`] for testing.
///
/// # Example
///
/// ```
/// use bundle_toolkit::oci::{MockOciRegistry, OciRegistryClient};
///
/// let registry = MockOciRegistry::new().with_open_error("https://reg", "connection refused");
/// assert!(registry.open("https://reg").is_err());
/// ```
#[derive(Debug, Default)]
pub struct MockOciRegistry {
    /// Manifests keyed by (uri, tag).
    manifests: HashMap<(String, String), ImageManifest>,
    /// Injected open failures keyed by uri.
    open_errors: HashMap<String, String>,
    /// URIs opened so far, in call order.
    opened: Mutex<Vec<String>>,
}

impl MockOciRegistry {
    /// What: Create a mock with no published images.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Publish a manifest under (uri, tag).
    #[must_use]
    pub fn with_manifest(mut self, uri: &str, tag: &str, manifest: ImageManifest) -> Self {
        self.manifests
            .insert((uri.to_string(), tag.to_string()), manifest);
        self
    }

    /// What: Make `open` fail for a uri.
    #[must_use]
    pub fn with_open_error(mut self, uri: &str, message: &str) -> Self {
        self.open_errors
            .insert(uri.to_string(), message.to_string());
        self
    }

    /// What: Snapshot the URIs opened so far.
    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        match self.opened.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl OciRegistryClient for MockOciRegistry {
    fn open(&self, uri: &str) -> Result<()> {
        let mut opened = match self.opened.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        opened.push(uri.to_string());
        self.open_errors.get(uri).map_or(Ok(()), |message| {
            Err(BundleToolkitError::Store(message.clone()))
        })
    }

    fn choose_image(&self, uri: &str, tag: &str) -> Result<ImageManifest> {
        self.manifests
            .get(&(uri.to_string(), tag.to_string()))
            .cloned()
            .ok_or_else(|| {
                BundleToolkitError::InvalidInput(format!("no image with tag {tag} in {uri}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal manifest JSON with bundle annotations, as a registry would
    /// serve it.
    const MANIFEST_JSON: &str = r#"{
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

    #[test]
    fn test_parse_commit_annotations() {
        let manifest: ImageManifest =
            serde_json::from_str(MANIFEST_JSON).expect("manifest parses");
        let parsed = manifest_annotations(&manifest);
        assert_eq!(parsed.target_ref.as_deref(), Some("app/org.foo/x86_64/stable"));
        assert_eq!(
            parsed.commit.as_deref(),
            Some("abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789")
        );
    }

    #[test]
    fn test_parse_missing_annotations() {
        let parsed = parse_commit_annotations(&HashMap::new());
        assert_eq!(parsed, CommitAnnotations::default());
    }

    #[test]
    fn test_mock_registry_serves_manifests() {
        let manifest: ImageManifest =
            serde_json::from_str(MANIFEST_JSON).expect("manifest parses");
        let registry = MockOciRegistry::new().with_manifest("https://reg", "latest", manifest);

        assert!(registry.open("https://reg").is_ok());
        assert!(registry.choose_image("https://reg", "latest").is_ok());
        assert!(matches!(
            registry.choose_image("https://reg", "v2"),
            Err(BundleToolkitError::InvalidInput(_))
        ));
        assert_eq!(registry.opened(), vec!["https://reg".to_string()]);
    }
}
