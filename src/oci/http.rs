//! HTTP-backed OCI registry client.

use std::thread;
use std::time::Duration;

use oci_spec::image::{ImageIndex, ImageManifest};
use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{BundleToolkitError, Result};
use crate::oci::OciRegistryClient;

/// Annotation key registries use to tag entries of the image index.
const OCI_TAG_ANNOTATION: &str = "org.opencontainers.image.ref.name";

/// Base delay before the first retry (500ms).
const RETRY_BASE_DELAY_MS: u64 = 500;
/// Maximum backoff delay between retries (8 seconds).
const RETRY_MAX_BACKOFF_MS: u64 = 8_000;
/// Maximum jitter in milliseconds added to retry delays (prevents thundering herd).
const JITTER_MAX_MS: u64 = 500;
/// Total request attempts per fetch.
const MAX_ATTEMPTS: u32 = 3;
/// Request timeout for registry fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Registry client speaking the OCI image-layout-over-HTTP convention.
///
/// The registry is expected to serve `index.json` (an image index whose
/// entries are tagged through the `org.opencontainers.image.ref.name`
/// annotation) and content-addressed blobs under `blobs/<alg>/<hex>`.
/// Transient transport failures are retried with exponential backoff and
/// jitter.
#[derive(Debug)]
pub struct HttpOciClient {
    /// Underlying blocking HTTP client.
    client: reqwest::blocking::Client,
}

impl HttpOciClient {
    /// What: Build a client with the default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns a network error when the underlying HTTP client cannot be
    /// constructed (e.g. TLS backend initialization failure).
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("bundle-toolkit/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// What: Check whether a transport failure is worth retrying.
    ///
    /// Details:
    /// - Timeouts, connection failures, and server-side (5xx) statuses are
    ///   transient; client-side statuses are not.
    fn is_retryable(error: &reqwest::Error) -> bool {
        if error.is_timeout() || error.is_connect() {
            return true;
        }
        error
            .status()
            .is_some_and(|status| status.is_server_error())
    }

    /// What: Sleep before the next attempt, with exponential backoff and
    /// jitter.
    fn backoff(attempt: u32) {
        let backoff_ms =
            (RETRY_BASE_DELAY_MS << attempt.min(4)).min(RETRY_MAX_BACKOFF_MS);
        let jitter_ms = rand::rng().random_range(0..=JITTER_MAX_MS);
        debug!(
            attempt,
            backoff_ms, jitter_ms, "retrying registry fetch after backoff"
        );
        thread::sleep(Duration::from_millis(backoff_ms + jitter_ms));
    }

    /// What: Fetch a JSON document, retrying transient failures.
    ///
    /// Inputs:
    /// - `url`: Document URL.
    ///
    /// Output:
    /// - The deserialized document.
    ///
    /// # Errors
    ///
    /// Returns a network error once attempts are exhausted or the failure
    /// is not transient.
    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut attempt = 0;
        loop {
            debug!("fetching {} (attempt {})", url, attempt + 1);
            let result = self
                .client
                .get(url)
                .send()
                .and_then(reqwest::blocking::Response::error_for_status);
            match result {
                Ok(response) => return Ok(response.json::<T>()?),
                Err(error) if attempt + 1 < MAX_ATTEMPTS && Self::is_retryable(&error) => {
                    warn!("transient failure fetching {}: {}", url, error);
                    Self::backoff(attempt);
                    attempt += 1;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// What: Fetch and parse the registry's image index.
    fn fetch_index(&self, uri: &str) -> Result<ImageIndex> {
        let base = uri.trim_end_matches('/');
        self.get_json(&format!("{base}/index.json"))
    }
}

impl OciRegistryClient for HttpOciClient {
    fn open(&self, uri: &str) -> Result<()> {
        let index = self.fetch_index(uri)?;
        debug!(
            "opened registry {} ({} manifests)",
            uri,
            index.manifests().len()
        );
        Ok(())
    }

    fn choose_image(&self, uri: &str, tag: &str) -> Result<ImageManifest> {
        let base = uri.trim_end_matches('/');
        let index = self.fetch_index(uri)?;

        let descriptor = index
            .manifests()
            .iter()
            .find(|descriptor| {
                descriptor
                    .annotations()
                    .as_ref()
                    .and_then(|annotations| annotations.get(OCI_TAG_ANNOTATION))
                    .is_some_and(|name| name == tag)
            })
            .ok_or_else(|| {
                BundleToolkitError::InvalidInput(format!("no image with tag {tag} in {uri}"))
            })?;

        let digest = descriptor.digest();
        let (algorithm, hex) = digest.split_once(':').ok_or_else(|| {
            BundleToolkitError::InvalidInput(format!("malformed digest {digest} in {uri}"))
        })?;

        self.get_json(&format!("{base}/blobs/{algorithm}/{hex}"))
    }
}
