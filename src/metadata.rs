//! Runtime-dependency lookups from cached app metadata.
//!
//! App refs declare their runtime in keyfile metadata, cached per remote by
//! the store:
//!
//! ```text
//! [Application]
//! name=org.gnome.Recipes
//! runtime=org.gnome.Platform/x86_64/3.28
//! ```
//!
//! A missing or unreadable declaration is treated as "no declared runtime"
//! and never fails the caller; if the dependency was in fact required, the
//! store surfaces the real error at execution time.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;

use crate::refs;
use crate::store::Installation;

/// Number of (remote, ref) lookups memoized per fetcher.
const METADATA_CACHE_CAP: usize = 64;

/// What: Extract the declared runtime from keyfile metadata.
///
/// Inputs:
/// - `metadata`: Keyfile text as cached by the store.
///
/// Output:
/// - `Some(name/arch/branch)` when an `[Application]` section declares a
///   `runtime` key, `None` otherwise.
///
/// Details:
/// - Line-oriented scan; keys outside the `[Application]` section and
///   malformed lines are ignored rather than reported.
///
/// # Example
///
/// ```
/// use bundle_toolkit::metadata::parse_runtime_field;
///
/// let metadata = "[Application]\nruntime=org.gnome.Platform/x86_64/3.28\n";
/// assert_eq!(
///     parse_runtime_field(metadata).as_deref(),
///     Some("org.gnome.Platform/x86_64/3.28")
/// );
/// assert_eq!(parse_runtime_field("[Runtime]\nname=org.foo\n"), None);
/// ```
#[must_use]
pub fn parse_runtime_field(metadata: &str) -> Option<String> {
    let mut in_application = false;
    for line in metadata.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_application = line == "[Application]";
            continue;
        }
        if !in_application {
            continue;
        }
        if let Some((key, value)) = line.split_once('=')
            && key.trim() == "runtime"
        {
            let value = value.trim();
            if value.is_empty() {
                return None;
            }
            return Some(value.to_string());
        }
    }
    None
}

/// Memoizing fetcher for declared runtime dependencies.
///
/// Repeated dependency resolution for the same (remote, ref) pair — common
/// when merged requests re-walk their edges — hits a bounded in-memory
/// cache instead of re-reading and re-parsing the store's ref cache.
#[derive(Debug)]
pub struct MetadataFetcher {
    /// Memoized results keyed by (remote, ref); `None` records a verified
    /// absence.
    cache: Mutex<LruCache<(String, String), Option<String>>>,
}

impl Default for MetadataFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataFetcher {
    /// What: Create a fetcher with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        let cap = NonZeroUsize::new(METADATA_CACHE_CAP).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    /// What: Look up the runtime an app ref declares.
    ///
    /// Inputs:
    /// - `scope`: Scope whose ref cache is consulted.
    /// - `remote`: Remote the ref would be pulled from.
    /// - `target`: Full ref.
    ///
    /// Output:
    /// - `Some(name/arch/branch)` when the ref is an app with cached
    ///   metadata declaring a runtime; `None` for non-app refs, cache
    ///   misses, and malformed metadata.
    ///
    /// Details:
    /// - Absence is memoized too; a remote that never served metadata for
    ///   a ref is not re-queried on every merge of the same request.
    #[must_use]
    pub fn runtime_ref_for(
        &self,
        scope: &dyn Installation,
        remote: &str,
        target: &str,
    ) -> Option<String> {
        if !refs::is_app(target) {
            return None;
        }

        let key = (remote.to_string(), target.to_string());
        {
            let mut cache = match self.cache.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(hit) = cache.get(&key) {
                tracing::debug!("metadata cache hit for {}:{}", remote, target);
                return hit.clone();
            }
        }

        let value = scope
            .cached_metadata(remote, target)
            .and_then(|metadata| parse_runtime_field(&metadata));
        if value.is_none() {
            tracing::debug!("no declared runtime for {} in {}", target, remote);
        }

        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.put(key, value.clone());
        value
    }
}
