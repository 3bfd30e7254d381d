//! Data types describing deployed refs and store pull behavior.

use serde::{Deserialize, Serialize};

/// Metadata the store recorded for a deployed ref.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployData {
    /// Remote the ref was deployed from.
    pub origin: String,
    /// Commit id of the deployed revision.
    pub commit: String,
    /// Subpaths the deploy was restricted to; empty means all.
    pub subpaths: Vec<String>,
}

/// Companion ref logically attached to a primary ref (locale pack, debug
/// info, extension).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRef {
    /// Full ref of the companion artifact.
    pub target: String,
    /// Subpath filter for the companion; empty means all.
    pub subpaths: Vec<String>,
    /// Whether the companion should be downloaded alongside the primary ref.
    /// Tuples with `download = false` are advisory and never enqueued.
    pub download: bool,
}

/// Pull behavior flags forwarded to every store install/update call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullFlags {
    /// Skip pulling; operate on already-fetched objects only.
    pub no_pull: bool,
    /// Pull but do not deploy the result.
    pub no_deploy: bool,
}
