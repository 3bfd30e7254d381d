//! Read-only queries against an installation scope.

use crate::store::Installation;

/// What: Check whether a ref is deployed, consulting both scopes for users.
///
/// Inputs:
/// - `scope`: Scope the caller operates on.
/// - `target`: Full ref.
///
/// Output:
/// - `true` when the ref is deployed in `scope`, or — for a user scope —
///   in the paired system scope.
///
/// Details:
/// - Installing into the system scope must not take a dependency on a
///   user-only runtime, but installing into the user scope may satisfy a
///   dependency from either scope; hence the asymmetric lookup.
#[must_use]
pub fn is_installed(scope: &dyn Installation, target: &str) -> bool {
    if scope.deployed_path(target).is_some() {
        return true;
    }

    if scope.is_user()
        && let Some(system) = scope.system_scope()
        && system.deployed_path(target).is_some()
    {
        tracing::debug!("{} satisfied by the system scope", target);
        return true;
    }

    false
}

/// What: Look up the remote a ref was deployed from in this scope.
///
/// Inputs:
/// - `scope`: Scope to consult (no cross-scope fallback).
/// - `target`: Full ref.
///
/// Output:
/// - `Some(remote)` when the ref is deployed here, `None` otherwise.
#[must_use]
pub fn origin_of(scope: &dyn Installation, target: &str) -> Option<String> {
    scope.deploy_data(target).map(|data| data.origin)
}
