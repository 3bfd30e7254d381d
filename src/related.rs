//! Related-ref lookups with pull-policy selection.

use crate::interact::TransactionOutput;
use crate::store::Installation;
use crate::types::RelatedRef;

/// What: Enumerate companion refs for a primary ref.
///
/// Inputs:
/// - `scope`: Scope whose indexes are consulted.
/// - `remote`: Remote the primary ref is pulled from.
/// - `target`: Full ref of the primary artifact.
/// - `local_only`: Use the local index instead of the remote one (set when
///   pulling is disabled).
/// - `output`: Sink for the lookup-failure warning.
///
/// Output:
/// - The companion refs, possibly empty. Lookup failure degrades to an
///   empty list after warning; related refs are best-effort and must not
///   fail the request that triggered them.
#[must_use]
pub fn find_related(
    scope: &dyn Installation,
    remote: &str,
    target: &str,
    local_only: bool,
    output: &dyn TransactionOutput,
) -> Vec<RelatedRef> {
    let result = if local_only {
        scope.local_related(remote, target)
    } else {
        scope.remote_related(remote, target)
    };

    match result {
        Ok(related) => {
            tracing::debug!(
                "found {} related refs for {} in {}",
                related.len(),
                target,
                remote
            );
            related
        }
        Err(error) => {
            tracing::warn!("related-ref lookup failed for {}: {}", target, error);
            output.warning(&format!("Problem looking for related refs: {error}"));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::{OutputKind, RecordingOutput};
    use crate::store::MockInstallation;

    const APP: &str = "app/org.gnome.Recipes/x86_64/stable";
    const LOCALE: &str = "runtime/org.gnome.Recipes.Locale/x86_64/stable";

    fn locale_related() -> Vec<RelatedRef> {
        vec![RelatedRef {
            target: LOCALE.to_string(),
            subpaths: vec!["/en".to_string()],
            download: true,
        }]
    }

    #[test]
    fn test_uses_remote_index_by_default() {
        let scope = MockInstallation::new().with_remote_related("flathub", APP, locale_related());
        let output = RecordingOutput::new();
        let related = find_related(&scope, "flathub", APP, false, &output);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].target, LOCALE);
        assert!(output.lines().is_empty());
    }

    #[test]
    fn test_uses_local_index_when_pull_disabled() {
        let scope = MockInstallation::new().with_local_related("flathub", APP, locale_related());
        let output = RecordingOutput::new();
        assert_eq!(find_related(&scope, "flathub", APP, true, &output).len(), 1);
        // The remote index was never consulted, so remote-only data is unseen
        assert!(find_related(&scope, "flathub", APP, false, &output).is_empty());
    }

    #[test]
    fn test_lookup_failure_warns_and_returns_empty() {
        let scope =
            MockInstallation::new().with_remote_related_error("flathub", APP, "summary timeout");
        let output = RecordingOutput::new();
        let related = find_related(&scope, "flathub", APP, false, &output);
        assert!(related.is_empty());
        let warnings = output.lines_of(OutputKind::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Problem looking for related refs"));
    }
}
