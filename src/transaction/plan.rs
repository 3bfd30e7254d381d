//! Ordered operation set with constant-time by-ref lookup.

use std::collections::HashMap;

use crate::types::{Operation, OperationKind, Subpaths};

/// The planned operations, in insertion order, plus an index from ref to
/// position.
///
/// Every ref appears at most once; re-adding an existing ref merges into
/// the operation already in place, preserving first-seen order.
#[derive(Debug, Default)]
pub(super) struct Plan {
    /// Operations in insertion (and execution) order.
    ops: Vec<Operation>,
    /// Position of each ref in `ops`.
    index: HashMap<String, usize>,
}

impl Plan {
    /// What: Create an empty plan.
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// What: Check membership of a ref.
    pub(super) fn contains(&self, target: &str) -> bool {
        self.index.contains_key(target)
    }

    /// What: Expose the operations in execution order.
    pub(super) fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// What: Look up the operation planned for a ref.
    pub(super) fn get(&self, target: &str) -> Option<&Operation> {
        self.index.get(target).and_then(|&i| self.ops.get(i))
    }

    /// What: Enqueue an operation, merging with an existing one for the
    /// same ref.
    ///
    /// Inputs:
    /// - `remote`: Repository to pull from.
    /// - `target`: Full ref.
    /// - `subpaths`: Subpath filter.
    /// - `commit`: Optional pinned commit.
    /// - `kind`: Operation intent.
    /// - `non_fatal`: Whether failures are demoted to warnings.
    ///
    /// Details:
    /// - A ref already planned keeps its operation and position; only the
    ///   subpath filter may change, and only when the existing filter is a
    ///   real restriction and the new call supplied a filter at all. An
    ///   unfiltered request (the empty wildcard) therefore dominates a
    ///   filtered one, while a call without a filter never clobbers one.
    pub(super) fn add_op(
        &mut self,
        remote: &str,
        target: &str,
        subpaths: Subpaths,
        commit: Option<String>,
        kind: OperationKind,
        non_fatal: bool,
    ) {
        if let Some(&i) = self.index.get(target) {
            if let Some(existing) = self.ops.get_mut(i)
                && existing.subpaths.is_filtered()
                && subpaths != Subpaths::Inherit
            {
                tracing::debug!(
                    "replacing subpath filter of planned op for {}",
                    target
                );
                existing.subpaths = subpaths;
            }
            return;
        }

        self.index.insert(target.to_string(), self.ops.len());
        self.ops.push(Operation {
            remote: remote.to_string(),
            target: target.to_string(),
            subpaths,
            commit,
            kind,
            non_fatal,
        });
    }
}
