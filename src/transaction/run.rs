//! Transaction execution: dispatching the plan against the store.

use crate::cancel::CancelToken;
use crate::error::{BundleToolkitError, Result};
use crate::refs;
use crate::transaction::Transaction;
use crate::types::OperationKind;

/// Length of the commit prefix shown after a successful update.
const SHORT_COMMIT_LEN: usize = 12;

/// The concrete action an operation narrowed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    /// Dispatch to the store's install entry point.
    Install,
    /// Dispatch to the store's update entry point.
    Update,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Install => f.write_str("install"),
            Self::Update => f.write_str("update"),
        }
    }
}

impl Transaction {
    /// What: Execute the planned operations in insertion order.
    ///
    /// Inputs:
    /// - `stop_on_first_error`: Halt on the first fatal failure and
    ///   propagate its concrete error, instead of continuing and reporting
    ///   a generic failure at the end.
    /// - `cancel`: Cooperative cancellation token, checked between
    ///   operations and inside store calls.
    ///
    /// Details:
    /// - An operation carrying both intents is narrowed here by probing
    ///   the scope once: installed means update, absent means install.
    /// - An update the store reports as already at the target revision is
    ///   success ("No updates.").
    /// - Failures of non-fatal operations warn and never fail the
    ///   transaction. Cancellation counts as a failure of the pending
    ///   operation and obeys the same policy.
    /// - The transaction is consumed; its resources are released on return
    ///   whether execution succeeded or not.
    ///
    /// # Errors
    ///
    /// With `stop_on_first_error`, the first fatal store error (or
    /// `Cancelled`). Otherwise [`BundleToolkitError::Failed`] when at
    /// least one fatal operation failed.
    pub fn run(self, stop_on_first_error: bool, cancel: &CancelToken) -> Result<()> {
        let flags = self.options.pull_flags();
        let mut failed = false;

        for op in self.plan.operations() {
            let pretty = refs::pretty(&op.target).unwrap_or(&op.target);

            let action = match op.kind {
                OperationKind::Install => Action::Install,
                OperationKind::Update => Action::Update,
                OperationKind::InstallOrUpdate => {
                    if self.scope.deployed_path(&op.target).is_some() {
                        Action::Update
                    } else {
                        Action::Install
                    }
                }
            };

            let result = cancel.check().and_then(|()| match action {
                Action::Install => {
                    self.output
                        .message(&format!("Installing: {pretty} from {}", op.remote));
                    self.scope
                        .install(flags, &op.remote, &op.target, &op.subpaths, cancel)
                }
                Action::Update => {
                    self.output
                        .message(&format!("Updating: {pretty} from {}", op.remote));
                    let updated = self.scope.update(
                        flags,
                        &op.remote,
                        &op.target,
                        op.commit.as_deref(),
                        &op.subpaths,
                        cancel,
                    );
                    match updated {
                        Ok(()) => {
                            if let Some(data) = self.scope.deploy_data(&op.target) {
                                let short: String =
                                    data.commit.chars().take(SHORT_COMMIT_LEN).collect();
                                self.output.message(&format!("Now at {short}."));
                            }
                            Ok(())
                        }
                        Err(BundleToolkitError::AlreadyInstalled(_)) => {
                            self.output.message("No updates.");
                            Ok(())
                        }
                        Err(error) => Err(error),
                    }
                }
            });

            if let Err(error) = result {
                if op.non_fatal {
                    self.output
                        .warning(&format!("Failed to {action} {pretty}: {error}"));
                } else if stop_on_first_error {
                    return Err(error);
                } else {
                    self.output
                        .error(&format!("Failed to {action} {pretty}: {error}"));
                    failed = true;
                }
            }
        }

        if failed {
            Err(BundleToolkitError::Failed)
        } else {
            Ok(())
        }
    }
}
