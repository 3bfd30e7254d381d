//! Interactive surfaces of the transaction, factored behind traits.
//!
//! The remote chooser is the sole interactive decision point of the core:
//! when a required runtime is offered by more than zero remotes, someone
//! has to pick one (or abort). The console implementation asks on the
//! terminal; tests and non-interactive front-ends inject a deterministic
//! strategy instead.
//!
//! User-visible transaction output flows through [`TransactionOutput`] so
//! front-ends can redirect it and tests can assert on it; the console
//! implementation prints the conventional `Warning:`/`Error:` prefixes.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

/// Strategy for selecting among candidate remotes for a dependency.
pub trait RemoteChooser {
    /// What: Choose one of the candidate remotes, or abort.
    ///
    /// Inputs:
    /// - `candidates`: Non-empty ordered list of remote names.
    ///
    /// Output:
    /// - `Some(remote)` with a value drawn from `candidates`, or `None` to
    ///   abort the selection.
    fn choose(&self, candidates: &[String]) -> Option<String>;
}

/// Interactive chooser asking on the terminal.
///
/// A single candidate collapses to a yes/no question; multiple candidates
/// are presented as a 1-based numbered menu where `0` aborts.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleChooser;

impl ConsoleChooser {
    /// What: Ask a yes/no question and read the answer from stdin.
    ///
    /// Output:
    /// - `true` for `y`/`yes` (case-insensitive), `false` otherwise
    ///   (including read failures).
    fn prompt_yes_no(question: &str) -> bool {
        print!("{question} [y/n]: ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            tracing::debug!("failed to read prompt answer, treating as no");
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    /// What: Ask for a number in `0..=max` and read it from stdin.
    ///
    /// Output:
    /// - The chosen number; `0` (abort) on unreadable or out-of-range
    ///   input.
    fn prompt_number(question: &str, max: usize) -> usize {
        print!("{question} ");
        if io::stdout().flush().is_err() {
            return 0;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            tracing::debug!("failed to read prompt answer, treating as abort");
            return 0;
        }
        match answer.trim().parse::<usize>() {
            Ok(n) if n <= max => n,
            _ => 0,
        }
    }
}

impl RemoteChooser for ConsoleChooser {
    fn choose(&self, candidates: &[String]) -> Option<String> {
        match candidates {
            [] => None,
            [only] => {
                let question = format!("Found in remote {only}, do you want to install it?");
                Self::prompt_yes_no(&question).then(|| only.clone())
            }
            _ => {
                println!("Found in several remotes:");
                for (i, remote) in candidates.iter().enumerate() {
                    println!("{}) {remote}", i + 1);
                }
                let chosen = Self::prompt_number(
                    "Which do you want to install (0 to abort)?",
                    candidates.len(),
                );
                chosen.checked_sub(1).and_then(|i| candidates.get(i).cloned())
            }
        }
    }
}

/// Deterministic chooser that always selects the first candidate.
///
/// Suitable for non-interactive front-ends that trust remote priority
/// order, and for tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SelectFirst;

impl RemoteChooser for SelectFirst {
    fn choose(&self, candidates: &[String]) -> Option<String> {
        candidates.first().cloned()
    }
}

/// Deterministic chooser that always aborts.
#[derive(Clone, Copy, Debug, Default)]
pub struct SelectNone;

impl RemoteChooser for SelectNone {
    fn choose(&self, _candidates: &[String]) -> Option<String> {
        None
    }
}

/// Sink for user-visible transaction output.
pub trait TransactionOutput: Send + Sync {
    /// What: Emit a progress message.
    fn message(&self, text: &str);

    /// What: Emit a warning about a non-fatal problem.
    fn warning(&self, text: &str);

    /// What: Emit an error message for a failed operation.
    fn error(&self, text: &str);
}

/// Console sink printing messages to stdout and diagnostics to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleOutput;

impl TransactionOutput for ConsoleOutput {
    fn message(&self, text: &str) {
        println!("{text}");
    }

    fn warning(&self, text: &str) {
        eprintln!("Warning: {text}");
    }

    fn error(&self, text: &str) {
        eprintln!("Error: {text}");
    }
}

/// Severity of a recorded output line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    /// A progress message.
    Message,
    /// A warning.
    Warning,
    /// An error message.
    Error,
}

/// Recording sink for tests and front-ends that render output themselves.
///
/// # Example
///
/// ```
/// use bundle_toolkit::interact::{OutputKind, RecordingOutput, TransactionOutput};
///
/// let output = RecordingOutput::new();
/// output.message("No updates.");
/// assert_eq!(output.lines(), vec![(OutputKind::Message, "No updates.".to_string())]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RecordingOutput {
    /// Recorded lines in emission order.
    lines: Arc<Mutex<Vec<(OutputKind, String)>>>,
}

impl RecordingOutput {
    /// What: Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// What: Snapshot the recorded lines in emission order.
    #[must_use]
    pub fn lines(&self) -> Vec<(OutputKind, String)> {
        match self.lines.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// What: Snapshot only the recorded lines of one severity.
    #[must_use]
    pub fn lines_of(&self, kind: OutputKind) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|(k, text)| (k == kind).then_some(text))
            .collect()
    }

    /// What: Append a line.
    fn record(&self, kind: OutputKind, text: &str) {
        let mut lines = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((kind, text.to_string()));
    }
}

impl TransactionOutput for RecordingOutput {
    fn message(&self, text: &str) {
        self.record(OutputKind::Message, text);
    }

    fn warning(&self, text: &str) {
        self.record(OutputKind::Warning, text);
    }

    fn error(&self, text: &str) {
        self.record(OutputKind::Error, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remotes(names: &[&str]) -> Vec<String> {
        names.iter().copied().map(ToString::to_string).collect()
    }

    #[test]
    fn test_select_first() {
        let candidates = remotes(&["flathub", "gnome-nightly"]);
        assert_eq!(SelectFirst.choose(&candidates), Some("flathub".to_string()));
        assert_eq!(SelectFirst.choose(&[]), None);
    }

    #[test]
    fn test_select_none() {
        let candidates = remotes(&["flathub"]);
        assert_eq!(SelectNone.choose(&candidates), None);
    }

    #[test]
    fn test_recording_output_orders_lines() {
        let output = RecordingOutput::new();
        output.message("Installing: org.foo/x86_64/stable from flathub");
        output.warning("Problem looking for related refs: timeout");
        output.error("Failed to install org.foo/x86_64/stable: pull failed");

        let lines = output.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].0, OutputKind::Message);
        assert_eq!(lines[1].0, OutputKind::Warning);
        assert_eq!(lines[2].0, OutputKind::Error);
        assert_eq!(output.lines_of(OutputKind::Warning).len(), 1);
    }
}
