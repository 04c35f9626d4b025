//! Warning-level diagnostics sinks.
//!
//! The data model and the submitter never log through ambient global state;
//! they are handed a [`Diagnostics`] sink. Two conditions reach it: unfinished
//! test data dropped during serialization, and transport failures during
//! submission.

use std::io::Write;
use std::sync::Mutex;

/// Fixed tag every diagnostic line is prefixed with.
pub const COMPONENT_TAG: &str = "buildkite-test-collector";

/// A sink for warning-level diagnostics.
pub trait Diagnostics: Send + Sync {
    /// Records a warning.
    fn warn(&self, message: &str);
}

/// Renders a warning the way it appears on stderr.
///
/// ```
/// assert_eq!(
///     collector_proto::format_warning("oops"),
///     "buildkite-test-collector - WARNING - oops"
/// );
/// ```
pub fn format_warning(message: &str) -> String {
    format!("{} - WARNING - {}", COMPONENT_TAG, message)
}

/// Forwards warnings to `tracing`.
///
/// This is the default sink; whatever subscriber the host installed decides
/// where the line ends up.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "buildkite_test_collector", "{}", message);
    }
}

/// Writes warnings straight to stderr with the fixed component prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDiagnostics;

impl Diagnostics for StderrDiagnostics {
    fn warn(&self, message: &str) {
        let mut stderr = std::io::stderr().lock();
        // Nothing sensible to do if stderr is gone.
        let _ = writeln!(stderr, "{}", format_warning(message));
    }
}

/// Keeps every warning in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    lines: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded warnings, already formatted with the component prefix.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Number of warnings recorded so far.
    pub fn len(&self) -> usize {
        self.lines().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn warn(&self, message: &str) {
        let line = format_warning(message);
        match self.lines.lock() {
            Ok(mut lines) => lines.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }
    }
}
