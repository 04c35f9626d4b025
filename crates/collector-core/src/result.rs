use std::collections::BTreeMap;

/// One block of structured failure detail: a label mapped to its lines,
/// e.g. `{"expanded": [...], "backtrace": [...]}`.
pub type FailureExpansion = BTreeMap<String, Vec<String>>;

/// The outcome of a concluded test.
///
/// A test that has not concluded yet carries no result at all, see
/// [`TestData::result`](crate::TestData::result).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Passed,
    Failed {
        reason: Option<String>,
        expanded: Option<Vec<FailureExpansion>>,
    },
    Skipped,
}

impl TestResult {
    /// Wire name of the outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestResult::Passed => "passed",
            TestResult::Failed { .. } => "failed",
            TestResult::Skipped => "skipped",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TestResult::Failed { .. })
    }
}
