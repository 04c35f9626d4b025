//! A single test execution.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::{FailureExpansion, HistoryJson, Instant, TestHistory, TestResult, TestSpan};

/// One test execution: identity, location, timing trace, tags and outcome.
///
/// Hosts drive the lifecycle by chaining the consuming update methods:
///
/// ```
/// use collector_core::TestData;
/// use uuid::Uuid;
///
/// let test = TestData::start(Uuid::new_v4(), "billing", "charges the card", None, None)
///     .tag_execution("shard", "3")
///     .passed()
///     .finish();
/// assert!(test.is_finished());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TestData {
    id: Uuid,
    scope: String,
    name: String,
    location: Option<String>,
    file_name: Option<String>,
    history: TestHistory,
    tags: BTreeMap<String, String>,
    result: Option<TestResult>,
}

/// Wire form of a [`TestData`].
///
/// `location` and `file_name` are always present (possibly `null`); `tags`,
/// `result` and the failure fields only when they carry something.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestDataJson<'a> {
    pub id: String,
    pub scope: &'a str,
    pub name: &'a str,
    pub location: Option<&'a str>,
    pub file_name: Option<&'a str>,
    pub history: HistoryJson<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_expanded: Option<&'a [FailureExpansion]>,
}

impl TestData {
    /// Builds a record around an existing history.
    pub fn new(
        id: Uuid,
        scope: impl Into<String>,
        name: impl Into<String>,
        history: TestHistory,
    ) -> Self {
        Self {
            id,
            scope: scope.into(),
            name: name.into(),
            location: None,
            file_name: None,
            history,
            tags: BTreeMap::new(),
            result: None,
        }
    }

    /// Starts a test now: the history's start instant is stamped, there is no
    /// result and no tags.
    pub fn start(
        id: Uuid,
        scope: impl Into<String>,
        name: impl Into<String>,
        location: Option<String>,
        file_name: Option<String>,
    ) -> Self {
        Self {
            location,
            file_name,
            ..Self::new(id, scope, name, TestHistory::starting_at(Instant::now()))
        }
    }

    pub fn with_location(self, location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..self
        }
    }

    pub fn with_file_name(self, file_name: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            ..self
        }
    }

    /// Replaces the whole timing trace.
    pub fn with_history(self, history: TestHistory) -> Self {
        Self { history, ..self }
    }

    /// Sets a tag, overwriting any previous value for the same key.
    pub fn tag_execution(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Stamps the end of the test and its duration.
    ///
    /// Finishing an already finished test returns it untouched, so the first
    /// end instant wins.
    pub fn finish(self) -> Self {
        if self.is_finished() {
            return self;
        }

        let end_at = Instant::now();
        let history = match self.history.start_at() {
            Some(start_at) => self
                .history
                .with_end_at(end_at)
                .with_duration(end_at - start_at),
            None => self.history.with_end_at(end_at),
        };
        Self { history, ..self }
    }

    pub fn passed(self) -> Self {
        self.with_result(TestResult::Passed)
    }

    pub fn failed(
        self,
        reason: Option<String>,
        expanded: Option<Vec<FailureExpansion>>,
    ) -> Self {
        self.with_result(TestResult::Failed { reason, expanded })
    }

    pub fn skipped(self) -> Self {
        self.with_result(TestResult::Skipped)
    }

    /// Sets the outcome; a later call replaces an earlier one.
    pub fn with_result(self, result: TestResult) -> Self {
        Self {
            result: Some(result),
            ..self
        }
    }

    /// Appends a span to the test's history.
    pub fn push_span(self, span: TestSpan) -> Self {
        let history = self.history.push_span(span);
        Self { history, ..self }
    }

    pub fn is_finished(&self) -> bool {
        self.history.is_finished()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn history(&self) -> &TestHistory {
        &self.history
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// The outcome, `None` while the test has not concluded.
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    /// Encodes the record with all instants relative to `run_started_at`.
    pub fn as_json(&self, run_started_at: Instant) -> TestDataJson<'_> {
        let (failure_reason, failure_expanded) = match &self.result {
            Some(TestResult::Failed { reason, expanded }) => {
                (reason.as_deref(), expanded.as_deref())
            }
            _ => (None, None),
        };

        TestDataJson {
            id: self.id.to_string(),
            scope: &self.scope,
            name: &self.name,
            location: self.location.as_deref(),
            file_name: self.file_name.as_deref(),
            history: self.history.as_json(run_started_at),
            tags: (!self.tags.is_empty()).then_some(&self.tags),
            result: self.result.as_ref().map(TestResult::as_str),
            failure_reason,
            failure_expanded,
        }
    }
}
