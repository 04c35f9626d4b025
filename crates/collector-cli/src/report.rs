//! JSON report files produced by a test runner.
//!
//! A report lists finished tests with their durations. There are no clock
//! readings in it, so tests are laid out back to back from the run start,
//! and each test's spans back to back from the test start.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use collector_core::{
    FailureExpansion, Instant, Payload, SpanSection, TestData, TestHistory, TestResult, TestSpan,
};
use collector_proto::RunEnvironment;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid report JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("test {name:?} has an invalid duration: {value}")]
    InvalidDuration { name: String, value: f64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    pub tests: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportEntry {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub scope: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub result: Option<ReportOutcome>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub failure_expanded: Option<Vec<FailureExpansion>>,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub spans: Vec<ReportSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportOutcome {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSpan {
    pub section: SpanSection,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub detail: Option<String>,
}

fn invalid_duration(name: &str, value: f64) -> ReportError {
    ReportError::InvalidDuration {
        name: name.to_string(),
        value,
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration, ReportError> {
    Duration::try_from_secs_f64(value).map_err(|_| invalid_duration(name, value))
}

/// Moves `at` forward by `value` seconds, rejecting durations past the clock's range.
fn advance(at: Instant, name: &str, value: f64) -> Result<(Instant, Duration), ReportError> {
    let duration = seconds(name, value)?;
    let end = at
        .checked_add(duration)
        .ok_or_else(|| invalid_duration(name, value))?;
    Ok((end, duration))
}

impl Report {
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Builds a started payload whose run began at `run_started_at`.
    pub fn into_payload(
        self,
        run_env: impl RunEnvironment + 'static,
        run_started_at: Instant,
    ) -> Result<Payload, ReportError> {
        let mut payload = Payload::init(run_env).started_at_instant(run_started_at);
        let mut cursor = run_started_at;

        for entry in self.tests {
            let test = entry.into_test_data(cursor)?;
            if let Some(end_at) = test.history().end_at() {
                cursor = end_at;
            }
            payload = payload.push_test_data(test);
        }

        Ok(payload)
    }
}

impl ReportEntry {
    fn into_test_data(self, start_at: Instant) -> Result<TestData, ReportError> {
        let (end_at, duration) = advance(start_at, &self.name, self.duration)?;

        let mut history = TestHistory::starting_at(start_at)
            .with_end_at(end_at)
            .with_duration(duration);
        let mut span_cursor = start_at;
        for span in self.spans {
            let (span_end, _) = advance(span_cursor, &self.name, span.duration)?;
            let mut traced = TestSpan::between(span.section, span_cursor, span_end);
            if let Some(detail) = span.detail {
                traced = traced.with_detail(detail);
            }
            history = history.push_span(traced);
            span_cursor = span_end;
        }

        let mut test = TestData::new(
            self.id.unwrap_or_else(Uuid::new_v4),
            self.scope,
            self.name,
            history,
        );
        if let Some(location) = self.location {
            test = test.with_location(location);
        }
        if let Some(file_name) = self.file_name {
            test = test.with_file_name(file_name);
        }
        for (key, value) in self.tags {
            test = test.tag_execution(key, value);
        }

        Ok(match self.result {
            Some(ReportOutcome::Passed) => test.passed(),
            Some(ReportOutcome::Failed) => test.with_result(TestResult::Failed {
                reason: self.failure_reason,
                expanded: self.failure_expanded,
            }),
            Some(ReportOutcome::Skipped) => test.skipped(),
            None => test,
        })
    }
}
