//! The root of a test's timing tree.

use std::time::Duration;

use serde::Serialize;

use crate::{Instant, SpanJson, TestSpan};

/// Overall timings of a test execution plus the spans traced inside it.
///
/// Spans are kept in the order they were pushed. Ordering and overlap between
/// spans are not checked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestHistory {
    start_at: Option<Instant>,
    end_at: Option<Instant>,
    duration: Option<Duration>,
    children: Vec<TestSpan>,
}

/// Wire form of a [`TestHistory`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryJson<'a> {
    pub section: &'static str,
    pub children: Vec<SpanJson<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl TestHistory {
    /// A history that started at `start_at` and has not finished.
    pub fn starting_at(start_at: Instant) -> Self {
        Self {
            start_at: Some(start_at),
            ..Self::default()
        }
    }

    pub fn with_end_at(self, end_at: Instant) -> Self {
        Self {
            end_at: Some(end_at),
            ..self
        }
    }

    /// Sets the stored duration. It is never recomputed from the instants.
    pub fn with_duration(self, duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            ..self
        }
    }

    /// Appends a span after every span already recorded.
    pub fn push_span(mut self, span: TestSpan) -> Self {
        self.children.push(span);
        self
    }

    /// A history is finished once it has an end instant.
    pub fn is_finished(&self) -> bool {
        self.end_at.is_some()
    }

    pub fn start_at(&self) -> Option<Instant> {
        self.start_at
    }

    pub fn end_at(&self) -> Option<Instant> {
        self.end_at
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn children(&self) -> &[TestSpan] {
        &self.children
    }

    /// Encodes the history and its spans relative to `run_started_at`.
    pub fn as_json(&self, run_started_at: Instant) -> HistoryJson<'_> {
        HistoryJson {
            section: "top",
            children: self
                .children
                .iter()
                .map(|span| span.as_json(run_started_at))
                .collect(),
            start_at: self.start_at.map(|at| at.seconds_since(run_started_at)),
            end_at: self.end_at.map(|at| at.seconds_since(run_started_at)),
            duration: self.duration.map(|duration| duration.as_secs_f64()),
        }
    }
}
