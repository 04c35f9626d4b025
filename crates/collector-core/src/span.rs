//! Timed sub-operations nested inside a test.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Instant;

/// What kind of work a span measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanSection {
    Http,
    Sql,
    Sleep,
    Annotation,
}

impl SpanSection {
    pub fn as_str(self) -> &'static str {
        match self {
            SpanSection::Http => "http",
            SpanSection::Sql => "sql",
            SpanSection::Sleep => "sleep",
            SpanSection::Annotation => "annotation",
        }
    }
}

/// One traced operation (an HTTP call, a query, a sleep...) within a test.
///
/// The duration is always known; the start and end instants are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSpan {
    section: SpanSection,
    duration: Duration,
    start_at: Option<Instant>,
    end_at: Option<Instant>,
    detail: Option<String>,
}

/// Wire form of a [`TestSpan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanJson<'a> {
    pub section: SpanSection,
    pub duration: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<f64>,
}

impl TestSpan {
    /// A span with only a duration.
    pub fn new(section: SpanSection, duration: Duration) -> Self {
        Self {
            section,
            duration,
            start_at: None,
            end_at: None,
            detail: None,
        }
    }

    /// A span bounded by two instants; the duration is their difference.
    pub fn between(section: SpanSection, start_at: Instant, end_at: Instant) -> Self {
        Self {
            section,
            duration: end_at - start_at,
            start_at: Some(start_at),
            end_at: Some(end_at),
            detail: None,
        }
    }

    pub fn with_start_at(self, start_at: Instant) -> Self {
        Self {
            start_at: Some(start_at),
            ..self
        }
    }

    pub fn with_end_at(self, end_at: Instant) -> Self {
        Self {
            end_at: Some(end_at),
            ..self
        }
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..self
        }
    }

    pub fn section(&self) -> SpanSection {
        self.section
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn start_at(&self) -> Option<Instant> {
        self.start_at
    }

    pub fn end_at(&self) -> Option<Instant> {
        self.end_at
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Encodes the span with its instants as seconds since `run_started_at`.
    pub fn as_json(&self, run_started_at: Instant) -> SpanJson<'_> {
        SpanJson {
            section: self.section,
            duration: self.duration.as_secs_f64(),
            detail: self.detail.as_deref(),
            start_at: self.start_at.map(|at| at.seconds_since(run_started_at)),
            end_at: self.end_at.map(|at| at.seconds_since(run_started_at)),
        }
    }
}
