//! The whole-run envelope and its batching.

use std::sync::Arc;

use collector_proto::{Diagnostics, RunEnvironment};
use serde::Serialize;

use crate::{Instant, TestData, TestDataJson};

/// Number of test records per upload request unless the caller asks otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Everything collected during one suite run.
///
/// Test data keeps its insertion order. Batching and encoding never modify
/// the payload they are called on.
#[derive(Debug, Clone)]
pub struct Payload {
    run_env: Arc<dyn RunEnvironment>,
    data: Vec<TestData>,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
}

/// Wire form of a [`Payload`]: the body of one upload request.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadJson<'a> {
    pub format: &'static str,
    pub run_env: serde_json::Value,
    pub data: Vec<TestDataJson<'a>>,
}

impl Payload {
    /// An empty, unstarted payload for the given run environment.
    pub fn init(run_env: impl RunEnvironment + 'static) -> Self {
        Self::with_run_env(Arc::new(run_env))
    }

    /// Same as [`Payload::init`] for an already shared descriptor.
    pub fn with_run_env(run_env: Arc<dyn RunEnvironment>) -> Self {
        Self {
            run_env,
            data: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Marks the suite as started now.
    pub fn started(self) -> Self {
        Self {
            started_at: Some(Instant::now()),
            ..self
        }
    }

    /// Marks the suite as started at a known instant.
    pub fn started_at_instant(self, started_at: Instant) -> Self {
        Self {
            started_at: Some(started_at),
            ..self
        }
    }

    /// Marks the suite as finished now.
    pub fn finished(self) -> Self {
        Self {
            finished_at: Some(Instant::now()),
            ..self
        }
    }

    /// Appends a snapshot of a test record.
    pub fn push_test_data(mut self, test_data: TestData) -> Self {
        self.data.push(test_data);
        self
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    pub fn run_env(&self) -> &Arc<dyn RunEnvironment> {
        &self.run_env
    }

    pub fn data(&self) -> &[TestData] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Splits the payload into copies holding at most `batch_size` records each.
    ///
    /// Order is preserved within and across batches, and every batch shares
    /// this payload's run environment and timestamps. A payload that fits in
    /// one batch (including an empty one) yields exactly one batch. A batch
    /// size of zero is treated as one.
    ///
    /// An unstarted payload stamps its encoding origin as every batch's start,
    /// so a test encodes the same offsets whichever batch it lands in.
    pub fn into_batches(&self, batch_size: usize) -> Vec<Payload> {
        let batch_size = batch_size.max(1);
        let started_at = self.origin();
        if self.data.len() <= batch_size {
            return vec![self.with_data(self.data.clone(), started_at)];
        }

        self.data
            .chunks(batch_size)
            .map(|chunk| self.with_data(chunk.to_vec(), started_at))
            .collect()
    }

    fn with_data(&self, data: Vec<TestData>, started_at: Instant) -> Payload {
        Payload {
            run_env: Arc::clone(&self.run_env),
            data,
            started_at: Some(started_at),
            finished_at: self.finished_at,
        }
    }

    /// Instant all offsets in the wire form are measured from.
    ///
    /// Falls back to the earliest recorded test start when the payload was
    /// never started.
    fn origin(&self) -> Instant {
        self.started_at
            .or_else(|| {
                self.data
                    .iter()
                    .filter_map(|test| test.history().start_at())
                    .min()
            })
            .unwrap_or_else(Instant::now)
    }

    /// Encodes the finished test records.
    ///
    /// Unfinished records have no meaningful duration and are dropped; a
    /// warning goes to `diagnostics` when that happens.
    pub fn as_json(&self, diagnostics: &dyn Diagnostics) -> PayloadJson<'_> {
        let finished: Vec<&TestData> = self.data.iter().filter(|test| test.is_finished()).collect();

        if finished.len() < self.data.len() {
            tracing::debug!(
                dropped = self.data.len() - finished.len(),
                "Dropping unfinished test data from payload"
            );
            diagnostics.warn("Unexpected unfinished test data, skipping unfinished test records...");
        }

        let origin = self.origin();
        PayloadJson {
            format: "json",
            run_env: self.run_env.as_json(),
            data: finished.into_iter().map(|test| test.as_json(origin)).collect(),
        }
    }

    /// Serializes the wire form to the bytes of a request body.
    pub fn to_json_bytes(&self, diagnostics: &dyn Diagnostics) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.as_json(diagnostics))
    }
}
