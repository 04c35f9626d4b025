//! # collector-core
//!
//! The data model for test execution telemetry.
//!
//! This crate provides:
//! - [`TestData`], one test execution with its identity, tags and outcome
//! - [`TestHistory`] and [`TestSpan`], the nested timing trace of a test
//! - [`Payload`], the whole-run envelope, including batch partitioning and
//!   the JSON wire encoding
//! - [`RunEnv`], CI detection for the run environment descriptor
//!
//! Every type here is an owned value. Updates consume the value and hand back
//! a new one; nothing is mutated behind a shared reference.

mod history;
mod instant;
mod payload;
mod result;
mod run_env;
mod span;
mod test_data;

pub use history::{HistoryJson, TestHistory};
pub use instant::Instant;
pub use payload::{DEFAULT_BATCH_SIZE, Payload, PayloadJson};
pub use result::{FailureExpansion, TestResult};
pub use run_env::{COLLECTOR_NAME, RunEnv, RunEnvBuilder};
pub use span::{SpanJson, SpanSection, TestSpan};
pub use test_data::{TestData, TestDataJson};
