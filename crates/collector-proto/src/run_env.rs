//! Run environment descriptor abstraction.
//!
//! A payload carries exactly one descriptor of the CI/build context the suite
//! ran under. The collector never inspects it beyond asking for its JSON form,
//! so hosts can plug in their own descriptor when the built-in CI detection
//! does not fit.

use std::fmt::Debug;

/// An opaque description of where a test run executed.
pub trait RunEnvironment: Debug + Send + Sync {
    /// Encodes the descriptor for the `run_env` field of an upload.
    fn as_json(&self) -> serde_json::Value;
}

impl RunEnvironment for serde_json::Value {
    fn as_json(&self) -> serde_json::Value {
        self.clone()
    }
}
