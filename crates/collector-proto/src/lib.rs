//! # collector-proto
//!
//! Shared seams for the test collector crates.
//!
//! This crate provides the small set of abstractions the data model and the
//! submitter are wired through:
//! - [`Diagnostics`], the sink for warning-level diagnostics
//! - [`RunEnvironment`], the opaque CI/build descriptor attached to a payload

mod diagnostics;
mod run_env;

pub use diagnostics::{
    COMPONENT_TAG, Diagnostics, RecordingDiagnostics, StderrDiagnostics, TracingDiagnostics,
    format_warning,
};
pub use run_env::RunEnvironment;
