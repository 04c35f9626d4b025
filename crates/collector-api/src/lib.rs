//! # collector-api
//!
//! Uploads collected test payloads to the Test Engine analytics API.
//!
//! A payload is split into size-bounded batches and each batch is sent as its
//! own request. Submission yields one outcome per batch and never gives up on
//! the remaining batches because one of them failed.

pub mod api;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use api::TestAnalyticsApi;
pub use config::{API_TOKEN_VAR, API_URL_VAR, CollectorConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use error::{CollectorError, Result};
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{ApiResponse, UploadReceipt};
