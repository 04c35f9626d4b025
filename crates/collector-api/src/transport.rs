//! The HTTP seam of the submitter.
//!
//! [`TestAnalyticsApi`](crate::TestAnalyticsApi) only needs "post these bytes
//! and tell me what came back". Keeping that behind [`Transport`] lets tests
//! script responses and failures without a network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::error::Result;
use crate::types::ApiResponse;

/// A request that never produced a response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{0}")]
    ConnectTimeout(String),

    #[error("{0}")]
    ReadTimeout(String),

    #[error("{0}")]
    Connect(String),

    #[error("{0}")]
    Request(String),
}

impl TransportError {
    /// Stable name of the failure, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::ConnectTimeout(_) => "ConnectTimeout",
            TransportError::ReadTimeout(_) => "ReadTimeout",
            TransportError::Connect(_) => "ConnectionError",
            TransportError::Request(_) => "RequestError",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() && err.is_connect() {
            TransportError::ConnectTimeout(message)
        } else if err.is_timeout() {
            TransportError::ReadTimeout(message)
        } else if err.is_connect() {
            TransportError::Connect(message)
        } else {
            TransportError::Request(message)
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body to `url` with the given `Authorization` header value.
    async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        body: Vec<u8>,
    ) -> std::result::Result<ApiResponse, TransportError>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        body: Vec<u8>,
    ) -> std::result::Result<ApiResponse, TransportError> {
        debug!("Posting {} bytes to {}", body.len(), url);

        let response = self
            .client
            .post(url)
            .header("accept", "application/json")
            .header("content-type", "application/json")
            .header("authorization", authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Upload responded with {}", status);

        Ok(ApiResponse::new(status, body))
    }
}
