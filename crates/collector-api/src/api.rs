use crate::config::CollectorConfig;
use crate::error::Result;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::ApiResponse;
use collector_core::Payload;
use collector_proto::{Diagnostics, StderrDiagnostics};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Client for the Test Engine uploads endpoint.
pub struct TestAnalyticsApi {
    config: CollectorConfig,
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl TestAnalyticsApi {
    /// Create an API client with configuration
    pub fn new(config: CollectorConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout())?;

        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create API client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(CollectorConfig::from_env())
    }

    /// Create an API client on top of an existing transport
    ///
    /// Warnings are written to stderr as `buildkite-test-collector - WARNING - ...`
    pub fn with_transport(config: CollectorConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            diagnostics: Arc::new(StderrDiagnostics),
        }
    }

    /// Route warnings to a different sink
    ///
    /// Pass `TracingDiagnostics` to hand them to the installed `tracing`
    /// subscriber instead of stderr.
    pub fn with_diagnostics(self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            diagnostics,
            ..self
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Whether a usable token is configured
    pub fn is_enabled(&self) -> bool {
        self.config.api_token().is_some()
    }

    /// Submit a payload in batches of at most `batch_size` test records.
    ///
    /// The returned stream yields exactly one item per batch, in batch order.
    /// A batch's request is only sent when its item is polled, and batches go
    /// out one at a time. `None` marks a batch that was not accepted: no
    /// token configured, a transport failure, or a non-2xx response. A failed
    /// batch does not stop the ones after it. Dropping the stream skips the
    /// remaining batches.
    pub fn submit(
        &self,
        payload: Payload,
        batch_size: usize,
    ) -> impl Stream<Item = Option<ApiResponse>> + Send + '_ {
        let batches = payload.into_batches(batch_size);
        debug!("Submitting {} test records in {} batches", payload.len(), batches.len());

        stream::iter(batches).then(move |batch| self.submit_batch(batch))
    }

    async fn submit_batch(&self, batch: Payload) -> Option<ApiResponse> {
        let token = self.config.api_token()?;

        let body = match batch.to_json_bytes(self.diagnostics.as_ref()) {
            Ok(body) => body,
            Err(err) => {
                self.diagnostics
                    .warn(&format!("SerializationError: {}", err));
                return None;
            }
        };

        let url = self.config.uploads_url();
        let authorization = format!("Token token=\"{}\"", token);

        match self.transport.post_json(&url, &authorization, body).await {
            Ok(response) if response.is_success() => {
                info!(
                    "Uploaded {} test records ({})",
                    batch.len(),
                    response.status_code()
                );
                Some(response)
            }
            Ok(response) => {
                debug!(
                    "Upload rejected with status {}: {}",
                    response.status_code(),
                    response.body()
                );
                None
            }
            Err(err) => {
                self.diagnostics.warn(&format!("{}: {}", err.kind(), err));
                None
            }
        }
    }
}
