use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A completed HTTP exchange: status code and raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Parse the body as an upload receipt.
    pub fn receipt(&self) -> serde_json::Result<UploadReceipt> {
        self.json()
    }
}

/// Body returned by a successful upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadReceipt {
    pub id: Option<String>,
    pub run_id: Option<String>,
    pub queued: u64,
    pub skipped: u64,
    pub errors: Vec<serde_json::Value>,
    pub run_url: Option<String>,
}
