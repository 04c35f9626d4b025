//! Batch submission outcomes against a scripted transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use collector_api::{
    API_TOKEN_VAR, API_URL_VAR, ApiResponse, CollectorConfig, TestAnalyticsApi, Transport,
    TransportError,
};
use collector_core::{DEFAULT_BATCH_SIZE, Payload, RunEnvBuilder, TestData};
use collector_proto::RecordingDiagnostics;
use futures::StreamExt;
use uuid::Uuid;

type Outcome = Result<ApiResponse, TransportError>;

/// Replays canned outcomes in order and remembers every URL it was asked for.
#[derive(Default)]
struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Outcome>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(outcomes: Vec<Outcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            urls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &str,
        _authorization: &str,
        _body: Vec<u8>,
    ) -> Result<ApiResponse, TransportError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request")
    }
}

fn accepted() -> Outcome {
    Ok(ApiResponse::new(
        202,
        serde_json::json!({
            "id": Uuid::new_v4().to_string(),
            "run_id": Uuid::new_v4().to_string(),
            "queued": 1,
            "skipped": 0,
            "errors": [],
            "run_url": "https://buildkite.com/organizations/acme/analytics/suites/test/runs/1"
        })
        .to_string(),
    ))
}

fn env_with_token() -> Vec<(&'static str, String)> {
    vec![
        ("CI", "true".to_string()),
        (API_TOKEN_VAR, Uuid::new_v4().to_string()),
    ]
}

fn successful_test() -> TestData {
    TestData::start(Uuid::new_v4(), "api", "returns ok", None, None)
        .passed()
        .finish()
}

fn failed_test() -> TestData {
    TestData::start(Uuid::new_v4(), "api", "returns error", None, None)
        .failed(Some("boom".to_string()), None)
        .finish()
}

fn payload(tests: Vec<TestData>) -> Payload {
    let run_env = RunEnvBuilder::new([("CI", "true")]).build().unwrap();
    tests
        .into_iter()
        .fold(Payload::init(run_env).started(), Payload::push_test_data)
}

fn api(
    vars: Vec<(&'static str, String)>,
    transport: Arc<ScriptedTransport>,
) -> (TestAnalyticsApi, Arc<RecordingDiagnostics>) {
    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let api = TestAnalyticsApi::with_transport(CollectorConfig::from_vars(vars), transport)
        .with_diagnostics(diagnostics.clone());
    (api, diagnostics)
}

#[tokio::test]
async fn test_missing_token_yields_none_per_batch_without_requests() {
    let transport = ScriptedTransport::new(vec![]);
    let (api, _) = api(vec![("CI", "true".to_string())], transport.clone());

    let results: Vec<_> = api
        .submit(payload(vec![successful_test(), failed_test(), successful_test()]), 2)
        .collect()
        .await;

    assert_eq!(results, vec![None, None]);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_whitespace_token_yields_none() {
    let transport = ScriptedTransport::new(vec![]);
    let (api, _) = api(
        vec![("CI", "true".to_string()), (API_TOKEN_VAR, "\n".to_string())],
        transport.clone(),
    );

    let mut results = Box::pin(api.submit(payload(vec![]), DEFAULT_BATCH_SIZE));
    assert_eq!(results.next().await, Some(None));
    assert_eq!(results.next().await, None);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_connect_timeout_is_logged_and_yields_none() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::ConnectTimeout(
        "Error".to_string(),
    ))]);
    let (api, diagnostics) = api(env_with_token(), transport);

    let results: Vec<_> = api
        .submit(payload(vec![successful_test()]), DEFAULT_BATCH_SIZE)
        .collect()
        .await;

    assert_eq!(results, vec![None]);
    let lines = diagnostics.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("buildkite-test-collector - WARNING -"));
    assert!(lines[0].contains("ConnectTimeout"));
}

#[tokio::test]
async fn test_read_timeout_is_logged_and_yields_none() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::ReadTimeout(
        "Error".to_string(),
    ))]);
    let (api, diagnostics) = api(env_with_token(), transport);

    let results: Vec<_> = api
        .submit(payload(vec![successful_test()]), DEFAULT_BATCH_SIZE)
        .collect()
        .await;

    assert_eq!(results, vec![None]);
    let lines = diagnostics.lines();
    assert!(lines[0].starts_with("buildkite-test-collector - WARNING -"));
    assert!(lines[0].contains("ReadTimeout"));
}

#[tokio::test]
async fn test_successful_upload_returns_response() {
    let transport = ScriptedTransport::new(vec![accepted()]);
    let (api, diagnostics) = api(env_with_token(), transport.clone());

    let results: Vec<_> = api
        .submit(payload(vec![successful_test()]), DEFAULT_BATCH_SIZE)
        .collect()
        .await;

    let response = results[0].as_ref().expect("batch should be accepted");
    assert!((200..300).contains(&response.status_code()));

    let receipt = response.receipt().unwrap();
    assert!(receipt.errors.is_empty());
    assert_eq!(receipt.queued, 1);

    assert_eq!(
        transport.urls(),
        vec!["https://analytics-api.buildkite.com/v1/uploads"]
    );
    assert!(diagnostics.is_empty());
}

#[tokio::test]
async fn test_rejected_upload_yields_none() {
    let transport = ScriptedTransport::new(vec![Ok(ApiResponse::new(
        401,
        r#"{"error":"bad token"}"#,
    ))]);
    let (api, diagnostics) = api(env_with_token(), transport);

    let results: Vec<_> = api
        .submit(payload(vec![successful_test()]), DEFAULT_BATCH_SIZE)
        .collect()
        .await;

    assert_eq!(results, vec![None]);
    assert!(diagnostics.is_empty());
}

#[tokio::test]
async fn test_large_payload_is_batched() {
    let transport = ScriptedTransport::new(vec![accepted(), accepted()]);
    let (api, _) = api(env_with_token(), transport.clone());

    let results: Vec<_> = api
        .submit(payload(vec![successful_test(), failed_test()]), 1)
        .collect()
        .await;

    assert_eq!(results.len(), 2);
    for result in &results {
        let response = result.as_ref().expect("batch should be accepted");
        assert!(response.is_success());
        assert_eq!(response.receipt().unwrap().queued, 1);
    }
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_failed_batch_does_not_stop_the_next() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::ConnectTimeout("Error".to_string())),
        accepted(),
    ]);
    let (api, diagnostics) = api(env_with_token(), transport);

    let results: Vec<_> = api
        .submit(payload(vec![successful_test(), failed_test()]), 1)
        .collect()
        .await;

    assert_eq!(results.len(), 2);
    assert!(results[0].is_none());
    let lines = diagnostics.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("ConnectTimeout"));

    let response = results[1].as_ref().expect("second batch should be accepted");
    assert!(response.is_success());
    assert_eq!(response.receipt().unwrap().queued, 1);
}

#[tokio::test]
async fn test_connection_errors_are_recovered_too() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::Connect("connection refused".to_string())),
        accepted(),
    ]);
    let (api, diagnostics) = api(env_with_token(), transport);

    let results: Vec<_> = api
        .submit(payload(vec![successful_test(), successful_test()]), 1)
        .collect()
        .await;

    assert!(results[0].is_none());
    assert!(results[1].is_some());
    assert!(diagnostics.lines()[0].contains("ConnectionError: connection refused"));
}

#[tokio::test]
async fn test_api_url_override() {
    let upload_id = Uuid::new_v4().to_string();
    let transport = ScriptedTransport::new(vec![Ok(ApiResponse::new(
        202,
        serde_json::json!({"upload_id": upload_id}).to_string(),
    ))]);

    let mut vars = env_with_token();
    vars.push((API_URL_VAR, "http://something-else.example.com/v1".to_string()));
    let (api, _) = api(vars, transport.clone());

    let results: Vec<_> = api
        .submit(payload(vec![successful_test()]), DEFAULT_BATCH_SIZE)
        .collect()
        .await;

    let response = results[0].as_ref().expect("batch should be accepted");
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["upload_id"], upload_id);
    assert_eq!(
        transport.urls(),
        vec!["http://something-else.example.com/v1/uploads"]
    );
}
