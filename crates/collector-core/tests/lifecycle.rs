//! End-to-end lifecycle of test records flowing into an upload payload.

use std::time::Duration;

use collector_core::{
    DEFAULT_BATCH_SIZE, Instant, Payload, RunEnvBuilder, SpanSection, TestData, TestResult,
    TestSpan,
};
use collector_proto::RecordingDiagnostics;
use serde_json::Value;
use uuid::Uuid;

fn run_env() -> collector_core::RunEnv {
    RunEnvBuilder::new([("CI", "true")]).build().unwrap()
}

#[test]
fn test_suite_run_produces_wire_payload() {
    let diagnostics = RecordingDiagnostics::new();
    let payload = Payload::init(run_env()).started();

    let passing = TestData::start(
        Uuid::new_v4(),
        "checkout",
        "applies discount",
        Some("tests/checkout.rs:40".to_string()),
        Some("tests/checkout.rs".to_string()),
    );
    let span_start = Instant::now();
    let passing = passing
        .push_span(
            TestSpan::between(
                SpanSection::Http,
                span_start,
                span_start + Duration::from_millis(30),
            )
            .with_detail("GET /prices"),
        )
        .tag_execution("region", "eu")
        .passed()
        .finish();

    let failing = TestData::start(Uuid::new_v4(), "checkout", "rejects expired card", None, None)
        .failed(Some("expected Err, got Ok".to_string()), None)
        .finish();

    let skipped = TestData::start(Uuid::new_v4(), "checkout", "legacy flow", None, None)
        .skipped()
        .finish();

    let payload = payload
        .push_test_data(passing.clone())
        .push_test_data(failing)
        .push_test_data(skipped);

    let batches = payload.into_batches(DEFAULT_BATCH_SIZE);
    assert_eq!(batches.len(), 1);

    let bytes = batches[0].to_json_bytes(&diagnostics).unwrap();
    let wire: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(wire["format"], "json");
    assert_eq!(wire["run_env"]["CI"], "generic");

    let data = wire["data"].as_array().unwrap();
    let results: Vec<&str> = data.iter().map(|t| t["result"].as_str().unwrap()).collect();
    assert_eq!(results, vec!["passed", "failed", "skipped"]);

    assert_eq!(data[0]["id"], passing.id().to_string());
    assert_eq!(data[0]["tags"]["region"], "eu");
    assert_eq!(data[0]["history"]["children"][0]["detail"], "GET /prices");
    assert_eq!(data[1]["failure_reason"], "expected Err, got Ok");
    assert!(diagnostics.is_empty());
}

#[test]
fn test_push_is_a_snapshot_boundary() {
    let test = TestData::start(Uuid::new_v4(), "s", "n", None, None);
    let payload = Payload::init(run_env()).started().push_test_data(test.clone());

    let _later = test.passed().finish();

    let snapshot = &payload.data()[0];
    assert!(snapshot.result().is_none());
    assert!(!snapshot.is_finished());
}

#[test]
fn test_crashed_test_never_reaches_the_wire() {
    let diagnostics = RecordingDiagnostics::new();
    let payload = Payload::init(run_env())
        .started()
        .push_test_data(
            TestData::start(Uuid::new_v4(), "s", "fine", None, None)
                .passed()
                .finish(),
        )
        .push_test_data(TestData::start(Uuid::new_v4(), "s", "crashed", None, None).passed());

    let wire: Value = serde_json::from_slice(&payload.to_json_bytes(&diagnostics).unwrap()).unwrap();

    let data = wire["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["name"], "fine");
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_result_overwrite_keeps_last() {
    let test = TestData::start(Uuid::new_v4(), "s", "n", None, None)
        .failed(Some("flaky".to_string()), None)
        .passed();
    assert_eq!(test.result(), Some(&TestResult::Passed));
}
