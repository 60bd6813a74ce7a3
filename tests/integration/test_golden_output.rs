#[path = "../common/mod.rs"]
mod common;

use assert_cmd::Command;
use common::{fixtures_dir, harness_config, mount_health};
use conductor_cicd::core::golden::{compare, request_from_execution, TraceDifference};
use conductor_cicd::core::{FixtureStore, TaskResultStatus, WorkflowStatus};
use conductor_cicd::session::HarnessSession;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn golden_body() -> Value {
    let raw = fs::read_to_string(fixtures_dir().join("workflows/workflow1_run.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn golden_request_replays_every_attempt_under_its_own_reference() {
    let store = FixtureStore::new(fixtures_dir());
    let definition = store.workflow_def("workflow1").unwrap();
    let golden = store.execution("workflow1").unwrap();

    let request = request_from_execution(&definition, &golden);
    assert_eq!(request.mock_count(), 2);

    let fact = request.mocks_for("get_random_fact").unwrap();
    assert_eq!(fact.len(), 2);
    assert_eq!(fact[0].status, TaskResultStatus::Failed);
    assert_eq!(fact[1].status, TaskResultStatus::Completed);
    assert_eq!(
        fact[1].output.as_ref().unwrap()["response"]["statusCode"],
        200
    );

    let summary = request.mocks_for("summarize_fact").unwrap();
    assert_eq!(summary[0].output.as_ref().unwrap()["summary"], "Cats sleep a lot");
}

#[tokio::test]
async fn replayed_execution_matches_golden_record() {
    let server = MockServer::start().await;
    mount_health(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/workflow/test"))
        .and(body_partial_json(json!({
            "name": "workflow1",
            "taskRefToMockOutput": {
                "get_random_fact": [{"status": "FAILED"}, {"status": "COMPLETED"}],
                "summarize_fact": [{"status": "COMPLETED"}]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(golden_body()))
        .expect(1)
        .mount(&server)
        .await;

    let session = HarnessSession::connect(harness_config(&server)).await.unwrap();
    let definition = session.fixtures().workflow_def("workflow1").unwrap();
    let golden = session.fixtures().execution("workflow1").unwrap();

    let actual = session
        .run(&request_from_execution(&definition, &golden))
        .await
        .unwrap();
    assert_eq!(actual.tasks.len(), golden.tasks.len());
    assert!(compare(&golden, &actual).is_empty());
}

#[tokio::test]
async fn diverging_execution_is_reported() {
    let server = MockServer::start().await;
    mount_health(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/workflow/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "FAILED",
            "tasks": [
                {"referenceTaskName": "get_random_fact", "taskType": "HTTP", "status": "FAILED"}
            ]
        })))
        .mount(&server)
        .await;

    let session = HarnessSession::connect(harness_config(&server)).await.unwrap();
    let definition = session.fixtures().workflow_def("workflow1").unwrap();
    let golden = session.fixtures().execution("workflow1").unwrap();
    let actual = session
        .run(&request_from_execution(&definition, &golden))
        .await
        .unwrap();

    let differences = compare(&golden, &actual);
    assert!(differences.contains(&TraceDifference::Status {
        expected: WorkflowStatus::Completed,
        actual: WorkflowStatus::Failed,
    }));
    assert!(differences.contains(&TraceDifference::TaskCount {
        expected: 3,
        actual: 1,
    }));
}

#[tokio::test(flavor = "multi_thread")]
async fn verify_command_passes_against_matching_server() {
    let server = MockServer::start().await;
    mount_health(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/workflow/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(golden_body()))
        .mount(&server)
        .await;

    let workspace = TempDir::new().unwrap();
    let api_url = format!("{}/api", server.uri());
    let fixtures = fixtures_dir();

    let assert = tokio::task::spawn_blocking(move || {
        Command::new(assert_cmd::cargo::cargo_bin!("conductor-cicd"))
            .env("ENV", "GOLDEN")
            .env("CONDUCTOR_SERVER_URL_GOLDEN", api_url)
            .env("CONDUCTOR_STARTUP_TIMEOUT_SECS", "5")
            .env("CONDUCTOR_POLL_INTERVAL_MS", "50")
            .env("CONDUCTOR_FIXTURES_DIR", fixtures)
            .arg("--workspace")
            .arg(workspace.path())
            .args(["verify", "workflow1"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("matches golden execution"));
}
