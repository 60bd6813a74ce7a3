#[path = "../common/mod.rs"]
mod common;

use common::{harness_config, mount_health};
use conductor_cicd::core::{TaskMock, WorkflowStatus};
use conductor_cicd::session::HarnessSession;
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// References created at runtime by the dynamic fork and loop iterations.
const DYNAMIC_REFERENCES: &[&str] = &[
    "_x_test_worker_0_0",
    "_x_test_worker_0_1",
    "_x_test_worker_0_2",
    "simple_task_1__1",
    "simple_task_5",
];

fn kitchensink_execution() -> Value {
    let references = [
        "fork",
        "simple_task_1",
        "simple_task_2",
        "join",
        "decide",
        "set_call_made",
        "wait",
        "inline_sub",
        "population_min_max",
    ];
    let tasks: Vec<Value> = references
        .iter()
        .map(|reference| {
            json!({
                "referenceTaskName": reference,
                "taskType": "SIMPLE",
                "status": "COMPLETED",
                "outputData": {"response": {}}
            })
        })
        .collect();
    json!({
        "workflowId": "ks-1",
        "status": "COMPLETED",
        "tasks": tasks,
        "variables": {"call_made": true}
    })
}

#[tokio::test]
async fn kitchensink_runs_with_registered_sub_workflow() {
    let server = MockServer::start().await;
    mount_health(&server, true).await;

    Mock::given(method("POST"))
        .and(path("/api/metadata/workflow"))
        .and(body_partial_json(json!({"name": "PopulationMinMax", "version": 1})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/workflow/test"))
        .and(body_partial_json(json!({
            "name": "kitchensink",
            "taskRefToMockOutput": {
                "_x_test_worker_0_0": [{"status": "COMPLETED"}],
                "wait": [{"status": "COMPLETED", "output": {"response": {}}}]
            },
            "subWorkflowTestRequest": {
                "inline_sub": {"name": "inline_child"},
                "population_min_max": {
                    "name": "PopulationMinMax",
                    "taskRefToMockOutput": {
                        "min_max": [{"status": "COMPLETED", "output": {"response": {}}}]
                    }
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(kitchensink_execution()))
        .expect(1)
        .mount(&server)
        .await;

    let session = HarnessSession::connect(harness_config(&server)).await.unwrap();
    let registered = session.register_fixture("PopulationMinMax").await.unwrap();
    assert_eq!(registered.tasks.len(), 2);

    let mut request = session.prepare("kitchensink", None, Map::new()).unwrap();
    for reference in DYNAMIC_REFERENCES {
        request.add_mock(*reference, TaskMock::default());
    }
    assert_eq!(request.sub_workflow_count(), 2);

    let execution = session.run(&request).await.unwrap();
    session.release();

    assert_eq!(execution.status, WorkflowStatus::Completed);
    assert!(execution.task("wait").is_some());
    assert_eq!(execution.variables["call_made"], true);
}

#[tokio::test]
async fn scenario_overlay_reaches_fork_branches() {
    let server = MockServer::start().await;
    mount_health(&server, true).await;

    Mock::given(method("POST"))
        .and(path("/api/workflow/test"))
        .and(body_partial_json(json!({
            "taskRefToMockOutput": {
                "simple_task_2": [
                    {"status": "FAILED", "output": {"reason": "transient"}},
                    {"status": "COMPLETED", "output": {"key": "value2"}}
                ]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(kitchensink_execution()))
        .expect(1)
        .mount(&server)
        .await;

    let session = HarnessSession::connect(harness_config(&server)).await.unwrap();
    let request = session
        .prepare("kitchensink", Some("kitchensink_mocks"), Map::new())
        .unwrap();
    assert_eq!(request.mocks_for("simple_task_2").unwrap().len(), 2);
    assert_eq!(
        request.mocks_for("simple_task_3").unwrap(),
        &[TaskMock::placeholder()]
    );

    let execution = session.run(&request).await.unwrap();
    assert!(execution.is_completed());
}
