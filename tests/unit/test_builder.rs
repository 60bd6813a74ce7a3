use conductor_cicd::core::{
    build_test_request, FixtureStore, HarnessError, MockRequestBuilder, TaskMock,
    TaskResultStatus, TaskType, WorkflowDef, WorkflowTask,
};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures() -> FixtureStore {
    FixtureStore::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"))
}

#[test]
fn loan_workflow_mocks_every_flattened_task() {
    let store = fixtures();
    let definition = store.workflow_def("calculate_loan_workflow").unwrap();
    let request = MockRequestBuilder::new(&store).build(&definition).unwrap();

    assert_eq!(request.name, "calculate_loan_workflow");
    assert_eq!(request.version, 1);
    assert_eq!(request.mock_count(), 7);
    assert_eq!(request.sub_workflow_count(), 0);

    for task_ref in [
        "fetch_user_details",
        "get_credit_score",
        "calculate_loan_amount",
        "phone_number_valid_loop",
        "check_phone_number_valid",
        "record_phone_check",
        "loan_decided",
    ] {
        let mocks = request.mocks_for(task_ref).unwrap_or_else(|| panic!("{task_ref} unmocked"));
        assert_eq!(mocks, &[TaskMock::placeholder()]);
    }
}

#[test]
fn placeholder_serializes_as_completed_empty_response() {
    let store = fixtures();
    let definition = store.workflow_def("calculate_loan_workflow").unwrap();
    let request = build_test_request(&definition, &store).unwrap();
    let body = serde_json::to_value(&request).unwrap();

    assert_eq!(
        body["taskRefToMockOutput"]["get_credit_score"],
        json!([{"status": "COMPLETED", "output": {"response": {}}}])
    );
    assert_eq!(body["workflowDef"]["ownerEmail"], "loans@example.com");
    assert_eq!(body["subWorkflowTestRequest"], json!({}));
}

#[test]
fn scenario_mocks_replace_placeholders_key_by_key() {
    let store = fixtures();
    let definition = store.workflow_def("calculate_loan_workflow").unwrap();
    let mut request = build_test_request(&definition, &store).unwrap();
    request.override_mocks(store.test_inputs("loan_workflow_input").unwrap());

    assert_eq!(request.mock_count(), 7);
    let phone = request.mocks_for("check_phone_number_valid").unwrap();
    assert_eq!(phone.len(), 3);
    assert_eq!(phone[2].output.as_ref().unwrap()["valid"], json!(true));
    assert_eq!(
        request.mocks_for("loan_decided").unwrap(),
        &[TaskMock::placeholder()]
    );
}

#[test]
fn kitchensink_builds_inline_and_referenced_sub_workflows() {
    let store = fixtures();
    let definition = store.workflow_def("kitchensink").unwrap();
    let request = MockRequestBuilder::new(&store).build(&definition).unwrap();

    assert_eq!(request.mock_count(), 10);
    assert_eq!(request.sub_workflow_count(), 2);
    assert!(request.mocks_for("set_call_made").is_some());
    assert!(request.mocks_for("simple_task_3").is_some());
    assert!(request.mocks_for("inline_child_task").is_none());

    let inline = request.sub_workflow("inline_sub").unwrap();
    assert_eq!(inline.name, "inline_child");
    assert_eq!(inline.mock_count(), 1);
    assert!(inline.mocks_for("inline_child_task").is_some());

    let population = request.sub_workflow("population_min_max").unwrap();
    assert_eq!(population.name, "PopulationMinMax");
    assert_eq!(population.mock_count(), 2);
    assert_eq!(population.sub_workflow_count(), 0);
}

#[test]
fn building_twice_yields_identical_requests() {
    let store = fixtures();
    let definition = store.workflow_def("kitchensink").unwrap();
    let builder = MockRequestBuilder::new(&store);
    assert_eq!(
        builder.build(&definition).unwrap(),
        builder.build(&definition).unwrap()
    );
}

#[test]
fn unknown_named_sub_workflow_fails_without_partial_request() {
    let dir = TempDir::new().unwrap();
    let store = FixtureStore::new(dir.path());
    let definition = WorkflowDef::new("parent", 1)
        .with_task(WorkflowTask::new("first", TaskType::Simple))
        .with_task(WorkflowTask::sub_workflow_ref("child_call", "DoesNotExist", Some(1)));

    let err = build_test_request(&definition, &store).unwrap_err();
    match err {
        HarnessError::SubWorkflowResolution { task_ref, reason } => {
            assert_eq!(task_ref, "child_call");
            assert!(reason.contains("DoesNotExist"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn self_referencing_sub_workflows_are_rejected() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("workflows")).unwrap();
    fs::write(
        dir.path().join("workflows/ping.json"),
        json!({
            "name": "ping",
            "tasks": [{
                "name": "pong_call",
                "taskReferenceName": "pong_call",
                "type": "SUB_WORKFLOW",
                "subWorkflowParam": {"name": "pong"}
            }]
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        dir.path().join("workflows/pong.json"),
        json!({
            "name": "pong",
            "tasks": [{
                "name": "ping_call",
                "taskReferenceName": "ping_call",
                "type": "SUB_WORKFLOW",
                "subWorkflowParam": {"name": "ping"}
            }]
        })
        .to_string(),
    )
    .unwrap();

    let store = FixtureStore::new(dir.path());
    let definition = store.workflow_def("ping").unwrap();
    let err = build_test_request(&definition, &store).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::SubWorkflowResolution { ref task_ref, .. } if task_ref == "ping_call"
    ));
}

#[test]
fn dynamic_references_can_be_appended_after_building() {
    let store = fixtures();
    let definition = store.workflow_def("kitchensink").unwrap();
    let mut request = build_test_request(&definition, &store).unwrap();

    request.add_mock("_x_test_worker_0_0", TaskMock::default());
    request.add_mock(
        "simple_task_1",
        TaskMock::placeholder().with_status(TaskResultStatus::Failed),
    );

    assert_eq!(request.mock_count(), 11);
    assert_eq!(request.mocks_for("simple_task_1").unwrap().len(), 2);
}
