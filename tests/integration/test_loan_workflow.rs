#[path = "../common/mod.rs"]
mod common;

use common::{harness_config, mount_health};
use conductor_cicd::core::{HarnessError, TaskMock, Workflow, WorkflowStatus};
use conductor_cicd::session::with_session;
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn loan_input() -> Map<String, Value> {
    let mut input = Map::new();
    input.insert("userEmail".to_string(), json!("user@example.com"));
    input.insert("loanAmount".to_string(), json!(11000));
    input
}

fn task(reference: &str, input: Value, output: Value) -> Value {
    json!({
        "referenceTaskName": reference,
        "taskType": "SIMPLE",
        "status": "COMPLETED",
        "inputData": input,
        "outputData": output
    })
}

/// Execution a server produces for the loan scenario mocks.
fn loan_execution() -> Value {
    json!({
        "workflowId": "loan-1",
        "status": "COMPLETED",
        "input": {"userEmail": "user@example.com", "loanAmount": 11000},
        "output": {
            "accountNumber": 12345,
            "creditRating": 750,
            "authorizedLoanAmount": 10000,
            "phoneNumberValid": true
        },
        "tasks": [
            task("fetch_user_details", json!({"userEmail": "user@example.com"}), json!({"userAccount": 12345})),
            task("get_credit_score", json!({"userAccountNumber": 12345}), json!({"creditRating": 750})),
            task(
                "calculate_loan_amount",
                json!({"creditRating": 750, "loanAmount": 11000}),
                json!({"authorizedLoanAmount": 10000})
            ),
            task("phone_number_valid_loop", json!({}), json!({"iteration": 3})),
            task("check_phone_number_valid", json!({"accountNumber": 12345}), json!({"valid": false})),
            task("check_phone_number_valid", json!({"accountNumber": 12345}), json!({"valid": false})),
            task("check_phone_number_valid", json!({"accountNumber": 12345}), json!({"valid": true}))
        ]
    })
}

async fn run_loan_scenario(server: &MockServer) -> Result<Workflow, HarnessError> {
    with_session(harness_config(server), |session| async move {
        let request = session.prepare(
            "calculate_loan_workflow",
            Some("loan_workflow_input"),
            loan_input(),
        )?;
        assert_eq!(request.mock_count(), 7);
        assert_eq!(
            request.mocks_for("loan_decided").unwrap(),
            &[TaskMock::placeholder()]
        );
        session.run(&request).await
    })
    .await
}

#[tokio::test]
async fn loan_workflow_completes_with_scenario_mocks() {
    let server = MockServer::start().await;
    mount_health(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/workflow/test"))
        .and(body_partial_json(json!({
            "name": "calculate_loan_workflow",
            "version": 1,
            "input": {"userEmail": "user@example.com", "loanAmount": 11000},
            "taskRefToMockOutput": {
                "fetch_user_details": [{"status": "COMPLETED", "output": {"userAccount": 12345}}],
                "check_phone_number_valid": [
                    {"status": "COMPLETED", "output": {"valid": false}},
                    {"status": "COMPLETED", "output": {"valid": false}},
                    {"status": "COMPLETED", "output": {"valid": true}}
                ]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(loan_execution()))
        .expect(1)
        .mount(&server)
        .await;

    let execution = run_loan_scenario(&server).await.unwrap();

    assert_eq!(execution.status, WorkflowStatus::Completed);
    assert_eq!(execution.tasks.len(), 7);
    assert_eq!(execution.input["userEmail"], "user@example.com");
    assert_eq!(execution.input["loanAmount"].to_string(), "11000");

    let fetch = &execution.tasks[0];
    let credit = &execution.tasks[1];
    let loan = &execution.tasks[2];
    assert_eq!(fetch.input_data["userEmail"], "user@example.com");
    assert_eq!(fetch.output_data["userAccount"], 12345);
    assert_eq!(credit.input_data["userAccountNumber"], 12345);
    assert_eq!(credit.output_data["creditRating"], 750);
    assert_eq!(loan.input_data["creditRating"], 750);
    assert_eq!(loan.output_data["authorizedLoanAmount"], 10000);

    let validity: Vec<&Value> = execution.tasks[4..]
        .iter()
        .map(|attempt| &attempt.output_data["valid"])
        .collect();
    assert_eq!(validity, vec![&json!(false), &json!(false), &json!(true)]);

    assert_eq!(execution.output["accountNumber"], 12345);
    assert_eq!(execution.output["creditRating"], 750);
    assert_eq!(execution.output["authorizedLoanAmount"], 10000);
    assert_eq!(execution.output["phoneNumberValid"], true);
}

#[tokio::test]
async fn unknown_scenario_fails_before_the_server_is_called() {
    let server = MockServer::start().await;
    mount_health(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/workflow/test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(loan_execution()))
        .expect(0)
        .mount(&server)
        .await;

    let err = with_session(harness_config(&server), |session| async move {
        let request = session.prepare("calculate_loan_workflow", Some("no_such_scenario"), Map::new())?;
        session.run(&request).await
    })
    .await
    .unwrap_err();
    assert!(matches!(err, HarnessError::FixtureNotFound { .. }));
}
