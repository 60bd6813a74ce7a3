use super::definition::WorkflowDef;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Mock sequences keyed by task reference name, as stored in `/test_data` fixtures.
pub type TaskMocks = BTreeMap<String, Vec<TaskMock>>;

/// Terminal status reported for a mocked task attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskResultStatus {
    InProgress,
    Failed,
    FailedWithTerminalError,
    #[default]
    Completed,
}

/// Synthetic result that stands in for one execution attempt of a task.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMock {
    #[serde(default)]
    pub status: TaskResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Map<String, Value>>,
    /// Simulated execution time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<u64>,
    /// Simulated queue wait in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_wait_time: Option<u64>,
}

impl TaskMock {
    /// Completed attempt whose output is `{"response": {}}`.
    pub fn placeholder() -> Self {
        let mut output = Map::new();
        output.insert("response".to_string(), json!({}));
        Self::completed(output)
    }

    pub fn completed(output: Map<String, Value>) -> Self {
        Self {
            status: TaskResultStatus::Completed,
            output: Some(output),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TaskResultStatus) -> Self {
        self.status = status;
        self
    }
}

/// Dry-run request submitted to the server's workflow test endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTestRequest {
    pub name: String,
    pub version: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default)]
    pub input: Map<String, Value>,
    pub workflow_def: WorkflowDef,
    #[serde(default)]
    pub task_ref_to_mock_output: TaskMocks,
    #[serde(default)]
    pub sub_workflow_test_request: BTreeMap<String, WorkflowTestRequest>,
}

impl WorkflowTestRequest {
    /// Empty request targeting `definition`, with no input and no mocks.
    pub fn for_definition(definition: WorkflowDef) -> Self {
        Self {
            name: definition.name.clone(),
            version: definition.version,
            correlation_id: None,
            input: Map::new(),
            workflow_def: definition,
            task_ref_to_mock_output: TaskMocks::new(),
            sub_workflow_test_request: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, input: Map<String, Value>) -> Self {
        self.input = input;
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Replace the mock sequence of every key present in `overrides`.
    /// Keys absent from `overrides` keep their current mocks.
    pub fn override_mocks(&mut self, overrides: TaskMocks) {
        self.task_ref_to_mock_output.extend(overrides);
    }

    /// Append one attempt for `task_ref`. Used for references that only exist
    /// at runtime, such as dynamic fork children.
    pub fn add_mock(&mut self, task_ref: impl Into<String>, mock: TaskMock) {
        self.task_ref_to_mock_output
            .entry(task_ref.into())
            .or_default()
            .push(mock);
    }

    pub fn mocks_for(&self, task_ref: &str) -> Option<&[TaskMock]> {
        self.task_ref_to_mock_output
            .get(task_ref)
            .map(Vec::as_slice)
    }

    pub fn sub_workflow(&self, task_ref: &str) -> Option<&WorkflowTestRequest> {
        self.sub_workflow_test_request.get(task_ref)
    }

    pub fn mock_count(&self) -> usize {
        self.task_ref_to_mock_output.len()
    }

    pub fn sub_workflow_count(&self) -> usize {
        self.sub_workflow_test_request.len()
    }
}
