//! Replay a previously recorded execution as a test request and compare
//! a fresh execution against it.
use crate::core::model::{TaskMock, Workflow, WorkflowDef, WorkflowStatus, WorkflowTestRequest};
use std::fmt;

/// Build a request whose mocks replay every attempt recorded in `execution`.
///
/// Attempts are appended in execution order under their own reference name,
/// so a task that was retried gets one mock per recorded attempt.
pub fn request_from_execution(definition: &WorkflowDef, execution: &Workflow) -> WorkflowTestRequest {
    let mut request = WorkflowTestRequest::for_definition(definition.clone());
    for task in &execution.tasks {
        let mock = TaskMock {
            status: task.status.to_result_status(),
            output: Some(task.output_data.clone()),
            ..TaskMock::default()
        };
        request.add_mock(task.reference_task_name.clone(), mock);
    }
    request
}

/// A way in which an execution diverged from its golden record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceDifference {
    Status {
        expected: WorkflowStatus,
        actual: WorkflowStatus,
    },
    TaskCount {
        expected: usize,
        actual: usize,
    },
    TaskReference {
        position: usize,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for TraceDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceDifference::Status { expected, actual } => {
                write!(f, "workflow status: expected {expected}, got {actual}")
            }
            TraceDifference::TaskCount { expected, actual } => {
                write!(f, "executed tasks: expected {expected}, got {actual}")
            }
            TraceDifference::TaskReference {
                position,
                expected,
                actual,
            } => write!(
                f,
                "task #{position}: expected '{expected}', got '{actual}'"
            ),
        }
    }
}

/// Differences between a golden record and a fresh execution. Empty means they match.
pub fn compare(expected: &Workflow, actual: &Workflow) -> Vec<TraceDifference> {
    let mut differences = Vec::new();
    if expected.status != actual.status {
        differences.push(TraceDifference::Status {
            expected: expected.status,
            actual: actual.status,
        });
    }
    if expected.tasks.len() != actual.tasks.len() {
        differences.push(TraceDifference::TaskCount {
            expected: expected.tasks.len(),
            actual: actual.tasks.len(),
        });
    }
    for (position, (want, got)) in expected.tasks.iter().zip(&actual.tasks).enumerate() {
        if want.reference_task_name != got.reference_task_name {
            differences.push(TraceDifference::TaskReference {
                position,
                expected: want.reference_task_name.clone(),
                actual: got.reference_task_name.clone(),
            });
        }
    }
    differences
}
