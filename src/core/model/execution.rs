use super::definition::null_as_default;
use super::request::TaskResultStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
    TimedOut,
    Terminated,
    Paused,
}

impl WorkflowStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, WorkflowStatus::Running | WorkflowStatus::Paused)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WorkflowStatus::Running => "RUNNING",
            WorkflowStatus::Completed => "COMPLETED",
            WorkflowStatus::Failed => "FAILED",
            WorkflowStatus::TimedOut => "TIMED_OUT",
            WorkflowStatus::Terminated => "TERMINATED",
            WorkflowStatus::Paused => "PAUSED",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Scheduled,
    InProgress,
    Canceled,
    Failed,
    FailedWithTerminalError,
    Completed,
    CompletedWithErrors,
    TimedOut,
    Skipped,
}

impl TaskStatus {
    /// Status to report when replaying this attempt as a mock.
    pub fn to_result_status(self) -> TaskResultStatus {
        match self {
            TaskStatus::Scheduled | TaskStatus::InProgress => TaskResultStatus::InProgress,
            TaskStatus::Canceled | TaskStatus::Failed | TaskStatus::TimedOut => {
                TaskResultStatus::Failed
            }
            TaskStatus::FailedWithTerminalError => TaskResultStatus::FailedWithTerminalError,
            TaskStatus::Completed | TaskStatus::CompletedWithErrors | TaskStatus::Skipped => {
                TaskResultStatus::Completed
            }
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TaskStatus::Scheduled => "SCHEDULED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Canceled => "CANCELED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::FailedWithTerminalError => "FAILED_WITH_TERMINAL_ERROR",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            TaskStatus::TimedOut => "TIMED_OUT",
            TaskStatus::Skipped => "SKIPPED",
        };
        f.write_str(text)
    }
}

/// One executed task attempt in an execution record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub reference_task_name: String,
    #[serde(default)]
    pub task_type: String,
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_data: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output_data: Map<String, Value>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub iteration: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Execution record returned by the server for a (test) workflow run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    pub status: WorkflowStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Workflow {
    pub fn is_completed(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }

    /// First executed attempt with the given reference name.
    pub fn task(&self, reference_task_name: &str) -> Option<&Task> {
        self.tasks
            .iter()
            .find(|task| task.reference_task_name == reference_task_name)
    }

    /// All attempts with the given reference name, in execution order.
    pub fn attempts(&self, reference_task_name: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.reference_task_name == reference_task_name)
            .collect()
    }

    pub fn executed_references(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .map(|task| task.reference_task_name.as_str())
            .collect()
    }
}
