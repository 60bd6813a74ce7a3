//! Serde model of the documents exchanged with the workflow server.
pub mod definition;
pub mod execution;
pub mod request;

pub use definition::{SubWorkflowDefinition, SubWorkflowParams, TaskType, WorkflowDef, WorkflowTask};
pub use execution::{Task, TaskStatus, Workflow, WorkflowStatus};
pub use request::{TaskMock, TaskMocks, TaskResultStatus, WorkflowTestRequest};
