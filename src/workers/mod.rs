//! Task workers shipped with the harness.
use serde_json::{json, Map, Value};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorkerError {
    #[error("missing input parameter '{0}'")]
    MissingInput(String),
    #[error("input parameter '{name}' must be a {expected}")]
    InvalidInput { name: String, expected: &'static str },
}

/// A worker polled for tasks of one task type.
pub trait Worker: Send + Sync {
    fn task_name(&self) -> &str;

    fn execute(&self, input: &Map<String, Value>) -> Result<Map<String, Value>, WorkerError>;
}

pub fn greetings(name: &str) -> String {
    format!("Hello, {name}")
}

/// Worker for the `greetings` task type: reads `name`, returns `result`.
pub struct GreetingsWorker;

impl Worker for GreetingsWorker {
    fn task_name(&self) -> &str {
        "greetings"
    }

    fn execute(&self, input: &Map<String, Value>) -> Result<Map<String, Value>, WorkerError> {
        let name = input
            .get("name")
            .ok_or_else(|| WorkerError::MissingInput("name".to_string()))?
            .as_str()
            .ok_or_else(|| WorkerError::InvalidInput {
                name: "name".to_string(),
                expected: "string",
            })?;

        let mut output = Map::new();
        output.insert("result".to_string(), json!(greetings(name)));
        Ok(output)
    }
}

/// Every worker this crate provides.
pub fn all() -> Vec<Box<dyn Worker>> {
    vec![Box::new(GreetingsWorker)]
}
