use std::path::PathBuf;
use std::time::Duration;

/// Result alias used by the harness library surface.
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Failures surfaced by fixture loading, request building, and server calls.
///
/// None of these are retried. They propagate to the caller, which for the
/// integration suites means the test fails.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("No file found at {}", path.display())]
    FixtureNotFound { path: PathBuf },

    #[error("failed to parse fixture {}: {source}", path.display())]
    FixtureParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot resolve sub-workflow for task '{task_ref}': {reason}")]
    SubWorkflowResolution { task_ref: String, reason: String },

    #[error("server health check at {url} did not succeed within {waited:?}")]
    ExternalServiceUnavailable { url: String, waited: Duration },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    pub fn sub_workflow(task_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SubWorkflowResolution {
            task_ref: task_ref.into(),
            reason: reason.into(),
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the error came from the fixture tree rather than the server.
    pub fn is_fixture_error(&self) -> bool {
        matches!(
            self,
            Self::FixtureNotFound { .. } | Self::FixtureParse { .. }
        )
    }
}
