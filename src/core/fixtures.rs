use crate::core::builder::DefinitionResolver;
use crate::core::error::{HarnessError, HarnessResult};
use crate::core::model::{TaskMocks, Workflow, WorkflowDef};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub const WORKFLOWS_DIR: &str = "workflows";
pub const TEST_DATA_DIR: &str = "test_data";
const RUN_SUFFIX: &str = "_run";

/// Read-only view over a resources root holding JSON fixtures:
///
/// - `workflows/<name>.json`: workflow definitions
/// - `workflows/<name>_run.json`: golden execution records
/// - `test_data/<name>.json`: scenario mocks keyed by task reference name
#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a resource path such as `/workflows/kitchensink.json` under the root.
    pub fn path_of(&self, resource: &str) -> PathBuf {
        self.root.join(resource.trim_start_matches('/'))
    }

    pub fn load_json<T: DeserializeOwned>(&self, resource: &str) -> HarnessResult<T> {
        let path = self.path_of(resource);
        trace!(path = %path.display(), "loading fixture");
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(HarnessError::FixtureNotFound { path })
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&content).map_err(|source| HarnessError::FixtureParse { path, source })
    }

    pub fn workflow_def(&self, name: &str) -> HarnessResult<WorkflowDef> {
        self.load_json(&format!("{WORKFLOWS_DIR}/{name}.json"))
    }

    /// Golden execution record stored next to the definition.
    pub fn execution(&self, name: &str) -> HarnessResult<Workflow> {
        self.load_json(&format!("{WORKFLOWS_DIR}/{name}{RUN_SUFFIX}.json"))
    }

    pub fn test_inputs(&self, name: &str) -> HarnessResult<TaskMocks> {
        self.load_json(&format!("{TEST_DATA_DIR}/{name}.json"))
    }

    pub fn has_workflow_def(&self, name: &str) -> bool {
        self.path_of(&format!("{WORKFLOWS_DIR}/{name}.json")).is_file()
    }

    /// Names of every definition fixture, excluding golden `_run` records.
    pub fn workflow_names(&self) -> HarnessResult<Vec<String>> {
        let dir = self.root.join(WORKFLOWS_DIR);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                    return None;
                }
                let stem = path.file_stem()?.to_str()?.to_string();
                (!stem.ends_with(RUN_SUFFIX)).then_some(stem)
            })
            .collect();
        names.sort();
        Ok(names)
    }
}

impl DefinitionResolver for FixtureStore {
    fn resolve(&self, name: &str, version: Option<i32>) -> HarnessResult<WorkflowDef> {
        // Fixtures are keyed by name only.
        if let Some(version) = version {
            debug!(name, version, "resolving sub-workflow fixture by name");
        }
        self.workflow_def(name)
    }
}
