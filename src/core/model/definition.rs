use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

fn default_version() -> i32 {
    1
}

fn default_task_type() -> String {
    TaskType::Simple.as_str().to_string()
}

/// Treat an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Named, versioned workflow definition as exported by the server.
///
/// Fields the harness does not inspect are kept in `extra` so a definition
/// loaded from a fixture is submitted back to the server unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDef {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<WorkflowTask>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDef {
    pub fn new(name: impl Into<String>, version: i32) -> Self {
        Self {
            name: name.into(),
            version,
            tasks: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_task(mut self, task: WorkflowTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Every task descriptor reachable from this definition, including tasks
    /// nested in fork branches, decision/switch cases and loop bodies.
    ///
    /// Inline sub-workflow definitions belong to their own definition and are
    /// not descended into.
    pub fn collect_tasks(&self) -> Vec<&WorkflowTask> {
        let mut collected = Vec::new();
        for task in &self.tasks {
            task.collect_into(&mut collected);
        }
        collected
    }
}

/// Task kinds the harness distinguishes. Anything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Simple,
    SubWorkflow,
    ForkJoin,
    ForkJoinDynamic,
    Join,
    Decision,
    Switch,
    DoWhile,
    Other,
}

impl TaskType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "SIMPLE" => TaskType::Simple,
            "SUB_WORKFLOW" => TaskType::SubWorkflow,
            "FORK_JOIN" => TaskType::ForkJoin,
            "FORK_JOIN_DYNAMIC" => TaskType::ForkJoinDynamic,
            "JOIN" => TaskType::Join,
            "DECISION" => TaskType::Decision,
            "SWITCH" => TaskType::Switch,
            "DO_WHILE" => TaskType::DoWhile,
            _ => TaskType::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Simple => "SIMPLE",
            TaskType::SubWorkflow => "SUB_WORKFLOW",
            TaskType::ForkJoin => "FORK_JOIN",
            TaskType::ForkJoinDynamic => "FORK_JOIN_DYNAMIC",
            TaskType::Join => "JOIN",
            TaskType::Decision => "DECISION",
            TaskType::Switch => "SWITCH",
            TaskType::DoWhile => "DO_WHILE",
            TaskType::Other => "OTHER",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a workflow definition.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTask {
    #[serde(default)]
    pub name: String,
    pub task_reference_name: String,
    #[serde(rename = "type", default = "default_task_type")]
    pub task_type: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub fork_tasks: Vec<Vec<WorkflowTask>>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub decision_cases: BTreeMap<String, Vec<WorkflowTask>>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub default_case: Vec<WorkflowTask>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub loop_over: Vec<WorkflowTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow_param: Option<SubWorkflowParams>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowTask {
    pub fn new(task_reference_name: impl Into<String>, task_type: TaskType) -> Self {
        let task_reference_name = task_reference_name.into();
        Self {
            name: task_reference_name.clone(),
            task_reference_name,
            task_type: task_type.as_str().to_string(),
            fork_tasks: Vec::new(),
            decision_cases: BTreeMap::new(),
            default_case: Vec::new(),
            loop_over: Vec::new(),
            sub_workflow_param: None,
            extra: Map::new(),
        }
    }

    /// Sub-workflow task that points at a definition by name.
    pub fn sub_workflow_ref(
        task_reference_name: impl Into<String>,
        workflow_name: impl Into<String>,
        version: Option<i32>,
    ) -> Self {
        let mut task = Self::new(task_reference_name, TaskType::SubWorkflow);
        task.sub_workflow_param = Some(SubWorkflowParams {
            name: Some(workflow_name.into()),
            version,
            workflow_definition: None,
            extra: Map::new(),
        });
        task
    }

    /// Sub-workflow task that embeds its definition.
    pub fn sub_workflow_inline(task_reference_name: impl Into<String>, definition: WorkflowDef) -> Self {
        let mut task = Self::new(task_reference_name, TaskType::SubWorkflow);
        task.sub_workflow_param = Some(SubWorkflowParams {
            name: Some(definition.name.clone()),
            version: Some(definition.version),
            workflow_definition: Some(SubWorkflowDefinition::Inline(Box::new(definition))),
            extra: Map::new(),
        });
        task
    }

    pub fn kind(&self) -> TaskType {
        TaskType::from_name(&self.task_type)
    }

    pub fn is_sub_workflow(&self) -> bool {
        self.kind() == TaskType::SubWorkflow
    }

    /// Direct child tasks, in declaration order. Only the list that belongs
    /// to the task's kind is followed; other kinds have no children.
    pub fn children(&self) -> Vec<&WorkflowTask> {
        match self.kind() {
            TaskType::ForkJoin => self.fork_tasks.iter().flatten().collect(),
            TaskType::Decision | TaskType::Switch => self
                .decision_cases
                .values()
                .flatten()
                .chain(self.default_case.iter())
                .collect(),
            TaskType::DoWhile => self.loop_over.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn collect_into<'a>(&'a self, collected: &mut Vec<&'a WorkflowTask>) {
        collected.push(self);
        for child in self.children() {
            child.collect_into(collected);
        }
    }
}

/// Parameters of a `SUB_WORKFLOW` task.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubWorkflowParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_definition: Option<SubWorkflowDefinition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `workflowDefinition` is either an embedded definition or an expression
/// the server evaluates at runtime.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SubWorkflowDefinition {
    Inline(Box<WorkflowDef>),
    Expression(String),
}
