use crate::core::error::{HarnessError, HarnessResult};
use crate::core::model::{
    SubWorkflowDefinition, TaskMock, WorkflowDef, WorkflowTask, WorkflowTestRequest,
};
use tracing::debug;

/// Looks up a workflow definition referenced by name from a sub-workflow task.
pub trait DefinitionResolver {
    fn resolve(&self, name: &str, version: Option<i32>) -> HarnessResult<WorkflowDef>;
}

/// Builds a test request that mocks every task of a definition with a
/// completed placeholder, recursing into inline and referenced sub-workflows.
pub struct MockRequestBuilder<'a, R: DefinitionResolver + ?Sized> {
    resolver: &'a R,
}

impl<'a, R: DefinitionResolver + ?Sized> MockRequestBuilder<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        Self { resolver }
    }

    /// Build the request tree for `definition`.
    ///
    /// Fails with [`HarnessError::SubWorkflowResolution`] when a named
    /// sub-workflow cannot be resolved; no partial request is returned.
    pub fn build(&self, definition: &WorkflowDef) -> HarnessResult<WorkflowTestRequest> {
        let mut chain = vec![definition.name.clone()];
        self.build_level(definition, &mut chain)
    }

    fn build_level(
        &self,
        definition: &WorkflowDef,
        chain: &mut Vec<String>,
    ) -> HarnessResult<WorkflowTestRequest> {
        let mut request = WorkflowTestRequest::for_definition(definition.clone());

        for task in definition.collect_tasks() {
            request
                .task_ref_to_mock_output
                .insert(task.task_reference_name.clone(), vec![TaskMock::placeholder()]);

            if task.is_sub_workflow() {
                let nested = self.build_sub_workflow(task, chain)?;
                request
                    .sub_workflow_test_request
                    .insert(task.task_reference_name.clone(), nested);
            }
        }

        debug!(
            workflow = %definition.name,
            mocks = request.mock_count(),
            sub_workflows = request.sub_workflow_count(),
            "built test request"
        );
        Ok(request)
    }

    fn build_sub_workflow(
        &self,
        task: &WorkflowTask,
        chain: &mut Vec<String>,
    ) -> HarnessResult<WorkflowTestRequest> {
        let task_ref = task.task_reference_name.as_str();
        let params = task
            .sub_workflow_param
            .as_ref()
            .ok_or_else(|| HarnessError::sub_workflow(task_ref, "task has no subWorkflowParam"))?;

        match &params.workflow_definition {
            Some(SubWorkflowDefinition::Inline(inline)) => self.build_level(inline, chain),
            Some(SubWorkflowDefinition::Expression(expression)) => Err(HarnessError::sub_workflow(
                task_ref,
                format!("definition is a runtime expression ({expression})"),
            )),
            None => {
                let name = params.name.as_deref().ok_or_else(|| {
                    HarnessError::sub_workflow(task_ref, "neither an inline definition nor a name")
                })?;
                if chain.iter().any(|seen| seen == name) {
                    return Err(HarnessError::sub_workflow(
                        task_ref,
                        format!("'{name}' refers back to itself through {}", chain.join(" -> ")),
                    ));
                }

                let resolved = self
                    .resolver
                    .resolve(name, params.version)
                    .map_err(|err| match err {
                        HarnessError::FixtureNotFound { path } => HarnessError::sub_workflow(
                            task_ref,
                            format!("no definition for '{name}' at {}", path.display()),
                        ),
                        other => other,
                    })?;

                chain.push(name.to_string());
                let nested = self.build_level(&resolved, chain);
                chain.pop();
                nested
            }
        }
    }
}

/// Shorthand for `MockRequestBuilder::new(resolver).build(definition)`.
pub fn build_test_request<R: DefinitionResolver + ?Sized>(
    definition: &WorkflowDef,
    resolver: &R,
) -> HarnessResult<WorkflowTestRequest> {
    MockRequestBuilder::new(resolver).build(definition)
}
