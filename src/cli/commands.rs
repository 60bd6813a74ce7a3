use crate::{
    cli::args::{BuildArgs, FixtureArgs, HealthArgs, RunArgs, VerifyArgs},
    client::ConductorClient,
    core::{
        golden::{self, TraceDifference},
        ConfigLoader, HarnessConfig, MockRequestBuilder, Workflow,
    },
    session::{self, HarnessSession},
    Result,
};
use anyhow::{anyhow, Context};
use serde_json::{Map, Value};
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, warn};
use uuid::Uuid;

fn workspace_root(workspace: Option<&Path>) -> Result<PathBuf> {
    match workspace {
        Some(path) => Ok(path.to_path_buf()),
        None => env::current_dir().context("failed to determine current directory"),
    }
}

fn load_config(workspace: Option<&Path>, fixture_args: Option<&FixtureArgs>) -> Result<HarnessConfig> {
    let root = workspace_root(workspace)?;
    let mut config = ConfigLoader::load_from_workspace(&root)?;
    if let Some(dir) = fixture_args.and_then(|args| args.fixtures.as_ref()) {
        config = config.with_fixtures_dir(dir);
    }
    Ok(config)
}

/// Parse `--input` as a JSON object; absent means an empty input.
fn parse_input(raw: Option<&str>) -> Result<Map<String, Value>> {
    match raw {
        None => Ok(Map::new()),
        Some(text) => match serde_json::from_str::<Value>(text)
            .with_context(|| format!("--input is not valid JSON: {text}"))?
        {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!("--input must be a JSON object, got {other}")),
        },
    }
}

fn correlation_id(workflow: &str) -> String {
    format!("{workflow}-{}", Uuid::new_v4())
}

pub fn build(workspace: Option<&Path>, args: BuildArgs) -> Result<()> {
    let config = load_config(workspace, Some(&args.fixture_args))?;
    let fixtures = config.fixtures();
    let definition = fixtures.workflow_def(&args.workflow)?;

    let mut request = MockRequestBuilder::new(&fixtures)
        .build(&definition)?
        .with_input(parse_input(args.input.as_deref())?);
    if let Some(scenario) = args.scenario.as_deref() {
        request.override_mocks(fixtures.test_inputs(scenario)?);
    }

    info!(
        workflow = %args.workflow,
        mocks = request.mock_count(),
        sub_workflows = request.sub_workflow_count(),
        "built test request"
    );
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

pub async fn run(workspace: Option<&Path>, args: RunArgs) -> Result<()> {
    let config = load_config(workspace, Some(&args.fixture_args))?;
    let input = parse_input(args.input.as_deref())?;
    let RunArgs {
        workflow,
        scenario,
        register,
        json,
        ..
    } = args;

    let execution = session::with_session(config, |session| {
        let workflow = workflow.clone();
        async move {
            for name in &register {
                session.register_fixture(name).await?;
            }
            let request = session
                .prepare(&workflow, scenario.as_deref(), input)?
                .with_correlation_id(correlation_id(&workflow));
            session.run(&request).await
        }
    })
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&execution)?);
    } else {
        print_summary(&execution);
    }

    if execution.is_completed() {
        Ok(())
    } else {
        Err(anyhow!(
            "workflow {} finished with status {}",
            workflow,
            execution.status
        ))
    }
}

pub async fn verify(workspace: Option<&Path>, args: VerifyArgs) -> Result<()> {
    let config = load_config(workspace, Some(&args.fixture_args))?;
    let fixtures = config.fixtures();
    let definition = fixtures.workflow_def(&args.workflow)?;
    let golden_run = fixtures.execution(&args.workflow)?;

    let request = golden::request_from_execution(&definition, &golden_run)
        .with_input(golden_run.input.clone())
        .with_correlation_id(correlation_id(&args.workflow));

    let session = HarnessSession::connect(config).await?;
    let outcome = session.run(&request).await;
    session.release();
    let actual = outcome?;

    let differences = golden::compare(&golden_run, &actual);
    report_differences(&args.workflow, &differences);
    if differences.is_empty() {
        println!("{}: matches golden execution", args.workflow);
        Ok(())
    } else {
        Err(anyhow!(
            "{}: {} difference(s) from golden execution",
            args.workflow,
            differences.len()
        ))
    }
}

pub async fn health(workspace: Option<&Path>, args: HealthArgs) -> Result<()> {
    let mut config = load_config(workspace, None)?;
    if let Some(seconds) = args.timeout {
        if seconds == 0 {
            return Err(anyhow!("--timeout must be greater than zero"));
        }
        let timeout = Duration::from_secs(seconds);
        let poll = config.poll_interval.min(timeout);
        config = config.with_startup_bounds(timeout, poll);
    }

    let client = ConductorClient::new(&config);
    session::wait_until_healthy(&client, config.startup_timeout, config.poll_interval).await?;
    println!("{} is healthy", config.health_url);
    Ok(())
}

fn summary_lines(execution: &Workflow) -> Vec<String> {
    let mut lines = vec![
        format!("Workflow ID: {}", execution.workflow_id.as_deref().unwrap_or("-")),
        format!("Status: {}", execution.status),
        format!("Tasks executed: {}", execution.tasks.len()),
    ];
    lines.extend(execution.tasks.iter().map(|task| {
        format!(
            "  {} [{}] {}",
            task.reference_task_name, task.task_type, task.status
        )
    }));
    lines
}

fn print_summary(execution: &Workflow) {
    for line in summary_lines(execution) {
        println!("{line}");
    }
}

fn report_differences(workflow: &str, differences: &[TraceDifference]) {
    for difference in differences {
        warn!(workflow, %difference, "golden mismatch");
        println!("  {difference}");
    }
}
