pub mod args;
pub mod commands;

pub use args::{BuildArgs, FixtureArgs, HealthArgs, RunArgs, VerifyArgs};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
HARNESS COMMANDS:\n{subcommands}\n\
{after-help}\n";

#[derive(Parser)]
#[command(name = "conductor-cicd")]
#[command(version = crate::VERSION)]
#[command(about = "Build mocked test requests for workflows and verify them against a Conductor server")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_help = "Server selection: set ENV plus CONDUCTOR_SERVER_URL_<ENV>, CONDUCTOR_AUTH_KEY_<ENV> and CONDUCTOR_AUTH_SECRET_<ENV>, or leave ENV unset to target http://localhost:8080."
)]
pub struct Args {
    /// Workspace holding conductor-cicd.toml (default: current directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub workspace: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(
        about = "Print the mocked test request for a workflow",
        long_about = "Build walks the definition, mocks every task with a completed placeholder, recurses into sub-workflows, and prints the request as JSON. No server is contacted.",
        after_help = "Example:\n    conductor-cicd build kitchensink --scenario kitchensink_mocks"
    )]
    Build(BuildArgs),
    #[command(
        about = "Submit a mocked test request and report the execution",
        long_about = "Run waits for the server to be healthy, registers any requested definitions, submits the test request, and fails unless the workflow completes.",
        after_help = "Example:\n    conductor-cicd run kitchensink --register PopulationMinMax"
    )]
    Run(RunArgs),
    #[command(
        about = "Replay a golden execution and compare the result",
        long_about = "Verify mocks every task with the outputs recorded in workflows/<NAME>_run.json, runs the workflow, and compares status and executed tasks.",
        after_help = "Example:\n    conductor-cicd verify workflow1"
    )]
    Verify(VerifyArgs),
    #[command(
        about = "Wait for the server to report healthy",
        after_help = "Example:\n    conductor-cicd health --timeout 30"
    )]
    Health(HealthArgs),
}

impl Command {
    /// Whether stdout carries JSON meant for another program.
    pub fn reserves_stdout(&self) -> bool {
        match self {
            Command::Build(_) => true,
            Command::Run(run_args) => run_args.json,
            Command::Verify(_) | Command::Health(_) => false,
        }
    }
}

pub async fn run(args: Args) -> crate::Result<()> {
    let workspace = args.workspace.clone();
    match args.command {
        Command::Build(build_args) => commands::build(workspace.as_deref(), build_args),
        Command::Run(run_args) => commands::run(workspace.as_deref(), run_args).await,
        Command::Verify(verify_args) => commands::verify(workspace.as_deref(), verify_args).await,
        Command::Health(health_args) => commands::health(workspace.as_deref(), health_args).await,
    }
}
