use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct FixtureArgs {
    /// Resources root holding workflows/ and test_data/ (overrides configuration)
    #[arg(long, value_name = "DIR")]
    pub fixtures: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Name of the definition fixture (workflows/<NAME>.json)
    #[arg(value_name = "NAME")]
    pub workflow: String,

    /// Overlay mocks from test_data/<SCENARIO>.json
    #[arg(long, value_name = "SCENARIO")]
    pub scenario: Option<String>,

    /// Workflow input as a JSON object
    #[arg(long, value_name = "JSON")]
    pub input: Option<String>,

    #[command(flatten)]
    pub fixture_args: FixtureArgs,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Name of the definition fixture (workflows/<NAME>.json)
    #[arg(value_name = "NAME")]
    pub workflow: String,

    /// Overlay mocks from test_data/<SCENARIO>.json
    #[arg(long, value_name = "SCENARIO")]
    pub scenario: Option<String>,

    /// Workflow input as a JSON object
    #[arg(long, value_name = "JSON")]
    pub input: Option<String>,

    /// Register these definition fixtures before running (repeatable)
    #[arg(long = "register", value_name = "NAME")]
    pub register: Vec<String>,

    /// Print the full execution record as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub fixture_args: FixtureArgs,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Workflow whose golden record lives at workflows/<NAME>_run.json
    #[arg(value_name = "NAME")]
    pub workflow: String,

    #[command(flatten)]
    pub fixture_args: FixtureArgs,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Override the startup wait bound (seconds)
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}
