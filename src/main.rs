use clap::Parser;
use conductor_cicd::{cli, logging};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();

    let stdout_reserved = args.command.reserves_stdout();
    let _logging_guard =
        match logging::init(args.workspace.as_deref(), args.verbose, stdout_reserved) {
            Ok(guard) => Some(guard),
            Err(err) => {
                eprintln!("warning: logging disabled: {err:#}");
                None
            }
        };

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
