pub mod config;
pub mod layers;

pub use layers::console::ConsoleOutput;

use crate::logging::config::LoggingConfig;
use crate::logging::layers::{console, file};
use crate::Result;
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Keeps logging sinks alive for the duration of the command.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    console_output: ConsoleOutput,
    log_file_path: Option<PathBuf>,
}

impl LoggingGuard {
    pub fn console_output(&self) -> ConsoleOutput {
        self.console_output
    }

    /// Path of the file sink, when enabled.
    pub fn log_file_path(&self) -> Option<&Path> {
        self.log_file_path.as_deref()
    }
}

/// Initialize tracing for one process.
///
/// `RUST_LOG` wins over the configured level; `verbose` lowers the
/// configured level to `debug`. When `stdout_reserved` is set the command
/// prints a machine-readable report, so console logs never go to stdout.
/// Errors when called twice.
pub fn init(
    workspace_root: Option<&Path>,
    verbose: bool,
    stdout_reserved: bool,
) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let mut config = LoggingConfig::load(workspace_root)?;
    if verbose {
        config.default_level = "debug".to_string();
    }
    if stdout_reserved {
        config.console_output = config.console_output.off_stdout();
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")?;

    type FileSubscriber = file::FileLayerStack<Registry>;

    let log_file_path = file::log_file_path(&config, workspace_root)?;
    let (file_layer, file_guard) =
        file::file_layer::<Registry>(&log_file_path, config.enable_file)?;
    let console_layer = console::console_layer::<FileSubscriber>(config.console_output);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(env_filter)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
        console_output: config.console_output,
        log_file_path: config.enable_file.then_some(log_file_path),
    })
}
