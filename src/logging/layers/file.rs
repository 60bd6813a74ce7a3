use crate::logging::config::LoggingConfig;
use crate::Result;
use anyhow::{anyhow, Context};
use dirs_next::home_dir;
use std::fs::{create_dir_all, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{self as tracing_fmt, format, writer::BoxMakeWriter};
use tracing_subscriber::registry::LookupSpan;

/// Layer type produced by the file sink builder.
pub type FileFmtLayer<S> =
    tracing_fmt::Layer<S, format::DefaultFields, format::Format<format::Full>, BoxMakeWriter>;

/// Layer stack that already wraps the provided subscriber.
pub type FileLayerStack<S> = tracing_subscriber::layer::Layered<FileFmtLayer<S>, S>;

const LOG_FILE_NAME: &str = "conductor-cicd.log";

/// Determine where the file sink writes.
pub fn log_file_path(config: &LoggingConfig, workspace_root: Option<&Path>) -> Result<PathBuf> {
    let directory = resolve_log_dir(config, workspace_root)?;
    Ok(directory.join(LOG_FILE_NAME))
}

/// Build a tracing layer that writes to the provided file path via a non-blocking writer.
pub fn file_layer<S>(
    log_file: &Path,
    enabled: bool,
) -> Result<(FileFmtLayer<S>, Option<WorkerGuard>)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if enabled {
        ensure_log_dir(log_file)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("failed to open log file {}", log_file.display()))?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let writer = BoxMakeWriter::new(move || non_blocking.clone());
        Ok((make_layer(writer), Some(guard)))
    } else {
        Ok((make_layer(BoxMakeWriter::new(io::sink)), None))
    }
}

fn make_layer<S>(writer: BoxMakeWriter) -> FileFmtLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
}

fn ensure_log_dir(log_file: &Path) -> Result<()> {
    let directory = log_file.parent().ok_or_else(|| {
        anyhow!(
            "log file path {} has no parent directory",
            log_file.display()
        )
    })?;
    create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    Ok(())
}

fn resolve_log_dir(config: &LoggingConfig, workspace_root: Option<&Path>) -> Result<PathBuf> {
    let base = match (&config.log_dir, workspace_root) {
        (Some(custom), _) if custom.is_absolute() => custom.clone(),
        (Some(custom), Some(workspace)) => workspace.join(custom),
        (Some(custom), None) => home_base()?.join(custom),
        (None, Some(workspace)) => workspace.join(".conductor-cicd").join("logs"),
        (None, None) => home_base()?.join(".conductor-cicd").join("logs"),
    };
    Ok(base)
}

fn home_base() -> Result<PathBuf> {
    home_dir().ok_or_else(|| anyhow!("$HOME directory unavailable"))
}
