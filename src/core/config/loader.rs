use super::{
    derive_health_url, parse_url, Credentials, HarnessConfig, HarnessFileConfig, Target,
    DEFAULT_LOCAL_PORT,
};
use crate::core::error::{HarnessError, HarnessResult};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "conductor-cicd.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load `<workspace>/conductor-cicd.toml` (optional), apply environment
    /// overrides, and resolve the result. A relative fixtures directory is
    /// anchored at the workspace.
    pub fn load_from_workspace(workspace_path: &Path) -> HarnessResult<HarnessConfig> {
        let config_path = workspace_path.join(CONFIG_FILE_NAME);
        let mut file_config = Self::load_from_file(&config_path)?.unwrap_or_default();
        Self::apply_env_overrides(&mut file_config);

        let mut resolved = Self::resolve(file_config)?;
        if resolved.fixtures_dir.is_relative() {
            resolved.fixtures_dir = workspace_path.join(&resolved.fixtures_dir);
        }
        Ok(resolved)
    }

    /// Returns Ok(None) if the file doesn't exist
    pub fn load_from_file(path: &Path) -> HarnessResult<Option<HarnessFileConfig>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)?;
        let config: HarnessFileConfig = toml::from_str(&content).map_err(|e| {
            HarnessError::config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), "loaded harness config file");
        Ok(Some(config))
    }

    pub fn apply_env_overrides(config: &mut HarnessFileConfig) {
        Self::apply_overrides_from(config, |key| env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// `ENV` selects the deployment environment; the server URL and key pair
    /// are then read from the variables suffixed with that name.
    pub fn apply_overrides_from<F>(config: &mut HarnessFileConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(environment) = lookup("ENV") {
            config.server.environment = Some(environment);
        }

        if let Some(environment) = config.server.environment.clone() {
            if let Some(url) = lookup(&format!("CONDUCTOR_SERVER_URL_{environment}")) {
                config.server.url = Some(url);
            }
            if let Some(key_id) = lookup(&format!("CONDUCTOR_AUTH_KEY_{environment}")) {
                config.server.key_id = Some(key_id);
            }
            if let Some(key_secret) = lookup(&format!("CONDUCTOR_AUTH_SECRET_{environment}")) {
                config.server.key_secret = Some(key_secret);
            }
        }

        if let Some(port) = lookup("CONDUCTOR_LOCAL_PORT").and_then(|v| v.parse::<u16>().ok()) {
            config.server.port = Some(port);
        }

        if let Some(health_url) = lookup("CONDUCTOR_HEALTH_URL") {
            config.server.health_url = Some(health_url);
        }

        if let Some(timeout) =
            lookup("CONDUCTOR_STARTUP_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok())
        {
            config.startup.timeout_secs = timeout;
        }

        if let Some(interval) =
            lookup("CONDUCTOR_POLL_INTERVAL_MS").and_then(|v| v.parse::<u64>().ok())
        {
            config.startup.poll_interval_ms = interval;
        }

        if let Some(dir) = lookup("CONDUCTOR_FIXTURES_DIR") {
            config.fixtures.dir = PathBuf::from(dir);
        }
    }

    /// Turn file-level settings into a validated [`HarnessConfig`].
    pub fn resolve(config: HarnessFileConfig) -> HarnessResult<HarnessConfig> {
        Self::validate_config(&config)?;
        let server = config.server;

        let (target, api_url) = match (&server.environment, &server.url) {
            (_, Some(url)) => (
                Target::Remote {
                    environment: server.environment.clone(),
                },
                parse_url(url, "server URL")?,
            ),
            (Some(environment), None) => {
                return Err(HarnessError::config(format!(
                    "CONDUCTOR_SERVER_URL_{environment} is not set for environment '{environment}'"
                )))
            }
            (None, None) => {
                let port = server.port.unwrap_or(DEFAULT_LOCAL_PORT);
                (
                    Target::Local { port },
                    parse_url(&format!("http://localhost:{port}/api"), "local server URL")?,
                )
            }
        };

        let health_url = match &server.health_url {
            Some(url) => parse_url(url, "health URL")?,
            None => derive_health_url(&api_url),
        };

        let credentials = match (server.key_id, server.key_secret) {
            (Some(key_id), Some(key_secret)) => Some(Credentials { key_id, key_secret }),
            (None, None) => None,
            _ => {
                return Err(HarnessError::config(
                    "auth key and auth secret must be provided together",
                ))
            }
        };

        Ok(HarnessConfig {
            target,
            api_url,
            health_url,
            credentials,
            startup_timeout: Duration::from_secs(config.startup.timeout_secs),
            poll_interval: Duration::from_millis(config.startup.poll_interval_ms),
            fixtures_dir: config.fixtures.dir,
        })
    }

    pub fn validate_config(config: &HarnessFileConfig) -> HarnessResult<()> {
        if config.startup.timeout_secs == 0 {
            return Err(HarnessError::config(
                "startup.timeout_secs must be greater than zero",
            ));
        }

        if config.startup.poll_interval_ms == 0 {
            return Err(HarnessError::config(
                "startup.poll_interval_ms must be greater than zero",
            ));
        }

        if Duration::from_millis(config.startup.poll_interval_ms)
            > Duration::from_secs(config.startup.timeout_secs)
        {
            return Err(HarnessError::config(
                "startup.poll_interval_ms cannot exceed the startup timeout",
            ));
        }

        if config.fixtures.dir.as_os_str().is_empty() {
            return Err(HarnessError::config("fixtures.dir cannot be empty"));
        }

        Ok(())
    }

    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "ENV - Deployment environment selecting the variables below",
            "CONDUCTOR_SERVER_URL_<ENV> - API URL of the server for that environment",
            "CONDUCTOR_AUTH_KEY_<ENV> - Application key id for that environment",
            "CONDUCTOR_AUTH_SECRET_<ENV> - Application key secret for that environment",
            "CONDUCTOR_LOCAL_PORT - Port of a local server when ENV is unset (default: 8080)",
            "CONDUCTOR_HEALTH_URL - Override the health endpoint",
            "CONDUCTOR_STARTUP_TIMEOUT_SECS - Upper bound on the health wait (default: 60)",
            "CONDUCTOR_POLL_INTERVAL_MS - Delay between health probes (default: 1000)",
            "CONDUCTOR_FIXTURES_DIR - Resources root holding workflows/ and test_data/",
        ]
    }
}
