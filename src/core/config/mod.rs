pub mod loader;

pub use loader::ConfigLoader;

use crate::core::error::{HarnessError, HarnessResult};
use crate::core::fixtures::FixtureStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_LOCAL_PORT: u16 = 8080;
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_FIXTURES_DIR: &str = "tests/fixtures";

/// Harness settings as written in `conductor-cicd.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HarnessFileConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub startup: StartupConfig,

    #[serde(default)]
    pub fixtures: FixturesConfig,
}

/// Which server to talk to and how to authenticate.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    /// Deployment environment name; selects the `CONDUCTOR_*_<ENV>` variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// API base URL of a remote server, e.g. `https://host/api`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Port of a server on localhost, used when no remote URL is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_secret: Option<String>,

    /// Health endpoint; derived from the API URL when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_url: Option<String>,
}

/// Bounds on the initial health-check wait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupConfig {
    #[serde(default = "default_startup_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_startup_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturesConfig {
    #[serde(default = "default_fixtures_dir")]
    pub dir: PathBuf,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            dir: default_fixtures_dir(),
        }
    }
}

fn default_startup_timeout_secs() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_SECS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_fixtures_dir() -> PathBuf {
    PathBuf::from(DEFAULT_FIXTURES_DIR)
}

/// Where the server lives. Both variants go through the same client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Server on localhost, such as a standalone container started by CI.
    Local { port: u16 },
    /// Remote server selected by environment name or explicit URL.
    Remote { environment: Option<String> },
}

/// Application key pair exchanged for an access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key_id: String,
    pub key_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}

/// Resolved harness configuration.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub target: Target,
    pub api_url: Url,
    pub health_url: Url,
    pub credentials: Option<Credentials>,
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
    pub fixtures_dir: PathBuf,
}

impl HarnessConfig {
    /// Configuration for a server reachable at `api_url` with default bounds.
    pub fn for_server(target: Target, api_url: Url) -> Self {
        let health_url = derive_health_url(&api_url);
        Self {
            target,
            api_url,
            health_url,
            credentials: None,
            startup_timeout: Duration::from_secs(DEFAULT_STARTUP_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            fixtures_dir: default_fixtures_dir(),
        }
    }

    pub fn local(port: u16) -> HarnessResult<Self> {
        let api_url = parse_url(&format!("http://localhost:{port}/api"), "local server URL")?;
        Ok(Self::for_server(Target::Local { port }, api_url))
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_startup_bounds(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.startup_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_fixtures_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixtures_dir = dir.into();
        self
    }

    pub fn fixtures(&self) -> FixtureStore {
        FixtureStore::new(&self.fixtures_dir)
    }
}

/// `https://host/api` becomes `https://host/health`; any other path gets `/health` appended.
pub fn derive_health_url(api_url: &Url) -> Url {
    let mut health = api_url.clone();
    let path = api_url.path().trim_end_matches('/');
    let base = path.strip_suffix("/api").unwrap_or(path);
    health.set_path(&format!("{base}/health"));
    health.set_query(None);
    health
}

pub(crate) fn parse_url(value: &str, what: &str) -> HarnessResult<Url> {
    let parsed = Url::parse(value)
        .map_err(|err| HarnessError::config(format!("invalid {what} '{value}': {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(HarnessError::config(format!(
            "{what} must use http or https, got '{value}'"
        )));
    }
    Ok(parsed)
}
