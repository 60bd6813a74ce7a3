//! Shared server session for a group of workflow tests.
//!
//! A session is acquired once before the group runs (health wait plus
//! authentication) and released once after it, whatever the individual
//! tests did.
use crate::client::ConductorClient;
use crate::core::builder::MockRequestBuilder;
use crate::core::config::HarnessConfig;
use crate::core::error::{HarnessError, HarnessResult};
use crate::core::fixtures::FixtureStore;
use crate::core::model::{Workflow, WorkflowDef, WorkflowTestRequest};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, Instrument, Span};
use uuid::Uuid;

pub struct HarnessSession {
    client: Arc<ConductorClient>,
    fixtures: FixtureStore,
    config: HarnessConfig,
    span: Span,
    released: bool,
}

impl HarnessSession {
    /// Wait for the server to report healthy, then authenticate.
    ///
    /// Everything the session logs, from the health wait to release, is
    /// recorded inside one `harness_session` span carrying a fresh id.
    pub async fn connect(config: HarnessConfig) -> HarnessResult<Self> {
        let span = info_span!(
            "harness_session",
            session = %Uuid::new_v4(),
            api = %config.api_url
        );
        let client = ConductorClient::new(&config);
        async {
            wait_until_healthy(&client, config.startup_timeout, config.poll_interval).await?;
            client.authenticate().await?;
            info!(target_server = ?config.target, "session acquired");
            Ok::<_, HarnessError>(())
        }
        .instrument(span.clone())
        .await?;

        Ok(Self {
            client: Arc::new(client),
            fixtures: config.fixtures(),
            config,
            span,
            released: false,
        })
    }

    pub fn client(&self) -> &ConductorClient {
        &self.client
    }

    pub fn shared_client(&self) -> Arc<ConductorClient> {
        Arc::clone(&self.client)
    }

    pub fn fixtures(&self) -> &FixtureStore {
        &self.fixtures
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn builder(&self) -> MockRequestBuilder<'_, FixtureStore> {
        MockRequestBuilder::new(&self.fixtures)
    }

    /// Load a definition fixture and register it with the server.
    pub async fn register_fixture(&self, name: &str) -> HarnessResult<WorkflowDef> {
        let definition = self.fixtures.workflow_def(name)?;
        self.client
            .register_workflow_def(&definition, true)
            .instrument(self.span.clone())
            .await?;
        Ok(definition)
    }

    /// Build a fully mocked request for the named definition fixture,
    /// optionally overlaid with the `test_data/<scenario>.json` mocks.
    pub fn prepare(
        &self,
        workflow: &str,
        scenario: Option<&str>,
        input: Map<String, Value>,
    ) -> HarnessResult<WorkflowTestRequest> {
        let definition = self.fixtures.workflow_def(workflow)?;
        let mut request = self.builder().build(&definition)?.with_input(input);
        if let Some(scenario) = scenario {
            request.override_mocks(self.fixtures.test_inputs(scenario)?);
        }
        Ok(request)
    }

    pub async fn run(&self, request: &WorkflowTestRequest) -> HarnessResult<Workflow> {
        self.client
            .test_workflow(request)
            .instrument(self.span.clone())
            .await
    }

    /// Release the session. Also happens on drop.
    pub fn release(mut self) {
        self.mark_released();
    }

    fn mark_released(&mut self) {
        if !self.released {
            self.released = true;
            let _entered = self.span.enter();
            info!("session released");
        }
    }
}

impl Drop for HarnessSession {
    fn drop(&mut self) {
        self.mark_released();
    }
}

/// Poll the health predicate until it succeeds or `timeout` elapses.
pub async fn wait_until_healthy(
    client: &ConductorClient,
    timeout: Duration,
    poll_interval: Duration,
) -> HarnessResult<()> {
    let probe = async {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            if client.is_server_running().await {
                debug!(attempts, "server reported healthy");
                return;
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    tokio::time::timeout(timeout, probe)
        .await
        .map_err(|_| HarnessError::ExternalServiceUnavailable {
            url: client.health_url().to_string(),
            waited: timeout,
        })
}

/// Acquire a session, run `body` against it, and release the session
/// whether or not `body` succeeded.
pub async fn with_session<F, Fut, T>(config: HarnessConfig, body: F) -> HarnessResult<T>
where
    F: FnOnce(Arc<HarnessSession>) -> Fut,
    Fut: Future<Output = HarnessResult<T>>,
{
    let session = Arc::new(HarnessSession::connect(config).await?);
    let outcome = body(Arc::clone(&session)).await;
    match Arc::try_unwrap(session) {
        Ok(session) => session.release(),
        Err(_) => debug!("session still shared after body; releasing on last drop"),
    }
    outcome
}
