//! HTTP client for the workflow server's metadata, test, and health endpoints.
use crate::core::config::{Credentials, HarnessConfig};
use crate::core::error::{HarnessError, HarnessResult};
use crate::core::model::{Workflow, WorkflowDef, WorkflowTestRequest};
use reqwest::{RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Header carrying the access token obtained from `/token`.
pub const AUTH_HEADER: &str = "X-Authorization";

/// Client bound to one server. Cheap to share behind an `Arc`.
pub struct ConductorClient {
    http: reqwest::Client,
    api_url: Url,
    health_url: Url,
    credentials: Option<Credentials>,
    token: RwLock<Option<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    key_id: &'a str,
    key_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

impl ConductorClient {
    pub fn new(config: &HarnessConfig) -> Self {
        Self::from_urls(
            config.api_url.clone(),
            config.health_url.clone(),
            config.credentials.clone(),
        )
    }

    pub fn from_urls(api_url: Url, health_url: Url, credentials: Option<Credentials>) -> Self {
        ConductorClient {
            http: reqwest::Client::new(),
            api_url,
            health_url,
            credentials,
            token: RwLock::new(None),
        }
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn health_url(&self) -> &Url {
        &self.health_url
    }

    /// Exchange the configured key pair for an access token.
    /// Does nothing when the client has no credentials.
    pub async fn authenticate(&self) -> HarnessResult<()> {
        let Some(credentials) = &self.credentials else {
            debug!("no credentials configured; skipping authentication");
            return Ok(());
        };

        let url = self.endpoint(&["token"]);
        let payload = TokenRequest {
            key_id: &credentials.key_id,
            key_secret: &credentials.key_secret,
        };
        let resp = self.http.post(url).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(HarnessError::Auth(format!(
                "token request returned {status}: {text}"
            )));
        }
        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|err| HarnessError::Auth(format!("malformed token response: {err}")))?;

        *self.token.write().await = Some(token.token);
        info!(key_id = %credentials.key_id, "authenticated against {}", self.api_url);
        Ok(())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Health predicate polled during startup.
    ///
    /// True when the endpoint answers with a success status and does not
    /// report `"healthy": false`. Transport errors count as not running.
    pub async fn is_server_running(&self) -> bool {
        let resp = match self.http.get(self.health_url.clone()).send().await {
            Ok(resp) => resp,
            Err(err) => {
                debug!("health check failed: {}", err);
                return false;
            }
        };
        if !resp.status().is_success() {
            debug!("health check returned {}", resp.status());
            return false;
        }
        match resp.json::<Value>().await {
            Ok(body) => body
                .get("healthy")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            Err(_) => true,
        }
    }

    /// Register (or overwrite) a workflow definition.
    pub async fn register_workflow_def(
        &self,
        definition: &WorkflowDef,
        overwrite: bool,
    ) -> HarnessResult<()> {
        let url = self.endpoint(&["metadata", "workflow"]);
        let request = self
            .http
            .post(url)
            .query(&[("overwrite", overwrite)])
            .json(definition);
        self.send(request).await?;
        info!(
            workflow = %definition.name,
            version = definition.version,
            "registered workflow definition"
        );
        Ok(())
    }

    /// Submit a dry-run request and return the resulting execution.
    pub async fn test_workflow(&self, request: &WorkflowTestRequest) -> HarnessResult<Workflow> {
        let url = self.endpoint(&["workflow", "test"]);
        let resp = self.send(self.http.post(url).json(request)).await?;
        let execution: Workflow = resp.json().await?;
        info!(
            workflow = %request.name,
            status = %execution.status,
            tasks = execution.tasks.len(),
            "test workflow finished"
        );
        Ok(execution)
    }

    pub async fn get_workflow(&self, workflow_id: &str) -> HarnessResult<Workflow> {
        let url = self.endpoint(&["workflow", workflow_id]);
        let request = self.http.get(url).query(&[("includeTasks", true)]);
        let resp = self.send(request).await?;
        Ok(resp.json().await?)
    }

    async fn send(&self, request: RequestBuilder) -> HarnessResult<Response> {
        let request = match self.token.read().await.as_deref() {
            Some(token) => request.header(AUTH_HEADER, token),
            None => request,
        };
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!("server request failed: {} {}", status, text);
            return Err(HarnessError::api(status.as_u16(), text));
        }
        Ok(resp)
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        let mut url = self.api_url.as_str().trim_end_matches('/').to_string();
        for segment in segments {
            if !segment.is_empty() {
                url.push('/');
                url.push_str(segment);
            }
        }
        url
    }
}
