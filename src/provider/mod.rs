//! # Print-Provider API Client
//!
//! HTTP client for the upstream print-on-demand API: catalog lookups and the
//! asynchronous mockup-generation task protocol. Every call carries a static
//! bearer credential. The [`MockupProvider`] trait is the seam the poller and
//! the web handlers depend on, so the upstream can be stubbed in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{PrintgateError, Result};

/// Upstream task lifecycle as the provider reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    #[serde(alias = "ready")]
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One generated mockup image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mockup {
    pub placement: String,
    #[serde(default)]
    pub variant_ids: Vec<i64>,
    pub mockup_url: String,
}

/// Snapshot of a generation task, returned by both submission and status calls
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    pub task_key: String,
    #[serde(rename = "status")]
    pub state: TaskState,
    #[serde(default)]
    pub mockups: Vec<Mockup>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Caller request for mockup generation
#[derive(Debug, Clone, Deserialize)]
pub struct MockupRequest {
    pub product_id: i64,
    pub variant_id: i64,
    pub image_url: String,
    pub placement: String,
    #[serde(default)]
    pub style_id: Option<i64>,
}

/// Contract with the upstream print provider
#[async_trait]
pub trait MockupProvider: Send + Sync {
    /// Submit a generation request, returning the task key and its immediate
    /// state (which may already be terminal)
    async fn create_task(&self, request: &MockupRequest) -> Result<TaskStatus>;

    /// Check a previously submitted task
    async fn task_status(&self, task_key: &str) -> Result<TaskStatus>;

    /// Catalog product payload, as the provider returns it
    async fn catalog_product(&self, product_id: i64) -> Result<Value>;

    /// Catalog variant payload
    async fn catalog_variant(&self, product_id: i64, variant_id: i64) -> Result<Value>;

    /// Base URL of the upstream, used to build response-cache request keys
    fn base_url(&self) -> &str;
}

/// Provider responses arrive wrapped in a `{code, result}` envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    code: i64,
    result: T,
}

/// reqwest-backed client for the real provider API
pub struct PrintProviderClient {
    http: Client,
    config: ProviderConfig,
}

impl PrintProviderClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PrintgateError::internal(format!("http client build failed: {e}")))?;
        Ok(Self { http, config })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.api_token)
            .send()
            .await
            .map_err(|e| PrintgateError::upstream(format!("provider request failed: {e}")))?;
        Self::parse_envelope(url, response).await
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(&self, url: &str, body: &Value) -> Result<T> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.config.api_token)
            .json(body)
            .send()
            .await
            .map_err(|e| PrintgateError::upstream(format!("provider request failed: {e}")))?;
        Self::parse_envelope(url, response).await
    }

    async fn parse_envelope<T: for<'de> Deserialize<'de>>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "provider returned error status");
            return Err(PrintgateError::upstream_status(
                format!("provider returned {status}: {body}"),
                status.as_u16(),
            ));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| PrintgateError::upstream(format!("unparseable provider response: {e}")))?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl MockupProvider for PrintProviderClient {
    async fn create_task(&self, request: &MockupRequest) -> Result<TaskStatus> {
        let url = format!(
            "{}/mockup-generator/create-task/{}",
            self.config.base_url, request.product_id
        );

        let mut file = json!({
            "placement": request.placement,
            "image_url": request.image_url,
        });
        if let Some(style_id) = request.style_id {
            file["options"] = json!([{"id": "style", "value": style_id}]);
        }
        let body = json!({
            "variant_ids": [request.variant_id],
            "format": "jpg",
            "files": [file],
        });

        debug!(
            product_id = request.product_id,
            variant_id = request.variant_id,
            placement = %request.placement,
            "submitting mockup generation task"
        );
        self.post_json(&url, &body).await
    }

    async fn task_status(&self, task_key: &str) -> Result<TaskStatus> {
        let url = format!(
            "{}/mockup-generator/task?task_key={task_key}",
            self.config.base_url
        );
        self.get_json(&url).await
    }

    async fn catalog_product(&self, product_id: i64) -> Result<Value> {
        let url = format!("{}/products/{product_id}", self.config.base_url);
        self.get_json(&url).await
    }

    async fn catalog_variant(&self, product_id: i64, variant_id: i64) -> Result<Value> {
        let url = format!(
            "{}/products/{product_id}/variants/{variant_id}",
            self.config.base_url
        );
        self.get_json(&url).await
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }
}
