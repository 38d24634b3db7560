use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::Provider;
use super::resolver::{ProviderConfig, DATABRICKS_HOST};
use super::utils::{content_from_openai_response, messages_to_openai_spec, response_to_json};
use crate::message::AgentMessage;

/// Client for Databricks model serving endpoints.
///
/// A resolved databricks config carries either a serving-endpoint name
/// (foundation models are named after the model) or a full workspace URL in
/// `endpoint`, with the workspace host kept in `extra` when the environment
/// supplied one. Credential discovery beyond a plain token is ambient and
/// outside this crate.
pub struct DatabricksProvider {
    client: Client,
    host: String,
    serving_endpoint: String,
    token: Option<String>,
}

impl DatabricksProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow!("Databricks provider requires a resolved endpoint"))?;

        let host = config
            .extra
            .get("host")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| endpoint.starts_with("http").then(|| endpoint.clone()))
            .ok_or_else(|| {
                anyhow!(
                    "Databricks workspace host not configured; set {}",
                    DATABRICKS_HOST
                )
            })?;

        // When the endpoint is itself the workspace URL, the serving
        // endpoint falls back to the model name.
        let serving_endpoint = if endpoint.starts_with("http") {
            config.model.clone()
        } else {
            endpoint
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self {
            client,
            host,
            serving_endpoint,
            token: config.credential.clone(),
        })
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/serving-endpoints/{}/invocations",
            self.host.trim_end_matches('/'),
            self.serving_endpoint
        );

        let mut request = self.client.post(&url).json(&payload);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        response_to_json(request.send().await?).await
    }
}

#[async_trait]
impl Provider for DatabricksProvider {
    async fn complete(&self, system: &str, messages: &[AgentMessage]) -> Result<String> {
        let payload = json!({
            "messages": messages_to_openai_spec(system, messages),
        });

        let response = self.post(payload).await?;
        tracing::debug!(?response, "databricks response");
        content_from_openai_response(&response)
    }
}
