use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::Provider;
use super::resolver::{ProviderConfig, AZURE_API_VERSION};
use super::utils::{content_from_openai_response, messages_to_openai_spec, response_to_json};
use crate::message::AgentMessage;

/// Client for Azure OpenAI deployments. The resolved model doubles as the
/// deployment name, matching Azure's URL scheme.
pub struct AzureProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
}

impl AzureProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .credential
            .clone()
            .ok_or_else(|| anyhow!("Azure OpenAI provider requires a resolved API key"))?;
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow!("Azure OpenAI provider requires a resolved endpoint"))?;
        let api_version = config
            .extra
            .get("api_version")
            .and_then(Value::as_str)
            .unwrap_or(AZURE_API_VERSION)
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            deployment: config.model.clone(),
            api_version,
        })
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        );

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        response_to_json(response).await
    }
}

#[async_trait]
impl Provider for AzureProvider {
    async fn complete(&self, system: &str, messages: &[AgentMessage]) -> Result<String> {
        let payload = json!({
            "messages": messages_to_openai_spec(system, messages),
        });

        let response = self.post(payload).await?;
        tracing::debug!(?response, "azure openai response");
        content_from_openai_response(&response)
    }
}
