use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::Provider;
use super::resolver::ProviderConfig;
use super::utils::response_to_json;
use crate::message::AgentMessage;

pub const ANTHROPIC_HOST: &str = "https://api.anthropic.com";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: i32 = 4096;

pub struct AnthropicProvider {
    client: Client,
    host: String,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .credential
            .clone()
            .ok_or_else(|| anyhow!("Anthropic provider requires a resolved API key"))?;
        let host = config
            .extra
            .get("host")
            .and_then(Value::as_str)
            .unwrap_or(ANTHROPIC_HOST)
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self {
            client,
            host,
            api_key,
            model: config.model.clone(),
        })
    }

    // The messages API takes the system prompt as a top-level field, not a
    // message, and only user/assistant roles in the array.
    fn messages_to_anthropic_spec(messages: &[AgentMessage]) -> Vec<Value> {
        messages
            .iter()
            .map(|message| json!({ "role": message.role, "content": message.content }))
            .collect()
    }

    fn content_from_response(data: &Value) -> Result<String> {
        if let Some(error) = data.get("error") {
            return Err(anyhow!("API error: {}", error));
        }

        data.get("content")
            .and_then(|content| content.get(0))
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("response missing assistant content: {}", data))
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!("{}/v1/messages", self.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(&payload)
            .send()
            .await?;

        response_to_json(response).await
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(&self, system: &str, messages: &[AgentMessage]) -> Result<String> {
        let mut payload = json!({
            "model": self.model,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "messages": Self::messages_to_anthropic_spec(messages),
        });
        if !system.is_empty() {
            payload["system"] = json!(system);
        }

        let response = self.post(payload).await?;
        tracing::debug!(?response, "anthropic response");
        Self::content_from_response(&response)
    }
}
