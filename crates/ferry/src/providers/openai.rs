use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::Provider;
use super::resolver::ProviderConfig;
use super::utils::{content_from_openai_response, messages_to_openai_spec, response_to_json};
use crate::message::AgentMessage;

pub const OPENAI_HOST: &str = "https://api.openai.com";

pub struct OpenAiProvider {
    client: Client,
    host: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .credential
            .clone()
            .ok_or_else(|| anyhow!("OpenAI provider requires a resolved API key"))?;
        let host = config
            .extra
            .get("host")
            .and_then(Value::as_str)
            .unwrap_or(OPENAI_HOST)
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

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!("{}/v1/chat/completions", self.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        response_to_json(response).await
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, system: &str, messages: &[AgentMessage]) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": messages_to_openai_spec(system, messages),
        });

        let response = self.post(payload).await?;
        tracing::debug!(?response, "openai response");
        content_from_openai_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::resolver::{resolve, Env, OPENAI_API_KEY};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_mock_server(response_body: Value) -> (MockServer, OpenAiProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test_api_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
            .mount(&mock_server)
            .await;

        let env = Env::empty().with(OPENAI_API_KEY, "test_api_key");
        let mut config = resolve("openai", Some("gpt-4-turbo"), None, None, &env).unwrap();
        config
            .extra
            .insert("host".to_string(), Value::from(mock_server.uri()));

        let provider = OpenAiProvider::new(&config).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_complete_basic() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! How can I assist you today?"
                },
                "finish_reason": "stop"
            }]
        });
        let (_server, provider) = setup_mock_server(response_body).await;

        let reply = provider
            .complete("You are a helpful assistant.", &[AgentMessage::user("Hi")])
            .await?;
        assert_eq!(reply, "Hello! How can I assist you today?");
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_surfaces_api_error_body() {
        let response_body = json!({
            "error": { "message": "model overloaded", "type": "server_error" }
        });
        let (_server, provider) = setup_mock_server(response_body).await;

        let err = provider
            .complete("", &[AgentMessage::user("Hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("model overloaded"));
    }

    #[test]
    fn test_new_requires_credential() {
        let config = ProviderConfig {
            provider: crate::providers::resolver::ProviderType::OpenAi,
            model: "gpt-4-turbo".to_string(),
            credential: None,
            endpoint: None,
            extra: Default::default(),
        };
        assert!(OpenAiProvider::new(&config).is_err());
    }
}
