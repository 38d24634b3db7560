use anyhow::{anyhow, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::message::AgentMessage;

/// Convert the agent conversation to OpenAI-style message objects,
/// prepending the system prompt when one is set. Databricks and Azure both
/// speak this shape as well.
pub fn messages_to_openai_spec(system: &str, messages: &[AgentMessage]) -> Vec<Value> {
    let mut spec = Vec::with_capacity(messages.len() + 1);
    if !system.is_empty() {
        spec.push(json!({ "role": "system", "content": system }));
    }
    for message in messages {
        spec.push(json!({ "role": message.role, "content": message.content }));
    }
    spec
}

/// Pull the assistant text out of an OpenAI-style chat completion body.
pub fn content_from_openai_response(data: &Value) -> Result<String> {
    if let Some(error) = data.get("error") {
        return Err(anyhow!("API error: {}", error));
    }

    data.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("response missing assistant content: {}", data))
}

/// Decode a provider response body, surfacing non-OK statuses as errors.
pub async fn response_to_json(response: reqwest::Response) -> Result<Value> {
    match response.status() {
        StatusCode::OK => Ok(response.json().await?),
        status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
            Err(anyhow!("Server error: {}", status))
        }
        status => {
            let error_text = response.text().await.unwrap_or_default();
            Err(anyhow!("Request failed: {}: {}", status, error_text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn test_messages_to_openai_spec_prepends_system() {
        let messages = vec![
            AgentMessage::user("hello"),
            AgentMessage::assistant("hi"),
            AgentMessage::user("how are you?"),
        ];
        let spec = messages_to_openai_spec("be helpful", &messages);

        assert_eq!(spec.len(), 4);
        assert_eq!(spec[0]["role"], "system");
        assert_eq!(spec[0]["content"], "be helpful");
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[2]["role"], "assistant");
        assert_eq!(spec[3]["content"], "how are you?");
    }

    #[test]
    fn test_messages_to_openai_spec_skips_empty_system() {
        let spec = messages_to_openai_spec("", &[AgentMessage::user("hi")]);
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], Role::User.as_str());
    }

    #[test]
    fn test_content_from_openai_response() {
        let data = json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Hello!" },
                "finish_reason": "stop"
            }]
        });
        assert_eq!(content_from_openai_response(&data).unwrap(), "Hello!");
    }

    #[test]
    fn test_content_from_openai_response_error_body() {
        let data = json!({ "error": { "message": "context length exceeded" } });
        let err = content_from_openai_response(&data).unwrap_err();
        assert!(err.to_string().contains("context length exceeded"));
    }

    #[test]
    fn test_content_from_openai_response_missing_choices() {
        let data = json!({ "object": "chat.completion" });
        assert!(content_from_openai_response(&data).is_err());
    }
}
