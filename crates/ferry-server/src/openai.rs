//! OpenAI-compatible wire types for the chat completions endpoint.
//!
//! A deliberately small subset: the request accepts only `messages`
//! (unknown top-level fields are rejected), and the response carries a
//! single choice. Unknown fields inside a message object are tolerated.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Function,
    Tool,
}

/// Message in a chat conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
}

/// Assistant response message.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    pub content: String,
}

impl ResponseMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub choices: Vec<ChatCompletionChoice>,
}

/// OpenAI error detail format.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// OpenAI error response wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_rejects_unknown_top_level_fields() {
        let body = json!({
            "messages": [{ "role": "user", "content": "hi" }],
            "stream": true
        });
        assert!(serde_json::from_value::<ChatCompletionRequest>(body).is_err());
    }

    #[test]
    fn test_message_tolerates_unknown_fields() {
        let body = json!({
            "messages": [{ "role": "user", "content": "hi", "metadata": { "k": "v" } }]
        });
        let request: ChatCompletionRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(request.messages[0].content.as_deref(), Some("hi"));
    }

    #[test]
    fn test_null_content_is_accepted() {
        let body = json!({
            "messages": [{ "role": "tool", "content": null, "name": "lookup" }]
        });
        let request: ChatCompletionRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.messages[0].content, None);
        assert_eq!(request.messages[0].name.as_deref(), Some("lookup"));
    }

    #[test]
    fn test_error_envelope_omits_absent_fields() {
        let envelope = ErrorEnvelope {
            error: ErrorDetail {
                message: "boom".to_string(),
                kind: "agent_error".to_string(),
                param: None,
                code: Some("invocation_failed".to_string()),
            },
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["error"]["type"], "agent_error");
        assert_eq!(value["error"]["code"], "invocation_failed");
        assert!(value["error"].get("param").is_none());
    }
}
