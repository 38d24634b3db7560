use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use ferry::agent::AgentReply;
use ferry::message::{AgentMessage, Role};

use crate::openai::{
    ChatCompletionChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole,
    ErrorDetail, ErrorEnvelope, FinishReason, ResponseMessage,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/chat/completions", post(create_chat_completion))
}

/// Everything that can go wrong while mediating a completion. Each variant
/// maps onto the OpenAI error envelope with the matching status code, so
/// nothing leaves the handler as an unstructured fault.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("{message}")]
    InvalidRequest {
        message: String,
        param: Option<&'static str>,
        code: Option<&'static str>,
    },

    #[error("Agent returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("Agent invocation failed: {0}")]
    InvocationFailed(String),

    #[error("Unexpected error: {0}")]
    Internal(String),
}

impl CompletionError {
    fn empty_messages() -> Self {
        CompletionError::InvalidRequest {
            message: "messages array cannot be empty".to_string(),
            param: Some("messages"),
            code: Some("invalid_value"),
        }
    }

    fn no_valid_messages() -> Self {
        CompletionError::InvalidRequest {
            message: "No valid user/assistant messages found after filtering".to_string(),
            param: Some("messages"),
            code: Some("invalid_value"),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            CompletionError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            CompletionError::InvalidResponse(_)
            | CompletionError::InvocationFailed(_)
            | CompletionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> ErrorDetail {
        let (kind, param, code) = match self {
            CompletionError::InvalidRequest { param, code, .. } => {
                ("invalid_request_error", *param, *code)
            }
            CompletionError::InvalidResponse(_) => ("agent_error", None, Some("invalid_response")),
            CompletionError::InvocationFailed(_) => {
                ("agent_error", None, Some("invocation_failed"))
            }
            CompletionError::Internal(_) => ("internal_error", None, Some("server_error")),
        };
        ErrorDetail {
            message: self.to_string(),
            kind: kind.to_string(),
            param: param.map(str::to_string),
            code: code.map(str::to_string),
        }
    }
}

impl IntoResponse for CompletionError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "chat completion failed");
        }
        (self.status(), Json(ErrorEnvelope { error: self.detail() })).into_response()
    }
}

impl From<JsonRejection> for CompletionError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection {
            JsonRejection::JsonDataError(_)
            | JsonRejection::JsonSyntaxError(_)
            | JsonRejection::MissingJsonContentType(_) => CompletionError::InvalidRequest {
                message,
                param: None,
                code: None,
            },
            _ => CompletionError::Internal(message),
        }
    }
}

/// Project the OpenAI message sequence into the reduced shape the agent
/// accepts: user/assistant turns with non-empty content, in order. System
/// messages are dropped (the agent carries its own system prompt), and
/// function/tool turns are not part of the agent contract.
fn to_agent_messages(messages: &[ChatMessage]) -> Vec<AgentMessage> {
    let mut agent_messages = Vec::new();

    for msg in messages {
        let role = match msg.role {
            ChatRole::User => Role::User,
            ChatRole::Assistant => Role::Assistant,
            ChatRole::System | ChatRole::Function | ChatRole::Tool => continue,
        };

        match msg.content.as_deref() {
            Some(content) if !content.is_empty() => agent_messages.push(AgentMessage {
                role,
                content: content.to_string(),
            }),
            _ => {}
        }
    }

    agent_messages
}

/// Pull the final assistant text out of an agent reply, classifying each
/// malformed shape separately.
fn extract_reply_content(reply: &AgentReply) -> Result<String, CompletionError> {
    let messages = reply.messages.as_ref().ok_or_else(|| {
        CompletionError::InvalidResponse("missing 'messages' in agent reply".to_string())
    })?;

    let last = messages.last().ok_or_else(|| {
        CompletionError::InvalidResponse("agent returned an empty messages array".to_string())
    })?;

    last.content().map(str::to_string).ok_or_else(|| {
        CompletionError::InvalidResponse("last agent message has no 'content' field".to_string())
    })
}

fn package_completion(content: String) -> ChatCompletionResponse {
    // chatcmpl- plus 24 hex characters, unique per call.
    let id = format!("chatcmpl-{}", &Uuid::new_v4().simple().to_string()[..24]);

    ChatCompletionResponse {
        id,
        object: "chat.completion".to_string(),
        created: Utc::now().timestamp(),
        choices: vec![ChatCompletionChoice {
            index: 0,
            message: ResponseMessage::assistant(content),
            finish_reason: FinishReason::Stop,
        }],
    }
}

async fn create_chat_completion(
    State(state): State<AppState>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Json<ChatCompletionResponse>, CompletionError> {
    let Json(request) = payload?;

    if request.messages.is_empty() {
        return Err(CompletionError::empty_messages());
    }

    let agent_messages = to_agent_messages(&request.messages);
    if agent_messages.is_empty() {
        return Err(CompletionError::no_valid_messages());
    }

    tracing::info!(
        messages = agent_messages.len(),
        "processing chat completion request"
    );

    let reply = state
        .agent
        .invoke(&agent_messages)
        .await
        .map_err(|err| CompletionError::InvocationFailed(err.to_string()))?;

    let content = extract_reply_content(&reply)?;
    let response = package_completion(content);

    tracing::info!(id = %response.id, "request completed");
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::configure;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use ferry::agent::Agent;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Agent whose reply is deserialized from a fixed JSON value, so tests
    /// can exercise arbitrary reply shapes.
    struct ReplyAgent {
        reply: Value,
    }

    #[async_trait]
    impl Agent for ReplyAgent {
        async fn invoke(&self, _messages: &[AgentMessage]) -> anyhow::Result<AgentReply> {
            Ok(serde_json::from_value(self.reply.clone())?)
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl Agent for FailingAgent {
        async fn invoke(&self, _messages: &[AgentMessage]) -> anyhow::Result<AgentReply> {
            Err(anyhow::anyhow!("model exploded"))
        }
    }

    fn test_app(agent: impl Agent + 'static) -> Router {
        configure(AppState {
            agent: Arc::new(agent),
            provider: "openai".to_string(),
            model: "gpt-4-turbo".to_string(),
        })
    }

    async fn post_completion(app: Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/chat/completions")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_projection_drops_and_preserves_order() {
        let messages: Vec<ChatMessage> = serde_json::from_value(json!([
            { "role": "system", "content": "be nice" },
            { "role": "user", "content": "first" },
            { "role": "tool", "content": "lookup result" },
            { "role": "assistant", "content": "" },
            { "role": "assistant", "content": "second", "name": "bot" },
            { "role": "function", "content": "x" },
            { "role": "user", "content": null },
            { "role": "user", "content": "third" }
        ]))
        .unwrap();

        let projected = to_agent_messages(&messages);
        assert_eq!(
            projected,
            vec![
                AgentMessage::user("first"),
                AgentMessage::assistant("second"),
                AgentMessage::user("third"),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_messages_is_invalid_request() {
        let app = test_app(ReplyAgent { reply: json!({}) });
        let (status, body) = post_completion(app, json!({ "messages": [] })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
        assert_eq!(body["error"]["param"], "messages");
        assert_eq!(body["error"]["code"], "invalid_value");
    }

    #[tokio::test]
    async fn test_only_filtered_messages_is_invalid_request() {
        let app = test_app(ReplyAgent { reply: json!({}) });
        let (status, body) = post_completion(
            app,
            json!({ "messages": [{ "role": "system", "content": "x" }] }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "No valid user/assistant messages found after filtering"
        );
    }

    #[tokio::test]
    async fn test_unknown_top_level_field_is_rejected_with_envelope() {
        let app = test_app(ReplyAgent { reply: json!({}) });
        let (status, body) = post_completion(
            app,
            json!({ "messages": [{ "role": "user", "content": "hi" }], "stream": true }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_both_reply_shapes_produce_identical_output() {
        let typed = json!({
            "messages": [{ "role": "assistant", "content": "chocolate chip" }]
        });
        let raw = json!({
            "messages": [{ "content": "chocolate chip", "id": "m1", "extra": true }]
        });

        for reply in [typed, raw] {
            let app = test_app(ReplyAgent { reply });
            let (status, body) = post_completion(
                app,
                json!({ "messages": [{ "role": "user", "content": "suggest a flavor" }] }),
            )
            .await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["object"], "chat.completion");
            assert_eq!(body["choices"][0]["index"], 0);
            assert_eq!(body["choices"][0]["message"]["role"], "assistant");
            assert_eq!(body["choices"][0]["message"]["content"], "chocolate chip");
            assert_eq!(body["choices"][0]["finish_reason"], "stop");
        }
    }

    #[tokio::test]
    async fn test_completion_ids_are_well_formed_and_unique() {
        let reply = json!({ "messages": [{ "role": "assistant", "content": "ok" }] });
        let request = json!({ "messages": [{ "role": "user", "content": "hi" }] });

        let (_, first) = post_completion(
            test_app(ReplyAgent {
                reply: reply.clone(),
            }),
            request.clone(),
        )
        .await;
        let (_, second) = post_completion(test_app(ReplyAgent { reply }), request).await;

        let first_id = first["id"].as_str().unwrap();
        let second_id = second["id"].as_str().unwrap();

        let suffix = first_id.strip_prefix("chatcmpl-").unwrap();
        assert_eq!(suffix.len(), 24);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(first_id, second_id);
    }

    #[tokio::test]
    async fn test_invocation_failure_is_agent_error() {
        let app = test_app(FailingAgent);
        let (status, body) = post_completion(
            app,
            json!({ "messages": [{ "role": "user", "content": "hi" }] }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["type"], "agent_error");
        assert_eq!(body["error"]["code"], "invocation_failed");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("model exploded"));
    }

    #[tokio::test]
    async fn test_malformed_replies_are_invalid_response() {
        let malformed = [
            json!({}),
            json!({ "messages": [] }),
            json!({ "messages": [{ "id": "m1" }] }),
            json!({ "messages": [{ "content": { "parts": ["hi"] } }] }),
        ];

        for reply in malformed {
            let app = test_app(ReplyAgent { reply });
            let (status, body) = post_completion(
                app,
                json!({ "messages": [{ "role": "user", "content": "hi" }] }),
            )
            .await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["error"]["type"], "agent_error");
            assert_eq!(body["error"]["code"], "invalid_response");
        }
    }

    #[tokio::test]
    async fn test_extra_message_fields_are_tolerated() {
        let reply = json!({ "messages": [{ "role": "assistant", "content": "ok" }] });
        let app = test_app(ReplyAgent { reply });
        let (status, _) = post_completion(
            app,
            json!({ "messages": [{ "role": "user", "content": "hi", "metadata": { "a": 1 } }] }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
    }
}
