use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::message::AgentMessage;
use crate::providers::base::Provider;
use crate::workspace::Workspace;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a research assistant helping a team with \
product and market research tasks. Apply your knowledge thoughtfully, support your \
suggestions with reasoning, and provide actionable recommendations. Be professional, \
analytical, and creative in your responses.";

/// One message in an agent reply.
///
/// Replies are not guaranteed uniform across agent implementations: the
/// last message may expose its text as a direct `content` field or under a
/// `content` key of a loose map. Both shapes are modeled explicitly.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReplyMessage {
    /// Typed message with a direct content field.
    Typed {
        #[serde(default)]
        role: Option<String>,
        content: String,
    },
    /// Loose map shape; the text may sit under a "content" key.
    Raw(Map<String, Value>),
}

impl ReplyMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        ReplyMessage::Typed {
            role: Some("assistant".to_string()),
            content: content.into(),
        }
    }

    /// Extract the message text, tolerating either shape.
    pub fn content(&self) -> Option<&str> {
        match self {
            ReplyMessage::Typed { content, .. } => Some(content.as_str()),
            ReplyMessage::Raw(map) => map.get("content").and_then(Value::as_str),
        }
    }
}

/// Envelope an agent invocation produces. `messages` is optional because
/// nothing forces an arbitrary agent to include it; callers classify that
/// case as a malformed reply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentReply {
    #[serde(default)]
    pub messages: Option<Vec<ReplyMessage>>,
}

impl AgentReply {
    /// Reply carrying a single assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            messages: Some(vec![ReplyMessage::assistant(content)]),
        }
    }

    /// Text of the final message, when one is present and extractable.
    pub fn last_content(&self) -> Option<&str> {
        self.messages.as_ref()?.last()?.content()
    }
}

/// The invocation contract the rest of the system depends on.
///
/// The handle is constructed once at startup, published before any request
/// is served, and shared read-only across concurrent invocations.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn invoke(&self, messages: &[AgentMessage]) -> Result<AgentReply>;
}

/// The process-lifetime agent: a provider client, a system prompt, and a
/// filesystem workspace the agent may use during its own operation.
pub struct DeepAgent {
    provider: Box<dyn Provider>,
    system_prompt: String,
    workspace: Workspace,
}

impl DeepAgent {
    pub fn new(provider: Box<dyn Provider>, workspace: Workspace) -> Self {
        Self {
            provider,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            workspace,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }
}

#[async_trait]
impl Agent for DeepAgent {
    async fn invoke(&self, messages: &[AgentMessage]) -> Result<AgentReply> {
        let content = self.provider.complete(&self.system_prompt, messages).await?;

        // Echo the conversation back with the new assistant turn appended,
        // matching the reply mapping conversational agents produce.
        let mut reply: Vec<ReplyMessage> = messages
            .iter()
            .map(|message| ReplyMessage::Typed {
                role: Some(message.role.as_str().to_string()),
                content: message.content.clone(),
            })
            .collect();
        reply.push(ReplyMessage::assistant(content));

        Ok(AgentReply {
            messages: Some(reply),
        })
    }
}
