use anyhow::Result;
use async_trait::async_trait;

use crate::message::AgentMessage;

/// Base trait for LLM backends (OpenAI, Anthropic, etc).
///
/// A provider takes the agent's system prompt plus the conversation so far
/// and produces the assistant's next turn as plain text. Providers hold no
/// per-request state and are safe to share across concurrent invocations.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the assistant's next turn for the given conversation.
    async fn complete(&self, system: &str, messages: &[AgentMessage]) -> Result<String>;
}
