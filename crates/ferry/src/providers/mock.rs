use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::message::AgentMessage;
use crate::providers::base::Provider;

/// A mock provider that returns pre-configured responses for testing
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    fail_with: Option<String>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            fail_with: None,
        }
    }

    /// Create a mock provider whose every completion fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, _system: &str, _messages: &[AgentMessage]) -> Result<String> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{}", message));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            Ok(String::new())
        } else {
            Ok(responses.remove(0))
        }
    }
}
