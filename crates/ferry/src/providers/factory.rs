use anyhow::Result;

use super::{
    anthropic::AnthropicProvider,
    azure::AzureProvider,
    base::Provider,
    databricks::DatabricksProvider,
    openai::OpenAiProvider,
    resolver::{ProviderConfig, ProviderType},
};

/// Construct the client for a resolved provider configuration.
///
/// Resolution itself never touches the network; this is the deferred step
/// that turns a [`ProviderConfig`] into something that can actually speak
/// to the backend.
pub fn get_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match config.provider {
        ProviderType::Anthropic => Ok(Box::new(AnthropicProvider::new(config)?)),
        ProviderType::Databricks => Ok(Box::new(DatabricksProvider::new(config)?)),
        ProviderType::OpenAi => Ok(Box::new(OpenAiProvider::new(config)?)),
        ProviderType::Azure => Ok(Box::new(AzureProvider::new(config)?)),
    }
}
