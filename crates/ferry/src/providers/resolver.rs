use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use strum_macros::{Display, EnumIter, EnumString};

use crate::errors::ConfigError;

pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const DATABRICKS_HOST: &str = "DATABRICKS_HOST";
pub const DATABRICKS_TOKEN: &str = "DATABRICKS_TOKEN";

pub const AZURE_API_VERSION: &str = "2024-02-15-preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderType {
    Anthropic,
    Databricks,
    OpenAi,
    Azure,
}

impl ProviderType {
    /// Model used when the caller does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderType::Anthropic => "claude-sonnet-4-5-20250929",
            ProviderType::Databricks => "databricks-claude-sonnet-4-5",
            ProviderType::OpenAi => "gpt-4-turbo",
            ProviderType::Azure => "gpt-4",
        }
    }

    /// Environment variable holding the provider's API key, if the
    /// provider uses one. Databricks authenticates ambiently.
    pub fn credential_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderType::Anthropic => Some(ANTHROPIC_API_KEY),
            ProviderType::OpenAi => Some(OPENAI_API_KEY),
            ProviderType::Azure => Some(AZURE_OPENAI_API_KEY),
            ProviderType::Databricks => None,
        }
    }
}

/// An owned snapshot of environment variables.
///
/// Resolution reads only this snapshot, so it is deterministic for a given
/// set of inputs and trivially testable without mutating process state.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, String>,
}

impl Env {
    /// Snapshot the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// Fully resolved provider configuration.
///
/// Constructed once per process and immutable thereafter. `model` is always
/// non-empty; `endpoint` is set for databricks and azure only.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider: ProviderType,
    pub model: String,
    pub credential: Option<String>,
    pub endpoint: Option<String>,
    pub extra: BTreeMap<String, Value>,
}

/// Look up the provider's credential in the environment snapshot.
///
/// Databricks is special: its SDK-style discovery (profile files, cloud
/// instance metadata) is an external concern, so only the plain token
/// variable is visible from here and absence is not an error.
pub fn resolve_credential(provider: ProviderType, env: &Env) -> Option<String> {
    let var = match provider {
        ProviderType::Anthropic => ANTHROPIC_API_KEY,
        ProviderType::OpenAi => OPENAI_API_KEY,
        ProviderType::Azure => AZURE_OPENAI_API_KEY,
        ProviderType::Databricks => DATABRICKS_TOKEN,
    };
    env.get(var).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Resolve a provider name plus optional overrides into a complete
/// [`ProviderConfig`], or fail with a descriptive [`ConfigError`].
///
/// Resolution is pure configuration logic: no network calls, no process
/// state beyond the supplied environment snapshot. Constructing the actual
/// client for the resolved config is the caller's concern (see
/// [`super::factory::get_provider`]).
pub fn resolve(
    provider: &str,
    model: Option<&str>,
    api_key: Option<&str>,
    endpoint: Option<&str>,
    env: &Env,
) -> Result<ProviderConfig, ConfigError> {
    let provider_type: ProviderType = provider
        .parse()
        .map_err(|_| ConfigError::UnsupportedProvider(provider.to_string()))?;

    let model = model
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| provider_type.default_model().to_string());

    let credential = api_key
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| resolve_credential(provider_type, env));

    let mut extra = BTreeMap::new();

    let endpoint = match provider_type {
        ProviderType::Anthropic | ProviderType::OpenAi => {
            require_credential(provider_type, &credential)?;
            // Endpoint is not applicable for these providers.
            None
        }
        ProviderType::Azure => {
            require_credential(provider_type, &credential)?;
            let endpoint = endpoint
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .or_else(|| env.get(AZURE_OPENAI_ENDPOINT).map(str::to_string))
                .ok_or_else(|| ConfigError::MissingEndpoint {
                    provider: provider_type.to_string(),
                    env_var: AZURE_OPENAI_ENDPOINT.to_string(),
                })?;
            extra.insert("api_version".to_string(), Value::from(AZURE_API_VERSION));
            Some(endpoint)
        }
        ProviderType::Databricks => {
            // Foundation-model serving endpoints are named after the model,
            // so the model id doubles as the endpoint when nothing else is
            // given. A workspace host from the environment is kept around
            // for the client to build invocation URLs.
            if let Some(host) = env.get(DATABRICKS_HOST).filter(|h| !h.is_empty()) {
                extra.insert("host".to_string(), Value::from(host));
            }
            let endpoint = endpoint
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .or_else(|| {
                    env.get(DATABRICKS_HOST)
                        .filter(|h| !h.is_empty())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| model.clone());
            Some(endpoint)
        }
    };

    Ok(ProviderConfig {
        provider: provider_type,
        model,
        credential,
        endpoint,
        extra,
    })
}

fn require_credential(
    provider: ProviderType,
    credential: &Option<String>,
) -> Result<(), ConfigError> {
    match (credential, provider.credential_env_var()) {
        (None, Some(env_var)) => Err(ConfigError::MissingCredential {
            provider: provider.to_string(),
            env_var: env_var.to_string(),
        }),
        _ => Ok(()),
    }
}
