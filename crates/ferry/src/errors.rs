use thiserror::Error;

/// Errors raised while resolving a provider configuration.
///
/// These are fatal at startup: the process refuses to start rather than
/// serving requests with a half-configured provider.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported provider: {0}. Supported providers: anthropic, databricks, openai, azure")]
    UnsupportedProvider(String),

    #[error("{provider} API key required. Set the {env_var} environment variable or pass an explicit key")]
    MissingCredential { provider: String, env_var: String },

    #[error("Endpoint required for {provider} provider. Pass an endpoint or set the {env_var} environment variable")]
    MissingEndpoint { provider: String, env_var: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
