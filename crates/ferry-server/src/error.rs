use thiserror::Error;

/// Startup-time failures. These abort the process with a readable message
/// and are never surfaced to an HTTP caller.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("provider configuration error: {0}")]
    Provider(#[from] ferry::errors::ConfigError),

    #[error("AGENT_AUTO_APPROVE must be true for API usage; interactive prompts cannot work in an HTTP request context")]
    AutoApproveRequired,
}
