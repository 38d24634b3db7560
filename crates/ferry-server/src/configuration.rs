use config::{Config, Environment};
use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

use crate::error::ServerError;

pub const DATABRICKS_PROFILE: &str = "DATABRICKS_PROFILE";
pub const DATABRICKS_CONFIG_PROFILE: &str = "DATABRICKS_CONFIG_PROFILE";

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Agent configuration, read from `AGENT_*` environment variables.
#[derive(Debug, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_workspace")]
    pub workspace: String,
    #[serde(default = "default_auto_approve")]
    pub auto_approve: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub agent: AgentSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ServerError> {
        let server: ServerSettings = Config::builder()
            .add_source(Environment::with_prefix("FERRY").try_parsing(true))
            .build()?
            .try_deserialize()?;

        let agent: AgentSettings = Config::builder()
            .add_source(Environment::with_prefix("AGENT").try_parsing(true))
            .build()?
            .try_deserialize()?;

        // The API cannot pause for interactive approval mid-request.
        if !agent.auto_approve {
            return Err(ServerError::AutoApproveRequired);
        }

        Ok(Self { server, agent })
    }

    /// Export the selected Databricks CLI profile so ambient SDK-style
    /// credential discovery picks it up before the agent is built.
    pub fn configure_databricks_environment(&self) {
        if self.agent.provider != "databricks" {
            return;
        }
        if let Ok(profile) = std::env::var(DATABRICKS_PROFILE) {
            if !profile.is_empty() {
                std::env::set_var(DATABRICKS_CONFIG_PROFILE, profile);
            }
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_provider() -> String {
    "databricks".to_string()
}

fn default_workspace() -> String {
    "/tmp/agent-workspace".to_string()
}

fn default_auto_approve() -> bool {
    true
}
