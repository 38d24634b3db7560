mod configuration;
mod error;
mod openai;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ferry::agent::DeepAgent;
use ferry::providers::factory;
use ferry::providers::resolver::{resolve, Env};
use ferry::workspace::Workspace;

use crate::configuration::Settings;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new()?;
    settings.configure_databricks_environment();

    info!(
        provider = %settings.agent.provider,
        model = ?settings.agent.model,
        workspace = %settings.agent.workspace,
        auto_approve = settings.agent.auto_approve,
        "initializing agent"
    );

    let env = Env::from_process();
    let provider_config = resolve(
        &settings.agent.provider,
        settings.agent.model.as_deref(),
        None,
        settings.agent.endpoint.as_deref(),
        &env,
    )?;
    let provider = factory::get_provider(&provider_config)?;
    let workspace = Workspace::open(&settings.agent.workspace)?;
    let agent = DeepAgent::new(provider, workspace);

    info!(model = %provider_config.model, "agent initialized");

    let app_state = AppState {
        agent: Arc::new(agent),
        provider: provider_config.provider.to_string(),
        model: provider_config.model.clone(),
    };

    let app = routes::configure(app_state);
    let listener = tokio::net::TcpListener::bind(settings.server.socket_addr()?).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
