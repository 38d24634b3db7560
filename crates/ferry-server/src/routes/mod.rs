pub mod completions;
pub mod health;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn configure(state: AppState) -> Router {
    // Allow-all CORS for development use; restrict upstream as needed.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest(
            "/api/v1",
            Router::new()
                .merge(completions::routes())
                .merge(health::routes()),
        )
        .layer(cors)
        .with_state(state)
}

/// Basic API information for humans poking at the base URL.
async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "OpenAI-Compatible API Server",
        "status": "running",
        "agent": {
            "provider": state.provider,
            "model": state.model,
        },
        "healthcheck": "/api/v1/healthcheck",
        "completions": "/api/v1/chat/completions",
    }))
}
