use std::sync::Arc;

use ferry::agent::Agent;

/// Shared application state.
///
/// The agent handle is built once during startup and is read-only for the
/// life of the process; provider and model are kept for the info endpoint.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<dyn Agent>,
    pub provider: String,
    pub model: String,
}
