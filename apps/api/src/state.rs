use sqlx::PgPool;

use crate::config::Config;
use crate::openrouter::OpenRouterClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub openrouter: OpenRouterClient,
    pub config: Config,
}
