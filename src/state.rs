use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;

/// Shared application state: the connection pool and the immutable
/// configuration, injected into the gate and handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: PgPool, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}
