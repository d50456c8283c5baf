use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::profile::schemas::ProfileSchemas;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Compiled once at startup; handlers re-validate every submission.
    pub schemas: Arc<ProfileSchemas>,
}
