use std::sync::Arc;

use tracing::error;
use warbler_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>, token_ttl: chrono::Duration) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: jwt_secret.into(),
            token_ttl,
        })
    }
}

/// Run a blocking store call off the async runtime.
pub async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> warbler_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
