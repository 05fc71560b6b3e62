use std::sync::Arc;

use jobportal_db::Database;
use tracing::error;

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::mailer::Notifier;
use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: ApiConfig,
    pub notifier: Arc<dyn Notifier>,
    pub storage: Storage,
}

/// Runs a store call off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> AppResult<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            AppError::InternalError("store task failed".into())
        })?
        .map_err(AppError::Database)
}
