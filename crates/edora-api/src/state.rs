use std::sync::Arc;

use tracing::error;

use edora_db::Database;

use crate::error::ApiError;
use crate::storage::Storage;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub storage: Storage,
    pub settings: Settings,
}

/// Runtime knobs handed down from the server's configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub jwt_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub max_upload_bytes: usize,
    pub allow_role_signup: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-change-me".into(),
            access_ttl_minutes: 30,
            refresh_ttl_days: 7,
            max_upload_bytes: 10 * 1024 * 1024,
            allow_role_signup: false,
        }
    }
}

impl AppStateInner {
    pub fn new(db: Database, storage: Storage, settings: Settings) -> AppState {
        Arc::new(Self {
            db,
            storage,
            settings,
        })
    }
}

/// Run blocking DB work off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(ApiError::from)
}
