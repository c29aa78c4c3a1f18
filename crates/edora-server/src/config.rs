use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use tracing::{info, warn};

use edora_api::Settings;

/// Placeholder JWT secret used when none is configured. Fine for local
/// development only.
const DEV_JWT_SECRET: &str = "dev-secret-change-me";

pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub settings: Settings,
}

impl Config {
    pub fn load() -> Result<Self> {
        let jwt_secret = env::var("EDORA_JWT_SECRET").unwrap_or_default();
        let jwt_secret = if jwt_secret.is_empty() || jwt_secret == DEV_JWT_SECRET {
            warn!("EDORA_JWT_SECRET is unset or a placeholder; tokens are forgeable. Set it before deploying.");
            DEV_JWT_SECRET.to_string()
        } else {
            jwt_secret
        };

        Ok(Self {
            host: try_load("EDORA_HOST", "0.0.0.0")?,
            port: try_load("EDORA_PORT", "8001")?,
            db_path: try_load("EDORA_DB_PATH", "./data/edora.db")?,
            upload_dir: try_load("EDORA_UPLOAD_DIR", "./uploads")?,
            settings: Settings {
                jwt_secret,
                access_ttl_minutes: try_load("EDORA_ACCESS_TTL_MINUTES", "30")?,
                refresh_ttl_days: try_load("EDORA_REFRESH_TTL_DAYS", "7")?,
                max_upload_bytes: try_load("EDORA_MAX_UPLOAD_BYTES", "10485760")?,
                allow_role_signup: try_load("EDORA_ALLOW_ROLE_SIGNUP", "false")?,
            },
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw:?}"))
}
