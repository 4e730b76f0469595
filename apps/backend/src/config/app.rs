//! Process configuration loaded once from environment variables.

use std::env;

use super::db::DbProfile;
use super::env_flag;
use super::sync::SyncConfig;
use crate::error::AppError;
use crate::middleware::cors::parse_allowed_origins;
use crate::state::security_config::SecurityConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server configuration
    pub host: String,
    pub port: u16,

    pub db_profile: DbProfile,
    pub security: SecurityConfig,
    pub sync: SyncConfig,

    /// Redis cache backend; in-process cache when unset
    pub redis_url: Option<String>,

    /// Re-emit verified identity as `X-User-*` headers
    pub gateway_mode: bool,

    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Load and validate configuration. Fails fast on a missing or blank secret.
    pub fn from_env() -> Result<Self, AppError> {
        let host = env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port_str = env::var("BACKEND_PORT").unwrap_or_else(|_| "8082".to_string());
        let port = port_str.parse::<u16>().map_err(|_| {
            AppError::config(format!(
                "BACKEND_PORT must be a valid port number, got '{port_str}'"
            ))
        })?;

        let db_profile = DbProfile::from_env()?;
        let security = SecurityConfig::from_env()?;
        let sync = SyncConfig::from_env();

        let redis_url = env::var("REDIS_URL")
            .ok()
            .filter(|u| !u.trim().is_empty());

        Ok(Self {
            host,
            port,
            db_profile,
            security,
            sync,
            redis_url,
            gateway_mode: env_flag("AUTH_GATEWAY_MODE", false),
            cors_allowed_origins: parse_allowed_origins(
                &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default(),
            ),
        })
    }
}
