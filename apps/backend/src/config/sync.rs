use std::env;

use super::env_flag;

pub const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Settings for the market-data sync job.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Start the 6-hour scheduler at boot
    pub enabled: bool,
    /// Demo API key; switches the worker to the keyed page policy
    pub api_key: Option<String>,
    pub base_url: String,
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let api_key = env::var("COINGECKO_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let base_url = env::var("COINGECKO_BASE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COINGECKO_BASE_URL.to_string());

        Self {
            enabled: env_flag("SYNC_ENABLED", true),
            api_key,
            base_url,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            base_url: DEFAULT_COINGECKO_BASE_URL.to_string(),
        }
    }
}
