use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::db::DbProfile;
use crate::config::sync::SyncConfig;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;
use crate::sync::{CoinGeckoClient, MarketSource, PagePolicy, SyncWorker};

/// Assembles an [`AppState`]; used by `main` and by tests.
pub struct StateBuilder {
    security: SecurityConfig,
    db_profile: Option<DbProfile>,
    cache: Option<CacheStore>,
    sync_config: SyncConfig,
    source: Option<Arc<dyn MarketSource>>,
    policy: Option<PagePolicy>,
}

impl StateBuilder {
    pub fn new(security: SecurityConfig) -> Self {
        Self {
            security,
            db_profile: None,
            cache: None,
            sync_config: SyncConfig::default(),
            source: None,
            policy: None,
        }
    }

    pub fn with_db(mut self, profile: DbProfile) -> Self {
        self.db_profile = Some(profile);
        self
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_sync_config(mut self, config: SyncConfig) -> Self {
        self.sync_config = config;
        self
    }

    /// Replace the CoinGecko client, e.g. with a canned source in tests.
    pub fn with_market_source(mut self, source: Arc<dyn MarketSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Override the page policy derived from the API key.
    pub fn with_page_policy(mut self, policy: PagePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let cache = self.cache.unwrap_or_default();

        let Some(profile) = self.db_profile else {
            return Ok(AppState {
                cache,
                ..AppState::without_db(self.security)
            });
        };
        let db = bootstrap_db(profile).await?;

        let source: Arc<dyn MarketSource> = match self.source {
            Some(source) => source,
            None => Arc::new(
                CoinGeckoClient::new(
                    self.sync_config.base_url.clone(),
                    self.sync_config.api_key.clone(),
                )
                .map_err(|e| AppError::config(format!("cannot build market client: {e}")))?,
            ),
        };
        let policy = self
            .policy
            .unwrap_or_else(|| PagePolicy::for_api_key(self.sync_config.api_key.as_deref()));

        let worker = SyncWorker::new(db.clone(), cache.clone(), source, policy);

        Ok(AppState {
            db: Some(db),
            security: self.security,
            cache,
            sync: Some(Arc::new(worker)),
            scheduler_enabled: self.sync_config.enabled,
        })
    }
}

pub fn build_state(security: SecurityConfig) -> StateBuilder {
    StateBuilder::new(security)
}
