use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::security_config::SecurityConfig;
use crate::cache::CacheStore;
use crate::error::AppError;
use crate::sync::SyncWorker;

/// Shared resources handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Absent only in tests that never touch storage
    pub db: Option<DatabaseConnection>,
    pub security: SecurityConfig,
    pub cache: CacheStore,
    /// Present whenever a database is
    pub sync: Option<Arc<SyncWorker>>,
    /// Whether the background scheduler was started
    pub scheduler_enabled: bool,
}

impl AppState {
    pub fn without_db(security: SecurityConfig) -> Self {
        Self {
            db: None,
            security,
            cache: CacheStore::in_memory(),
            sync: None,
            scheduler_enabled: false,
        }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    pub fn require_db(&self) -> Result<&DatabaseConnection, AppError> {
        self.db
            .as_ref()
            .ok_or_else(|| AppError::db_unavailable("database connection not configured"))
    }

    pub fn require_sync(&self) -> Result<&SyncWorker, AppError> {
        self.sync
            .as_deref()
            .ok_or_else(|| AppError::internal("sync worker not configured"))
    }
}
