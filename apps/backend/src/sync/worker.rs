use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use super::policy::PagePolicy;
use super::source::{MarketSource, SourceError};
use crate::cache::{CacheRegion, CacheStore};
use crate::errors::domain::DomainError;
use crate::repos::crypto;

/// Summary of one completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Records received from upstream
    pub fetched: usize,
    /// Records written (inserted or overwritten)
    pub upserted: usize,
    pub failed_pages: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Another run held the guard; nothing was fetched or written.
    AlreadyRunning,
    Completed(SyncReport),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("all {pages} upstream pages failed; last error: {last}")]
    Upstream { pages: u32, last: SourceError },
    #[error("store write failed: {0}")]
    Store(#[from] DomainError),
}

/// Pulls upstream pages into the local store. At most one run is active per
/// process; concurrent callers get [`SyncOutcome::AlreadyRunning`].
pub struct SyncWorker {
    db: DatabaseConnection,
    cache: CacheStore,
    source: Arc<dyn MarketSource>,
    policy: PagePolicy,
    running: AtomicBool,
    last_report: RwLock<Option<SyncReport>>,
}

/// Clears the running flag when the run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncWorker {
    pub fn new(
        db: DatabaseConnection,
        cache: CacheStore,
        source: Arc<dyn MarketSource>,
        policy: PagePolicy,
    ) -> Self {
        Self {
            db,
            cache,
            source,
            policy,
            running: AtomicBool::new(false),
            last_report: RwLock::new(None),
        }
    }

    pub fn policy(&self) -> PagePolicy {
        self.policy
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn last_report(&self) -> Option<SyncReport> {
        self.last_report.read().clone()
    }

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.running))
    }

    /// Fetch every page, upsert each record, then invalidate store-derived
    /// caches.
    ///
    /// A failed page counts as empty and the run continues. The run fails only
    /// when every page failed or a store write fails; rows committed before a
    /// failure stay, and caches are left untouched.
    pub async fn run_once(&self) -> Result<SyncOutcome, SyncError> {
        let Some(_guard) = self.try_begin() else {
            info!("sync skipped: a run is already in progress");
            return Ok(SyncOutcome::AlreadyRunning);
        };

        let started_at = OffsetDateTime::now_utc();
        info!(
            pages = self.policy.pages,
            per_page = self.policy.per_page,
            "sync started"
        );

        let mut fetched = 0usize;
        let mut upserted = 0usize;
        let mut failed_pages = 0u32;
        let mut last_failure = None;

        for page in self.policy.page_numbers() {
            match self.source.fetch_page(page, self.policy.per_page).await {
                Ok(records) => {
                    fetched += records.len();
                    for record in records {
                        let coin_id = record.id.clone();
                        crypto::upsert_by_external_id(
                            &self.db,
                            record.into(),
                            OffsetDateTime::now_utc(),
                        )
                        .await
                        .map_err(|e| {
                            error!(page, coin_id = %coin_id, error = %e, "sync aborted: upsert failed");
                            SyncError::Store(e)
                        })?;
                        upserted += 1;
                    }
                }
                Err(err) => {
                    failed_pages += 1;
                    match &err {
                        SourceError::RateLimited => {
                            warn!(page, status = 429, "upstream rate limit hit; page skipped")
                        }
                        other => warn!(
                            page,
                            status = ?other.status(),
                            error = %other,
                            "page fetch failed; continuing"
                        ),
                    }
                    last_failure = Some(err);
                }
            }

            if let Some(delay) = self.policy.delay_after(page) {
                tokio::time::sleep(delay).await;
            }
        }

        if failed_pages == self.policy.pages {
            if let Some(last) = last_failure {
                error!(pages = failed_pages, "sync failed: no page could be fetched");
                return Err(SyncError::Upstream {
                    pages: failed_pages,
                    last,
                });
            }
        }

        self.cache.invalidate_many(&CacheRegion::STORE_DERIVED).await;

        let report = SyncReport {
            fetched,
            upserted,
            failed_pages,
            started_at,
            finished_at: OffsetDateTime::now_utc(),
        };
        info!(
            fetched,
            upserted,
            failed_pages,
            elapsed_ms = (report.finished_at - started_at).whole_milliseconds() as i64,
            "sync completed; store-derived caches invalidated"
        );
        *self.last_report.write() = Some(report.clone());

        Ok(SyncOutcome::Completed(report))
    }
}

impl std::fmt::Debug for SyncWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncWorker")
            .field("policy", &self.policy)
            .field("running", &self.is_running())
            .finish()
    }
}
