//! Read side of the asset catalogue, cached per region.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;

use crate::cache::{CacheRegion, CacheStore};
use crate::error::AppError;
use crate::errors::{messages, ErrorCode};
use crate::repos::crypto::{self, CryptoRecord, ListFilter, RecordPage, SortColumn};
use crate::sync::scheduler;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

const SORT_FIELDS: [(&str, SortColumn); 7] = [
    ("marketCapRank", SortColumn::MarketCapRank),
    ("name", SortColumn::Name),
    ("symbol", SortColumn::Symbol),
    ("currentPrice", SortColumn::CurrentPrice),
    ("marketCap", SortColumn::MarketCap),
    ("totalVolume", SortColumn::TotalVolume),
    ("lastUpdated", SortColumn::LastUpdated),
];

pub fn parse_sort(field: &str) -> Result<SortColumn, AppError> {
    SORT_FIELDS
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| *column)
        .ok_or_else(|| {
            AppError::bad_request(
                ErrorCode::InvalidSortField,
                format!("Campo de ordenamiento inválido: {field}"),
            )
        })
}

/// Raw listing parameters as received on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub query: Option<String>,
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub sort_by: Option<String>,
    pub dir: Option<String>,
}

impl ListParams {
    pub fn to_filter(&self) -> Result<ListFilter, AppError> {
        let sort = match self.sort_by.as_deref() {
            Some(field) if !field.trim().is_empty() => parse_sort(field.trim())?,
            _ => SortColumn::MarketCapRank,
        };
        let page = self.page.unwrap_or(0);
        let size = self
            .size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        // The store turns page * size into a signed OFFSET
        if page
            .checked_mul(size)
            .map_or(true, |offset| offset > i64::MAX as u64)
        {
            return Err(AppError::bad_request(
                ErrorCode::BadRequest,
                format!("Página fuera de rango: {page}"),
            ));
        }
        Ok(ListFilter {
            search: self
                .query
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            page,
            size,
            sort,
            descending: self
                .dir
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case("desc")),
        })
    }
}

fn list_cache_key(filter: &ListFilter) -> String {
    format!(
        "{}:{}:{}:{:?}:{}",
        filter.search.as_deref().unwrap_or("").to_lowercase(),
        filter.page,
        filter.size,
        filter.sort,
        if filter.descending { "desc" } else { "asc" }
    )
}

pub async fn list<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    cache: &CacheStore,
    filter: &ListFilter,
) -> Result<RecordPage, AppError> {
    cache
        .get_or_load(CacheRegion::CryptoList, &list_cache_key(filter), || async {
            Ok(crypto::list(conn, filter).await?)
        })
        .await
}

pub async fn detail<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    cache: &CacheStore,
    coin_id: &str,
) -> Result<CryptoRecord, AppError> {
    if let Some(hit) = cache.get_json(CacheRegion::CryptoDetails, coin_id).await {
        return Ok(hit);
    }
    let record = crypto::find_by_external_id(conn, coin_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found(ErrorCode::CryptoNotFound, messages::crypto_not_found(coin_id))
        })?;
    cache
        .put_json(CacheRegion::CryptoDetails, coin_id, &record)
        .await;
    Ok(record)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueStats {
    pub total: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
    pub has_synced_data: bool,
}

pub async fn stats<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    cache: &CacheStore,
) -> Result<CatalogueStats, AppError> {
    cache
        .get_or_load(CacheRegion::CryptoStats, "stats", || async {
            let total = crypto::count(conn).await?;
            Ok(CatalogueStats {
                total,
                last_updated: crypto::latest_update(conn).await?,
                has_synced_data: total > 0,
            })
        })
        .await
}

/// Store-derived part of the scheduler status; the clock-derived fields are
/// computed per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreSnapshot {
    #[serde(with = "time::serde::rfc3339::option")]
    last_sync: Option<OffsetDateTime>,
    total_cryptos: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub frequency: &'static str,
    pub schedule: &'static str,
    pub cron_expression: &'static str,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_sync: Option<OffsetDateTime>,
    pub total_cryptos: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub next_sync: OffsetDateTime,
    pub next_sync_description: String,
    pub minutes_until_next: i64,
    pub running: bool,
}

pub async fn scheduler_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    cache: &CacheStore,
    enabled: bool,
    running: bool,
    now: OffsetDateTime,
) -> Result<SchedulerStatus, AppError> {
    let snapshot: StoreSnapshot = cache
        .get_or_load(CacheRegion::SchedulerStatus, "status", || async {
            Ok(StoreSnapshot {
                last_sync: crypto::latest_update(conn).await?,
                total_cryptos: crypto::count(conn).await?,
            })
        })
        .await?;

    let next_sync = scheduler::next_run_after(now);
    Ok(SchedulerStatus {
        enabled,
        frequency: scheduler::FREQUENCY,
        schedule: scheduler::SCHEDULE,
        cron_expression: scheduler::CRON_EXPRESSION,
        last_sync: snapshot.last_sync,
        total_cryptos: snapshot.total_cryptos,
        next_sync,
        next_sync_description: scheduler::describe_next_run(now, next_sync),
        minutes_until_next: (next_sync - now).whole_minutes(),
        running,
    })
}

/// Prime the stats region and the default first listing page.
pub async fn warmup<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    cache: &CacheStore,
) -> Result<(), AppError> {
    stats(conn, cache).await?;
    let first_page = ListParams::default().to_filter()?;
    list(conn, cache, &first_page).await?;
    info!(backend = cache.backend_name(), "cache warmed up");
    Ok(())
}
