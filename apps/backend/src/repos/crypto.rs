//! Local store of tracked assets, upserted by upstream id.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::adapters::crypto_sea as crypto_adapter;
pub use crate::adapters::crypto_sea::{CryptoUpsert, ListFilter, SortColumn};
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind};

/// Persisted row as exposed to readers and caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoRecord {
    pub id: i64,
    pub coin_id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<i32>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub content: Vec<CryptoRecord>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

pub async fn find_by_external_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    coin_id: &str,
) -> Result<Option<CryptoRecord>, DomainError> {
    let row = crypto_adapter::find_by_coin_id(conn, coin_id).await?;
    Ok(row.map(CryptoRecord::from))
}

/// Create or overwrite the row for `dto.coin_id`.
///
/// If another writer inserts the same id between lookup and insert, the
/// unique constraint fires and the row is updated instead.
pub async fn upsert_by_external_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: CryptoUpsert,
    now: OffsetDateTime,
) -> Result<UpsertOutcome, DomainError> {
    if let Some(existing) = crypto_adapter::find_by_coin_id(conn, &dto.coin_id).await? {
        crypto_adapter::update(conn, existing, dto).await?;
        return Ok(UpsertOutcome::Updated);
    }

    match crypto_adapter::insert(conn, dto.clone(), now).await {
        Ok(_) => Ok(UpsertOutcome::Inserted),
        Err(e) => match DomainError::from(e) {
            DomainError::Conflict(ConflictKind::UniqueExternalId, _) => {
                let existing = crypto_adapter::find_by_coin_id(conn, &dto.coin_id)
                    .await?
                    .ok_or_else(|| {
                        DomainError::infra(
                            InfraErrorKind::Other("UpsertRace".into()),
                            format!("coin {} vanished after a unique conflict", dto.coin_id),
                        )
                    })?;
                crypto_adapter::update(conn, existing, dto).await?;
                Ok(UpsertOutcome::Updated)
            }
            other => Err(other),
        },
    }
}

pub async fn list<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    filter: &ListFilter,
) -> Result<RecordPage, DomainError> {
    let (rows, total) = crypto_adapter::list(conn, filter).await?;
    let size = filter.size.max(1);
    Ok(RecordPage {
        content: rows.into_iter().map(CryptoRecord::from).collect(),
        page: filter.page,
        size,
        total_elements: total,
        total_pages: total.div_ceil(size),
    })
}

pub async fn count<C: ConnectionTrait + Send + Sync>(conn: &C) -> Result<u64, DomainError> {
    Ok(crypto_adapter::count(conn).await?)
}

pub async fn latest_update<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Option<OffsetDateTime>, DomainError> {
    Ok(crypto_adapter::latest_update(conn).await?)
}

impl From<crate::entities::cryptocurrencies::Model> for CryptoRecord {
    fn from(model: crate::entities::cryptocurrencies::Model) -> Self {
        Self {
            id: model.id,
            coin_id: model.coin_id,
            name: model.name,
            symbol: model.symbol,
            market_cap_rank: model.market_cap_rank,
            current_price: model.current_price,
            market_cap: model.market_cap,
            total_volume: model.total_volume,
            last_updated: model.last_updated,
        }
    }
}
