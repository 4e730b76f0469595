//! DTOs for crypto_sea adapter.

use time::OffsetDateTime;

/// Mutable fields of a cryptocurrency row, keyed by `coin_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct CryptoUpsert {
    pub coin_id: String,
    pub name: String,
    pub symbol: String,
    pub market_cap_rank: Option<i32>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub total_volume: Option<f64>,
    /// `None` means the upstream omitted it; inserts default to now
    pub last_updated: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    MarketCapRank,
    Name,
    Symbol,
    CurrentPrice,
    MarketCap,
    TotalVolume,
    LastUpdated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter {
    /// Case-insensitive substring of name or symbol
    pub search: Option<String>,
    /// Zero-based
    pub page: u64,
    pub size: u64,
    pub sort: SortColumn,
    pub descending: bool,
}
