//! Upstream market data.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::repos::crypto::CryptoUpsert;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_ERROR_BODY_LENGTH: usize = 500;
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// One entry of `/coins/markets`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub market_cap_rank: Option<i32>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
}

impl From<MarketRecord> for CryptoUpsert {
    fn from(record: MarketRecord) -> Self {
        Self {
            coin_id: record.id,
            name: record.name,
            symbol: record.symbol,
            market_cap_rank: record.market_cap_rank,
            current_price: record.current_price,
            market_cap: record.market_cap,
            total_volume: record.total_volume,
            last_updated: record.last_updated,
        }
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("upstream rejected the API key")]
    Unauthorized,
    #[error("upstream access denied: {0}")]
    AccessDenied(String),
    #[error("upstream resource not found: {0}")]
    NotFound(String),
    #[error("upstream rate limit exceeded")]
    RateLimited,
    #[error("upstream server error ({status}): {body}")]
    ServerError { status: u16, body: String },
    #[error("upstream network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl SourceError {
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => SourceError::Unauthorized,
            403 => SourceError::AccessDenied(truncated),
            404 => SourceError::NotFound(truncated),
            429 => SourceError::RateLimited,
            code @ 500..=599 => SourceError::ServerError {
                status: code,
                body: truncated,
            },
            _ => SourceError::InvalidResponse(format!("Status {status}: {truncated}")),
        }
    }

    /// HTTP status behind the failure, when there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Unauthorized => Some(401),
            SourceError::AccessDenied(_) => Some(403),
            SourceError::NotFound(_) => Some(404),
            SourceError::RateLimited => Some(429),
            SourceError::ServerError { status, .. } => Some(*status),
            SourceError::Network(e) => e.status().map(|s| s.as_u16()),
            SourceError::InvalidResponse(_) => None,
        }
    }
}

/// Page-at-a-time access to upstream market data. Pages are 1-based.
#[async_trait]
pub trait MarketSource: Send + Sync {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<MarketRecord>, SourceError>;
}

/// CoinGecko `/coins/markets` client. Clone is cheap.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl MarketSource for CoinGeckoClient {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<Vec<MarketRecord>, SourceError> {
        let url = format!("{}/coins/markets", self.base_url);
        let query = [
            ("vs_currency", "usd".to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h".to_string()),
        ];

        let mut request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        debug!(page, per_page, "fetching market page");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::from_status(status, &body));
        }

        response
            .json::<Vec<MarketRecord>>()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))
    }
}
