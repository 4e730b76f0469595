use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use backend::sync::{MarketRecord, MarketSource, SourceError};
use parking_lot::Mutex;
use time::macros::datetime;

/// Upstream stand-in serving canned pages. Pages without content come back
/// empty.
#[derive(Default)]
pub struct FakeSource {
    pages: Mutex<HashMap<u32, Vec<MarketRecord>>>,
    failing: HashSet<u32>,
    rate_limited: HashSet<u32>,
    latency: Duration,
    calls: AtomicU32,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page: u32, records: Vec<MarketRecord>) -> Self {
        self.pages.lock().insert(page, records);
        self
    }

    /// Page answers with a 500
    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    /// Page answers with a 429
    pub fn rate_limited_page(mut self, page: u32) -> Self {
        self.rate_limited.insert(page);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Replace a page between runs.
    pub fn set_page(&self, page: u32, records: Vec<MarketRecord>) {
        self.pages.lock().insert(page, records);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketSource for FakeSource {
    async fn fetch_page(&self, page: u32, _per_page: u32) -> Result<Vec<MarketRecord>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.rate_limited.contains(&page) {
            return Err(SourceError::RateLimited);
        }
        if self.failing.contains(&page) {
            return Err(SourceError::ServerError {
                status: 500,
                body: "upstream exploded".into(),
            });
        }
        Ok(self.pages.lock().get(&page).cloned().unwrap_or_default())
    }
}

pub fn market_record(id: &str, symbol: &str, name: &str, rank: i32, price: f64) -> MarketRecord {
    MarketRecord {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        market_cap_rank: Some(rank),
        current_price: Some(price),
        market_cap: Some(price * 1_000_000.0),
        total_volume: Some(price * 10_000.0),
        last_updated: Some(datetime!(2024-05-01 12:00:00 UTC)),
    }
}

/// Six assets over three pages of two.
pub fn three_page_source() -> FakeSource {
    FakeSource::new()
        .with_page(
            1,
            vec![
                market_record("bitcoin", "btc", "Bitcoin", 1, 67000.0),
                market_record("ethereum", "eth", "Ethereum", 2, 3100.0),
            ],
        )
        .with_page(
            2,
            vec![
                market_record("tether", "usdt", "Tether", 3, 1.0),
                market_record("solana", "sol", "Solana", 4, 150.0),
            ],
        )
        .with_page(
            3,
            vec![
                market_record("cardano", "ada", "Cardano", 5, 0.45),
                market_record("dogecoin", "doge", "Dogecoin", 6, 0.15),
            ],
        )
}
