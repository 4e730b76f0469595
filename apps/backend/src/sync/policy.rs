use std::ops::RangeInclusive;
use std::time::Duration;

/// How many pages to pull and how politely.
///
/// A configured API key buys a higher upstream rate limit, so keyed runs use
/// bigger pages and shorter pauses. Both policies cover the top 1000 assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePolicy {
    pub per_page: u32,
    pub pages: u32,
    pub delay: Duration,
}

impl PagePolicy {
    pub const fn keyed() -> Self {
        Self {
            per_page: 250,
            pages: 4,
            delay: Duration::from_millis(300),
        }
    }

    pub const fn anonymous() -> Self {
        Self {
            per_page: 50,
            pages: 20,
            delay: Duration::from_millis(1200),
        }
    }

    pub fn for_api_key(api_key: Option<&str>) -> Self {
        match api_key {
            Some(key) if !key.trim().is_empty() => Self::keyed(),
            _ => Self::anonymous(),
        }
    }

    /// 1-based page numbers.
    pub fn page_numbers(&self) -> RangeInclusive<u32> {
        1..=self.pages
    }

    /// Pause after fetching `page`; none after the last one.
    pub fn delay_after(&self, page: u32) -> Option<Duration> {
        (page < self.pages && !self.delay.is_zero()).then_some(self.delay)
    }

    pub fn capacity(&self) -> u32 {
        self.per_page * self.pages
    }
}
