use std::time::Duration;

/// Named cache regions. Each region has its own TTL and is invalidated as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheRegion {
    CryptoList,
    CryptoDetails,
    CryptoStats,
    CoingeckoApi,
    SchedulerStatus,
}

impl CacheRegion {
    pub const ALL: [CacheRegion; 5] = [
        CacheRegion::CryptoList,
        CacheRegion::CryptoDetails,
        CacheRegion::CryptoStats,
        CacheRegion::CoingeckoApi,
        CacheRegion::SchedulerStatus,
    ];

    /// Regions whose contents are computed from the `cryptocurrencies` table.
    /// A completed sync invalidates exactly these.
    pub const STORE_DERIVED: [CacheRegion; 4] = [
        CacheRegion::CryptoList,
        CacheRegion::CryptoDetails,
        CacheRegion::CryptoStats,
        CacheRegion::SchedulerStatus,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            CacheRegion::CryptoList => "crypto-list",
            CacheRegion::CryptoDetails => "crypto-details",
            CacheRegion::CryptoStats => "crypto-stats",
            CacheRegion::CoingeckoApi => "coingecko-api",
            CacheRegion::SchedulerStatus => "scheduler-status",
        }
    }

    pub const fn ttl(self) -> Duration {
        match self {
            CacheRegion::CryptoList => Duration::from_secs(5 * 60),
            CacheRegion::CryptoDetails => Duration::from_secs(2 * 60),
            CacheRegion::CryptoStats => Duration::from_secs(60),
            CacheRegion::CoingeckoApi => Duration::from_secs(30),
            CacheRegion::SchedulerStatus => Duration::from_secs(60),
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            CacheRegion::CryptoList => "Lista paginada de criptomonedas (TTL: 5 min)",
            CacheRegion::CryptoDetails => "Detalles de criptomoneda individual (TTL: 2 min)",
            CacheRegion::CryptoStats => "Estadísticas generales (TTL: 1 min)",
            CacheRegion::CoingeckoApi => "Respuestas de CoinGecko API (TTL: 30 seg)",
            CacheRegion::SchedulerStatus => "Estado del scheduler (TTL: 1 min)",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}
