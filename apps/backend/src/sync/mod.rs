pub mod policy;
pub mod scheduler;
pub mod source;
pub mod worker;

pub use policy::PagePolicy;
pub use source::{CoinGeckoClient, MarketRecord, MarketSource, SourceError};
pub use worker::{SyncError, SyncOutcome, SyncReport, SyncWorker};
