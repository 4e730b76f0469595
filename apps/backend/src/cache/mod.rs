//! Read-through caches for data derived from the local crypto store.

pub mod region;
pub mod store;

pub use region::CacheRegion;
pub use store::CacheStore;
