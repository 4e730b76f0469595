use std::collections::HashMap;
use std::sync::Arc;

use moka::future::Cache;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::region::CacheRegion;

const SCAN_BATCH: usize = 200;
use crate::error::AppError;

const MEMORY_MAX_ENTRIES_PER_REGION: u64 = 10_000;

/// Region-scoped JSON cache. Cheap to clone.
///
/// Backend failures never surface to callers: a broken Redis read is a miss
/// and a broken write is dropped, both logged.
#[derive(Clone)]
pub struct CacheStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Memory(Arc<HashMap<CacheRegion, Cache<String, String>>>),
    Redis(Arc<Mutex<ConnectionManager>>),
}

impl CacheStore {
    /// In-process moka caches, one per region with the region's TTL.
    pub fn in_memory() -> Self {
        let regions = CacheRegion::ALL
            .into_iter()
            .map(|region| {
                let cache = Cache::builder()
                    .max_capacity(MEMORY_MAX_ENTRIES_PER_REGION)
                    .time_to_live(region.ttl())
                    .build();
                (region, cache)
            })
            .collect();

        Self {
            backend: Backend::Memory(Arc::new(regions)),
        }
    }

    /// Shared Redis backend; keys are `{region}::{key}` with `SET EX`.
    pub async fn redis(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url)
            .map_err(|err| AppError::config(format!("Invalid REDIS_URL: {err}")))?;
        let manager = ConnectionManager::new(client).await.map_err(|err| {
            AppError::config(format!("Unable to initialize Redis connection manager: {err}"))
        })?;

        info!("cache backend=redis");
        Ok(Self {
            backend: Backend::Redis(Arc::new(Mutex::new(manager))),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Memory(_) => "memory",
            Backend::Redis(_) => "redis",
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, region: CacheRegion, key: &str) -> Option<T> {
        let raw = self.get_raw(region, key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(region = region.name(), key, "cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(region = region.name(), key, error = %err, "discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn put_json<T: Serialize>(&self, region: CacheRegion, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.put_raw(region, key, raw).await,
            Err(err) => warn!(region = region.name(), key, error = %err, "cache value not serializable"),
        }
    }

    /// Read-through helper: cached value if present, otherwise `load` and store it.
    pub async fn get_or_load<T, F, Fut>(
        &self,
        region: CacheRegion,
        key: &str,
        load: F,
    ) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, AppError>>,
    {
        if let Some(hit) = self.get_json(region, key).await {
            return Ok(hit);
        }
        let value = load().await?;
        self.put_json(region, key, &value).await;
        Ok(value)
    }

    pub async fn invalidate(&self, region: CacheRegion) {
        match &self.backend {
            Backend::Memory(regions) => {
                if let Some(cache) = regions.get(&region) {
                    cache.invalidate_all();
                    cache.run_pending_tasks().await;
                }
            }
            Backend::Redis(conn) => {
                let pattern = format!("{}::*", region.name());
                let mut conn = conn.lock().await;
                let mut cursor: u64 = 0;
                loop {
                    let (next, keys): (u64, Vec<String>) = match redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut *conn)
                        .await
                    {
                        Ok(reply) => reply,
                        Err(err) => {
                            warn!(region = region.name(), error = %err, "redis SCAN failed; region not invalidated");
                            return;
                        }
                    };
                    if !keys.is_empty() {
                        if let Err(err) = conn.del::<_, ()>(keys).await {
                            warn!(region = region.name(), error = %err, "redis DEL failed; region not invalidated");
                            return;
                        }
                    }
                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
            }
        }
        debug!(region = region.name(), "cache region invalidated");
    }

    pub async fn invalidate_many(&self, regions: &[CacheRegion]) {
        for region in regions {
            self.invalidate(*region).await;
        }
    }

    pub async fn invalidate_all(&self) {
        self.invalidate_many(&CacheRegion::ALL).await;
    }

    async fn get_raw(&self, region: CacheRegion, key: &str) -> Option<String> {
        match &self.backend {
            Backend::Memory(regions) => regions.get(&region)?.get(key).await,
            Backend::Redis(conn) => {
                let mut conn = conn.lock().await;
                match conn.get::<_, Option<String>>(redis_key(region, key)).await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(region = region.name(), key, error = %err, "redis GET failed; treating as miss");
                        None
                    }
                }
            }
        }
    }

    async fn put_raw(&self, region: CacheRegion, key: &str, raw: String) {
        match &self.backend {
            Backend::Memory(regions) => {
                if let Some(cache) = regions.get(&region) {
                    cache.insert(key.to_string(), raw).await;
                }
            }
            Backend::Redis(conn) => {
                let mut conn = conn.lock().await;
                let ttl_secs = region.ttl().as_secs();
                if let Err(err) = conn
                    .set_ex::<_, _, ()>(redis_key(region, key), raw, ttl_secs)
                    .await
                {
                    warn!(region = region.name(), key, error = %err, "redis SET failed; value not cached");
                }
            }
        }
    }
}

fn redis_key(region: CacheRegion, key: &str) -> String {
    format!("{}::{}", region.name(), key)
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &self.backend_name())
            .finish()
    }
}
