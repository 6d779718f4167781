//! In-process `Cache` backend over a `DashMap`.
//!
//! Values live only in this process; nothing survives a restart and
//! nothing is shared across processes (see the crate's Non-goals).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{now_unix, Cache};
use crate::error::CacheError;

const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    /// Unix seconds. `0` means the entry never expires.
    expiry: i64,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.expiry == 0 || self.expiry >= now_unix()
    }
}

/// Configuration for [`MemoryCache`].
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// How often the background reaper sweeps for expired entries.
    pub gc_interval: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            gc_interval: DEFAULT_GC_INTERVAL,
        }
    }
}

/// In-process concurrent cache backend.
pub struct MemoryCache {
    map: Arc<DashMap<String, Entry>>,
    shutdown_tx: watch::Sender<bool>,
    reaper: JoinHandle<()>,
}

impl MemoryCache {
    /// Creates a `MemoryCache` and starts its background reaper task.
    #[must_use]
    pub fn new(config: MemoryConfig) -> Self {
        info!(gc_interval = ?config.gc_interval, "[Memory] starting cache");

        let map: Arc<DashMap<String, Entry>> = Arc::new(DashMap::new());
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let reaper_map = map.clone();
        let gc_interval = config.gc_interval;
        let reaper = tokio::spawn(async move {
            let mut interval = tokio::time::interval(gc_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let now = now_unix();
                        let mut removed = 0;
                        reaper_map.retain(|_, entry| {
                            if entry.expiry == 0 || entry.expiry >= now {
                                true
                            } else {
                                removed += 1;
                                false
                            }
                        });
                        if removed > 0 {
                            debug!(count = removed, "[Memory] reaper removed expired entries");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            return;
                        }
                    }
                }
            }
        });

        Self {
            map,
            shutdown_tx,
            reaper,
        }
    }

    fn live_value(&self, key: &str) -> Option<Vec<u8>> {
        let Some(entry) = self.map.get(key) else {
            return None;
        };
        if entry.is_live() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.map.remove(key);
            None
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl Drop for MemoryCache {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        self.reaper.abort();
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.live_value(key).is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.live_value(key))
    }

    async fn many(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>, CacheError> {
        Ok(keys.iter().map(|key| self.live_value(key)).collect())
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return self.forever(key, value).await;
        }
        let expiry = now_unix() + i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.map.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expiry,
            },
        );
        debug!(key = %key, ttl_secs = ttl.as_secs(), "[Memory] set");
        Ok(())
    }

    async fn pull(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let value = self.live_value(key);
        if value.is_some() {
            self.map.remove(key);
        }
        Ok(value)
    }

    async fn forever(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.map.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expiry: 0,
            },
        );
        debug!(key = %key, "[Memory] set forever");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.map.remove(key);
        Ok(())
    }

    async fn reset(&self) -> Result<(), CacheError> {
        self.map.clear();
        Ok(())
    }

    async fn close(&self) -> Result<(), CacheError> {
        // Idempotent: sending on a watch channel that already holds `true`
        // is harmless, unlike closing an already-closed Go channel.
        let _ = self.shutdown_tx.send(true);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> MemoryCache {
        MemoryCache::new(MemoryConfig {
            gc_interval: Duration::from_millis(50),
        })
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let c = cache();
        c.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(c.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert!(c.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn expired_entry_is_absent() {
        let c = cache();
        c.set("k", b"v", Duration::from_secs(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(c.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn zero_ttl_set_is_equivalent_to_forever() {
        let c = cache();
        c.set("k", b"v", Duration::from_secs(0)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(c.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn forever_survives_reaper_sweep() {
        let c = cache();
        c.forever("k", b"v").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(c.get("k").await.unwrap(), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn pull_removes_entry() {
        let c = cache();
        c.set("k", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(c.pull("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(c.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn pull_or_default_leaves_absent_key_untouched() {
        let c = cache();
        assert_eq!(
            c.pull_or_default("missing", b"fallback".to_vec())
                .await
                .unwrap(),
            b"fallback".to_vec()
        );
    }

    #[tokio::test]
    async fn many_preserves_order_and_marks_misses() {
        let c = cache();
        c.set("a", b"1", Duration::from_secs(60)).await.unwrap();
        c.set("c", b"3", Duration::from_secs(60)).await.unwrap();
        let values = c.many(&["a", "b", "c"]).await.unwrap();
        assert_eq!(
            values,
            vec![Some(b"1".to_vec()), None, Some(b"3".to_vec())]
        );
    }

    #[tokio::test]
    async fn remember_stores_producer_result_on_miss() {
        let c = cache();
        let value = c
            .remember(
                "k",
                Duration::from_secs(60),
                Box::new(|| Box::pin(async { Ok(b"computed".to_vec()) })),
            )
            .await
            .unwrap();
        assert_eq!(value, b"computed".to_vec());
        assert_eq!(c.get("k").await.unwrap(), Some(b"computed".to_vec()));
    }

    #[tokio::test]
    async fn remember_does_not_invoke_producer_on_hit() {
        let c = cache();
        c.set("k", b"cached", Duration::from_secs(60)).await.unwrap();
        let value = c
            .remember(
                "k",
                Duration::from_secs(60),
                Box::new(|| {
                    Box::pin(async { panic!("producer should not run on a cache hit") })
                }),
            )
            .await
            .unwrap();
        assert_eq!(value, b"cached".to_vec());
    }

    #[tokio::test]
    async fn reset_empties_the_cache() {
        let c = cache();
        c.set("a", b"1", Duration::from_secs(60)).await.unwrap();
        c.forever("b", b"2").await.unwrap();
        c.reset().await.unwrap();
        assert_eq!(c.get("a").await.unwrap(), None);
        assert_eq!(c.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let c = cache();
        c.close().await.unwrap();
        c.close().await.unwrap();
    }
}
