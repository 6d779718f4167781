//! Networked KV `Cache` backend (Redis).
//!
//! Unlike [`MemoryCache`](crate::backends::MemoryCache) and
//! [`SqlCache`](crate::backends::SqlCache), this backend has no reaper:
//! expiry is native to the store (`SET ... EX`), and a `forever` entry is
//! simply a key with no TTL set.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, info};

use crate::cache::Cache;
use crate::error::CacheError;

const DEFAULT_PREFIX: &str = "dawn_cache_";

/// Configuration for [`NetKVCache`].
#[derive(Debug, Clone)]
pub struct NetKVConfig {
    /// An opaque connection identifier, e.g. `"redis://127.0.0.1:6379"`.
    pub connection: String,
    /// Prefix applied to every key, so multiple backends can share a
    /// keyspace without colliding.
    pub prefix: String,
}

impl NetKVConfig {
    /// Builds a config pointed at `connection` with the crate's default
    /// key prefix.
    #[must_use]
    pub fn new(connection: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Redis-backed cache with native TTL and `SCAN`-based prefix reset.
pub struct NetKVCache {
    conn: ConnectionManager,
    prefix: String,
}

impl NetKVCache {
    /// Connects to `config.connection` and verifies reachability with a
    /// `PING`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Transport`] if the client cannot be built or
    /// the connection cannot be established.
    pub async fn connect(config: NetKVConfig) -> Result<Self, CacheError> {
        info!(connection = %config.connection, "[NetKV] connecting");

        let client = Client::open(config.connection.as_str())
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;

        Ok(Self {
            conn,
            prefix: config.prefix,
        })
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn scan_prefixed_keys(&self) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.prefix);
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(1000)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Transport(e.to_string()))?;

            cursor = next_cursor;
            keys.extend(batch);

            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %pattern, count = keys.len(), "[NetKV] scanned prefixed keys");
        Ok(keys)
    }
}

#[async_trait]
impl Cache for NetKVCache {
    async fn has(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn
            .exists(self.prefixed(key))
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        Ok(exists)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn
            .get(self.prefixed(key))
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        Ok(value)
    }

    async fn many(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>, CacheError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let prefixed: Vec<String> = keys.iter().map(|k| self.prefixed(k)).collect();
        let values: Vec<Option<Vec<u8>>> = conn
            .mget(&prefixed)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        Ok(values)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return self.forever(key, value).await;
        }
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(self.prefixed(key), value, ttl.as_secs())
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        debug!(key = %key, ttl_secs = ttl.as_secs(), "[NetKV] set");
        Ok(())
    }

    async fn pull(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let value = self.get(key).await?;
        if value.is_some() {
            self.delete(key).await?;
        }
        Ok(value)
    }

    async fn forever(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(self.prefixed(key), value)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        debug!(key = %key, "[NetKV] set forever");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(self.prefixed(key))
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn reset(&self) -> Result<(), CacheError> {
        let keys = self.scan_prefixed_keys().await?;
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: usize = conn
            .del(&keys)
            .await
            .map_err(|e| CacheError::Transport(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), CacheError> {
        // ConnectionManager has no explicit teardown; connections are
        // dropped with this value.
        Ok(())
    }

    fn name(&self) -> &'static str {
        "netkv"
    }
}
