//! The `Cache` contract.
//!
//! This is the trait every backend (`MemoryCache`, `SqlCache`,
//! `NetKVCache`) implements, and the trait object `CacheRegistry` and
//! `CodeEngine` hold callers behind (`Arc<dyn Cache>`).
//!
//! # Architecture
//!
//! Only `has`/`get`/`many`/`set`/`pull`/`forever`/`delete`/`reset`/`close`
//! are required. `get_or_default`, `pull_or_default`, `remember`, and
//! `remember_forever` are default methods built on top of those, so a new
//! backend needs only the primitives.
//!
//! `remember`/`remember_forever` take a boxed, type-erased producer rather
//! than a generic closure so the trait stays object-safe.

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::CacheError;

/// A boxed future yielding the value a `Remember` call should store on miss.
pub type ProducerFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, CacheError>> + Send + 'a>>;

/// A boxed, type-erased value producer for `remember`/`remember_forever`.
pub type Producer<'a> = Box<dyn FnOnce() -> ProducerFuture<'a> + Send + 'a>;

/// The pluggable key/value cache contract.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn Cache>` across async tasks.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Reports whether a live (non-expired) entry exists for `key`.
    async fn has(&self, key: &str) -> Result<bool, CacheError>;

    /// Retrieves the value stored for `key`, if any live entry exists.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Retrieves the value stored for `key`, or `default` if absent/expired.
    async fn get_or_default(&self, key: &str, default: Vec<u8>) -> Result<Vec<u8>, CacheError> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    /// Retrieves multiple values by key, preserving order. Missing or
    /// expired entries are `None` at their position.
    async fn many(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>, CacheError>;

    /// Stores `value` for `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Retrieves and deletes the value stored for `key`, if any.
    async fn pull(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Retrieves and deletes the value stored for `key`, or returns
    /// `default` if absent/expired (nothing is deleted in that case).
    async fn pull_or_default(&self, key: &str, default: Vec<u8>) -> Result<Vec<u8>, CacheError> {
        Ok(self.pull(key).await?.unwrap_or(default))
    }

    /// Stores `value` for `key` with no expiry.
    async fn forever(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Returns the cached value for `key`, or invokes `producer` on a miss
    /// and stores its result with the given `ttl` before returning it.
    ///
    /// Concurrent callers that both miss are not coalesced: both may
    /// invoke `producer` and both writes land, last write wins.
    async fn remember(
        &self,
        key: &str,
        ttl: Duration,
        producer: Producer<'_>,
    ) -> Result<Vec<u8>, CacheError> {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }
        let value = producer().await?;
        self.set(key, &value, ttl).await?;
        Ok(value)
    }

    /// As `remember`, but the produced value never expires.
    async fn remember_forever(
        &self,
        key: &str,
        producer: Producer<'_>,
    ) -> Result<Vec<u8>, CacheError> {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }
        let value = producer().await?;
        self.forever(key, &value).await?;
        Ok(value)
    }

    /// Removes the entry stored for `key`, if any.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Removes every entry owned by this backend.
    async fn reset(&self) -> Result<(), CacheError>;

    /// Stops this backend's background tasks (if any) and releases
    /// resources. Safe to call more than once.
    async fn close(&self) -> Result<(), CacheError>;

    /// A short identifier for this backend, used in logs.
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// Returns the current unix timestamp in seconds.
pub(crate) fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
