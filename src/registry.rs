//! `CacheRegistry` — named-backend dispatch.
//!
//! Builds and owns every configured backend, resolves a name (or the
//! configured fallback) to its `Arc<dyn Cache>`, and drives their
//! lifecycle (`start`/`shutdown`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::backends::{MemoryCache, NetKVCache, SqlCache};
use crate::backends::memory::MemoryConfig;
use crate::backends::netkv::NetKVConfig;
use crate::backends::sql::SqlConfig;
use crate::cache::Cache;
use crate::error::CacheError;

const DEFAULT_FALLBACK: &str = "memory";

fn default_gc_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_prefix() -> String {
    "dawn_cache_".to_string()
}

fn default_table() -> String {
    "dawn_cache".to_string()
}

/// A single backend's configuration, as found under `cache.storage.<name>`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// `"memory"`, `"sql"`, or `"netkv"` (case-insensitive).
    pub driver: String,

    /// Background reaper interval. Ignored by the `netkv` driver, which
    /// has no reaper.
    #[serde(default = "default_gc_interval", deserialize_with = "seconds::deserialize")]
    pub gc_interval: Duration,

    /// Key prefix. Used by the `sql` and `netkv` drivers.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Table name. Used only by the `sql` driver.
    #[serde(default = "default_table")]
    pub table: String,

    /// Opaque connection identifier, e.g. a DSN or Redis URL. Used by
    /// the `sql` and `netkv` drivers; ignored by `memory`.
    #[serde(default)]
    pub connection: Option<String>,
}

/// The top-level `cache.*` configuration document, already parsed by the
/// caller's configuration layer (this crate never reads files or env
/// vars itself).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RegistryConfig {
    /// Name of the backend to use when callers don't name one. Defaults
    /// to `"memory"` when unset and `storage` is empty.
    #[serde(default)]
    pub default: Option<String>,

    /// Named backend configurations.
    #[serde(default)]
    pub storage: HashMap<String, BackendConfig>,
}

/// Dispatches named `Cache` backends by a storage map and fallback name.
pub struct CacheRegistry {
    storage: HashMap<String, Arc<dyn Cache>>,
    fallback: String,
}

impl CacheRegistry {
    /// Builds every backend named in `config.storage` (or a single
    /// default `memory` backend if `storage` is empty).
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Configuration`] if a backend names an
    /// unknown driver, or [`CacheError::Transport`] if a `sql`/`netkv`
    /// backend fails to connect.
    pub async fn new(config: RegistryConfig) -> Result<Self, CacheError> {
        let mut storage: HashMap<String, Arc<dyn Cache>> = HashMap::new();

        if config.storage.is_empty() {
            let fallback = config.default.unwrap_or_else(|| DEFAULT_FALLBACK.to_string());
            storage.insert(
                fallback.clone(),
                Arc::new(MemoryCache::new(MemoryConfig::default())) as Arc<dyn Cache>,
            );
            return Ok(Self { storage, fallback });
        }

        let fallback = config.default.unwrap_or_else(|| DEFAULT_FALLBACK.to_string());

        for (name, backend_config) in config.storage {
            let backend = build(&name, backend_config).await?;
            storage.insert(name, backend);
        }

        Ok(Self { storage, fallback })
    }

    /// Returns the named backend, or the fallback if `name` is `None`.
    ///
    /// Returns `None` if no backend is registered under that name.
    #[must_use]
    pub fn store(&self, name: Option<&str>) -> Option<Arc<dyn Cache>> {
        let key = name.unwrap_or(&self.fallback);
        self.storage.get(key).cloned()
    }

    /// Starts every backend's background tasks. A no-op here since every
    /// backend starts its reaper eagerly at construction.
    pub fn start(&self) {}

    /// Closes every backend, collecting (rather than short-circuiting
    /// on) the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered, after every backend has had
    /// `close()` called on it.
    pub async fn shutdown(&self) -> Result<(), CacheError> {
        let mut first_error = None;
        for backend in self.storage.values() {
            if let Err(e) = backend.close().await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

async fn build(name: &str, config: BackendConfig) -> Result<Arc<dyn Cache>, CacheError> {
    match config.driver.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryCache::new(MemoryConfig {
            gc_interval: config.gc_interval,
        }))),
        "sql" => {
            let connection = config.connection.ok_or_else(|| {
                CacheError::Configuration(format!("storage {name}: sql driver requires `connection`"))
            })?;
            let sql_config = SqlConfig {
                connection,
                table: config.table,
                prefix: config.prefix,
                gc_interval: config.gc_interval,
            };
            Ok(Arc::new(SqlCache::connect(sql_config).await?))
        }
        "netkv" => {
            let connection = config.connection.ok_or_else(|| {
                CacheError::Configuration(format!("storage {name}: netkv driver requires `connection`"))
            })?;
            let netkv_config = NetKVConfig {
                connection,
                prefix: config.prefix,
            };
            Ok(Arc::new(NetKVCache::connect(netkv_config).await?))
        }
        other => Err(CacheError::Configuration(format!(
            "dawn:cache unknown driver {other} of {name}"
        ))),
    }
}

/// `humantime_serde`-style deserialization of `Duration` as whole
/// seconds, since the configuration document carries plain integers,
/// not humantime strings.
mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_storage_falls_back_to_a_single_memory_backend() {
        let registry = CacheRegistry::new(RegistryConfig::default()).await.unwrap();
        let store = registry.store(None).expect("fallback backend");
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn named_backend_is_resolved_by_name() {
        let mut storage = HashMap::new();
        storage.insert(
            "sessions".to_string(),
            BackendConfig {
                driver: "memory".to_string(),
                gc_interval: Duration::from_secs(10),
                prefix: default_prefix(),
                table: default_table(),
                connection: None,
            },
        );
        let registry = CacheRegistry::new(RegistryConfig {
            default: Some("sessions".to_string()),
            storage,
        })
        .await
        .unwrap();

        assert!(registry.store(Some("sessions")).is_some());
        assert!(registry.store(None).is_some());
        assert!(registry.store(Some("missing")).is_none());
    }

    #[tokio::test]
    async fn unknown_driver_is_a_configuration_error() {
        let mut storage = HashMap::new();
        storage.insert(
            "bogus".to_string(),
            BackendConfig {
                driver: "filesystem".to_string(),
                gc_interval: Duration::from_secs(10),
                prefix: default_prefix(),
                table: default_table(),
                connection: None,
            },
        );
        let result = CacheRegistry::new(RegistryConfig {
            default: None,
            storage,
        })
        .await;
        assert!(matches!(result, Err(CacheError::Configuration(_))));
    }
}
