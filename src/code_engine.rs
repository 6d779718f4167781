//! `CodeEngine` — generates, stores, and verifies one-time numeric codes.
//!
//! Each named "envoy" pairs a [`Sender`](crate::sender::Sender) with the
//! shared cache backend and TTL/length settings the engine was built
//! with.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::Rng;
use serde::Deserialize;

use crate::cache::Cache;
use crate::error::CodeError;
use crate::sender::{LocalSender, LocalSenderConfig, Sender};

const DEFAULT_CODE_LENGTH: usize = 6;
const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_ENVOY: &str = "local";

fn default_code_length() -> usize {
    DEFAULT_CODE_LENGTH
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL.as_secs()
}

fn default_envoy() -> String {
    DEFAULT_ENVOY.to_string()
}

/// A single envoy's configuration, as found under `confie.envoys.<name>`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct EnvoyConfig {
    /// If set, codes sent through this envoy are appended to this file
    /// instead of stderr.
    pub log_file: Option<String>,
}

/// The top-level `confie.*` configuration document, already parsed by
/// the caller's configuration layer.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeEngineConfig {
    /// Digits per generated code.
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// How long a generated code remains valid, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Name of the envoy to use when callers don't name one.
    #[serde(default = "default_envoy")]
    pub default: String,

    /// Named envoy configurations. Only the `"local"` driver is built in.
    #[serde(default)]
    pub envoys: HashMap<String, EnvoyConfig>,
}

impl Default for CodeEngineConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            ttl_secs: DEFAULT_TTL.as_secs(),
            default: DEFAULT_ENVOY.to_string(),
            envoys: HashMap::new(),
        }
    }
}

struct Envoy {
    sender: Arc<dyn Sender>,
}

/// Generates, stores, and verifies one-time numeric codes.
pub struct CodeEngine {
    pub(crate) cache: Arc<dyn Cache>,
    code_length: usize,
    ttl: Duration,
    envoys: HashMap<String, Envoy>,
    fallback: String,
}

impl CodeEngine {
    /// Builds a `CodeEngine` storing codes in `cache`, per `config`.
    ///
    /// If `config.envoys` is empty, a single `"local"` envoy (stderr
    /// sink) is registered under `config.default`.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, config: CodeEngineConfig) -> Self {
        let mut envoys = HashMap::new();

        if config.envoys.is_empty() {
            envoys.insert(
                config.default.clone(),
                Envoy {
                    sender: Arc::new(LocalSender::default()),
                },
            );
        } else {
            for (name, envoy_config) in config.envoys {
                let sender = Arc::new(LocalSender::new(LocalSenderConfig {
                    log_file: envoy_config.log_file,
                }));
                envoys.insert(name, Envoy { sender });
            }
        }

        Self {
            cache,
            code_length: config.code_length,
            ttl: Duration::from_secs(config.ttl_secs),
            envoys,
            fallback: config.default,
        }
    }

    fn envoy(&self, name: Option<&str>) -> Option<&Envoy> {
        self.envoys.get(name.unwrap_or(&self.fallback))
    }

    fn generate_code(&self) -> String {
        let mut rng = OsRng;
        (0..self.code_length)
            .map(|_| char::from_digit(rng.gen_range(0..10), 10).unwrap_or('0'))
            .collect()
    }

    /// Generates a code, stores it under `key` with this engine's TTL,
    /// then sends it to `address` through the named (or fallback) envoy.
    ///
    /// If the cache write fails, the envoy's sender is never invoked.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Cache`] if the write fails, or wraps a
    /// sender failure the same way.
    pub async fn make(
        &self,
        envoy: Option<&str>,
        address: &str,
        key: &str,
    ) -> Result<(), CodeError> {
        let envoy = self.envoy(envoy).ok_or_else(|| {
            CodeError::Cache(crate::error::CacheError::Configuration(
                "dawn:confie unknown envoy".to_string(),
            ))
        })?;

        let code = self.generate_code();
        self.cache.set(key, code.as_bytes(), self.ttl).await?;

        envoy
            .sender
            .send(address, &code)
            .await
            .map_err(crate::error::CacheError::Producer)?;

        Ok(())
    }

    /// Verifies `code` against the value stored under `key`.
    ///
    /// A mismatch — including an absent/expired key — yields
    /// [`CodeError::NotMatched`] and leaves the stored record untouched.
    /// A match deletes the record (best-effort: deletion failure is not
    /// surfaced) and returns `Ok(())`, so a given code can only verify
    /// once.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError::Cache`] if the read fails, or
    /// [`CodeError::NotMatched`] on mismatch/absence.
    pub async fn verify(&self, key: &str, code: &str) -> Result<(), CodeError> {
        let stored = self.cache.get(key).await?;

        match stored {
            Some(value) if value == code.as_bytes() => {
                let _ = self.cache.delete(key).await;
                Ok(())
            }
            _ => Err(CodeError::NotMatched),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{MemoryCache, MemoryConfig};

    fn engine() -> CodeEngine {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(MemoryConfig::default()));
        CodeEngine::new(
            cache,
            CodeEngineConfig {
                code_length: 6,
                ttl_secs: 300,
                default: "local".to_string(),
                envoys: HashMap::new(),
            },
        )
    }

    #[tokio::test]
    async fn make_then_verify_succeeds_once() {
        let engine = engine();
        engine.make(None, "alice@example.com", "k").await.unwrap();

        let stored = engine.cache.get("k").await.unwrap().unwrap();
        let code = String::from_utf8(stored).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        engine.verify("k", &code).await.unwrap();
        // second verification must fail: the record was consumed
        assert!(matches!(
            engine.verify("k", &code).await,
            Err(CodeError::NotMatched)
        ));
    }

    #[tokio::test]
    async fn verify_mismatch_leaves_record_in_place() {
        let engine = engine();
        engine.make(None, "alice@example.com", "k").await.unwrap();

        assert!(matches!(
            engine.verify("k", "000000").await,
            Err(CodeError::NotMatched)
        ));
        // record should still be there for a correct retry
        assert!(engine.cache.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn verify_absent_key_is_not_matched() {
        let engine = engine();
        assert!(matches!(
            engine.verify("missing", "123456").await,
            Err(CodeError::NotMatched)
        ));
    }
}
