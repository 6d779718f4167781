//! dawn-cache
//!
//! A pluggable key/value caching subsystem: a backend-agnostic `Cache`
//! contract with TTL expiry and background garbage collection, three
//! built-in backends (in-process, SQL, networked KV), a named-backend
//! `CacheRegistry`, and a one-time-code confirmation engine (`CodeEngine`)
//! with an `AuthFlow` shim on top.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use dawn_cache::{Cache, MemoryCache};
//! use dawn_cache::backends::memory::MemoryConfig;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = MemoryCache::new(MemoryConfig::default());
//!
//!     cache.set("user:1", b"alice", Duration::from_secs(60)).await?;
//!     if let Some(value) = cache.get("user:1").await? {
//!         println!("cached: {}", String::from_utf8_lossy(&value));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! CacheRegistry ──dispatches by name──> Arc<dyn Cache>
//!                                           ├── MemoryCache  (DashMap + reaper)
//!                                           ├── SqlCache     (sqlx::AnyPool + reaper)
//!                                           └── NetKVCache   (Redis, native TTL)
//!
//! CodeEngine ──stores codes via──> Arc<dyn Cache>
//!            ──delivers via──────> Arc<dyn Sender>
//!
//! AuthFlow ──verifies via──> CodeEngine
//!          ──delegates to──> UserStore (external collaborator)
//! ```

pub mod auth_flow;
pub mod backends;
pub mod cache;
pub mod code_engine;
pub mod error;
pub mod registry;
pub mod sender;

pub use auth_flow::{AuthFlow, Kind, UserId, UserStore};
pub use backends::{MemoryCache, NetKVCache, SqlCache};
pub use cache::{Cache, Producer, ProducerFuture};
pub use code_engine::{CodeEngine, CodeEngineConfig, EnvoyConfig};
pub use error::{AuthError, CacheError, CodeError};
pub use registry::{BackendConfig, CacheRegistry, RegistryConfig};
pub use sender::{LocalSender, LocalSenderConfig, Sender};

// Re-export async_trait so downstream crates implementing `Cache`,
// `Sender`, or `UserStore` don't need to depend on it separately.
pub use async_trait::async_trait;
