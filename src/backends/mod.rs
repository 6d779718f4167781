//! Built-in `Cache` backends.
//!
//! - [`memory`] — in-process, `DashMap`-backed, with a manual reaper task.
//! - [`sql`] — a single SQL table over `sqlx::AnyPool`, upsert-on-write.
//! - [`netkv`] — an external networked KV store (Redis), native TTL.

pub mod memory;
pub mod netkv;
pub mod sql;

pub use memory::MemoryCache;
pub use netkv::NetKVCache;
pub use sql::SqlCache;
