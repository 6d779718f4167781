//! Basic `Cache` usage against the in-process `MemoryCache` backend.

use dawn_cache::backends::memory::{MemoryCache, MemoryConfig};
use dawn_cache::Cache;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cache = MemoryCache::new(MemoryConfig::default());

    cache.set("user:1", b"alice", Duration::from_secs(60)).await?;
    println!("get user:1 -> {:?}", cache.get("user:1").await?);

    cache.forever("config:feature_flag", b"enabled").await?;

    let value = cache
        .remember(
            "expensive:computation",
            Duration::from_secs(30),
            Box::new(|| {
                Box::pin(async {
                    println!("computing (this only happens once)...");
                    Ok(b"42".to_vec())
                })
            }),
        )
        .await?;
    println!("remembered value: {}", String::from_utf8_lossy(&value));

    cache.close().await?;
    Ok(())
}
