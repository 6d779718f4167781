//! Wiring a `CacheRegistry` and a `CodeEngine` together, the way a
//! service would during startup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dawn_cache::registry::{BackendConfig, RegistryConfig};
use dawn_cache::{CacheRegistry, CodeEngine, CodeEngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut storage = HashMap::new();
    storage.insert(
        "sessions".to_string(),
        BackendConfig {
            driver: "memory".to_string(),
            gc_interval: Duration::from_secs(10),
            prefix: "dawn_cache_".to_string(),
            table: "dawn_cache".to_string(),
            connection: None,
        },
    );

    let registry = CacheRegistry::new(RegistryConfig {
        default: Some("sessions".to_string()),
        storage,
    })
    .await?;
    registry.start();

    let sessions = registry.store(None).expect("sessions backend");

    let codes = CodeEngine::new(Arc::clone(&sessions), CodeEngineConfig::default());
    codes.make(None, "alice@example.com", "confie:email:alice").await?;
    println!("code sent to alice@example.com, check stderr (or the configured log file)");

    registry.shutdown().await?;
    Ok(())
}
