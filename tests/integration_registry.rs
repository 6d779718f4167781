//! Integration coverage for `CacheRegistry` built from a configuration
//! document, mirroring how a caller would wire it up.

use std::collections::HashMap;
use std::time::Duration;

use dawn_cache::registry::{BackendConfig, RegistryConfig};
use dawn_cache::{Cache, CacheRegistry};

fn backend_config(driver: &str) -> BackendConfig {
    BackendConfig {
        driver: driver.to_string(),
        gc_interval: Duration::from_secs(1),
        prefix: "dawn_cache_".to_string(),
        table: "dawn_cache".to_string(),
        connection: None,
    }
}

#[tokio::test]
async fn registry_with_no_storage_falls_back_to_memory() {
    let registry = CacheRegistry::new(RegistryConfig::default()).await.unwrap();
    let store = registry.store(None).expect("fallback store");

    store.set("k", b"v", Duration::from_secs(30)).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
}

#[tokio::test]
async fn registry_dispatches_multiple_named_backends_independently() {
    let mut storage = HashMap::new();
    storage.insert("sessions".to_string(), backend_config("memory"));
    storage.insert("tokens".to_string(), backend_config("memory"));

    let registry = CacheRegistry::new(RegistryConfig {
        default: Some("sessions".to_string()),
        storage,
    })
    .await
    .unwrap();

    let sessions = registry.store(Some("sessions")).unwrap();
    let tokens = registry.store(Some("tokens")).unwrap();

    sessions.set("k", b"session-value", Duration::from_secs(60)).await.unwrap();
    assert_eq!(tokens.get("k").await.unwrap(), None);
    assert_eq!(sessions.get("k").await.unwrap(), Some(b"session-value".to_vec()));
}

#[tokio::test]
async fn shutdown_closes_every_backend() {
    let mut storage = HashMap::new();
    storage.insert("a".to_string(), backend_config("memory"));
    storage.insert("b".to_string(), backend_config("memory"));

    let registry = CacheRegistry::new(RegistryConfig {
        default: None,
        storage,
    })
    .await
    .unwrap();

    registry.shutdown().await.unwrap();
}
