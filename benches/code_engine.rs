//! Benchmarks for `CodeEngine::make`/`verify` against `MemoryCache`.

use criterion::{criterion_group, criterion_main, Criterion};
use dawn_cache::backends::memory::{MemoryCache, MemoryConfig};
use dawn_cache::{Cache, CodeEngine, CodeEngineConfig};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn bench_make(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = rt.block_on(async {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(MemoryConfig::default()));
        CodeEngine::new(cache, CodeEngineConfig::default())
    });

    c.bench_function("code_engine_make", |b| {
        b.to_async(&rt)
            .iter(|| async { engine.make(None, "bench@example.com", "bench:key").await.unwrap() });
    });
}

fn bench_verify(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = rt.block_on(async {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new(MemoryConfig::default()));
        CodeEngine::new(cache, CodeEngineConfig::default())
    });

    c.bench_function("code_engine_verify_mismatch", |b| {
        b.to_async(&rt).iter(|| async {
            engine.make(None, "bench@example.com", "bench:verify").await.unwrap();
            let _ = engine.verify("bench:verify", "000000").await;
        });
    });
}

criterion_group!(benches, bench_make, bench_verify);
criterion_main!(benches);
