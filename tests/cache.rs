//! Pipeline cache behavior: LRU order, single-flight loads, idle and
//! pressure eviction, and release-on-evict side effects.

mod common;

use std::sync::Arc;
use std::time::Duration;

use nmt_server::device::Device;
use nmt_server::models::ModelFamily;
use nmt_server::pipelines::{CacheKey, PipelineCache, PressureThresholds, StaticMemoryProbe};
use nmt_server::runtime::InferenceRuntime;

use common::MockRuntime;

fn cache_with(
    capacity: usize,
    runtime: Arc<MockRuntime>,
    ram_percent: Option<f64>,
) -> PipelineCache {
    let runtime_dyn: Arc<dyn InferenceRuntime> = runtime;
    PipelineCache::new(
        capacity,
        Device::Cpu,
        runtime_dyn,
        Arc::new(StaticMemoryProbe { ram_percent }),
        PressureThresholds {
            ram_critical: 90.0,
            gpu_critical: 90.0,
        },
    )
}

fn key(src: &str, tgt: &str) -> CacheKey {
    CacheKey::new(src, tgt, ModelFamily::OpusMt)
}

#[tokio::test]
async fn capacity_one_keeps_most_recently_used() -> anyhow::Result<()> {
    let runtime = Arc::new(MockRuntime::loading_everything());
    let cache = cache_with(1, Arc::clone(&runtime), None);

    cache.get_or_load(&key("en", "de"), "model-en-de").await?;
    cache.get_or_load(&key("de", "en"), "model-de-en").await?;

    // First entry was evicted and its weights released
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&key("en", "de")).is_none());
    assert!(cache.get(&key("de", "en")).is_some());
    assert_eq!(runtime.released_handles(), vec!["handle:model-en-de"]);

    // Alternate again: the survivor is always the most recently used
    cache.get_or_load(&key("en", "de"), "model-en-de").await?;
    assert!(cache.get(&key("en", "de")).is_some());
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[tokio::test]
async fn size_never_exceeds_capacity() -> anyhow::Result<()> {
    let runtime = Arc::new(MockRuntime::loading_everything());
    let cache = Arc::new(cache_with(2, Arc::clone(&runtime), None));

    for (src, tgt) in [("en", "de"), ("de", "en"), ("en", "fr"), ("fr", "en")] {
        cache
            .get_or_load(&key(src, tgt), &format!("model-{src}-{tgt}"))
            .await?;
        assert!(cache.len() <= 2);
    }
    Ok(())
}

#[tokio::test]
async fn concurrent_misses_collapse_into_one_load() -> anyhow::Result<()> {
    let runtime = Arc::new(MockRuntime {
        load_delay: Duration::from_millis(100),
        ..MockRuntime::default()
    });
    let cache = Arc::new(cache_with(4, Arc::clone(&runtime), None));

    let a = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get_or_load(&key("en", "de"), "model-en-de").await })
    };
    let b = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get_or_load(&key("en", "de"), "model-en-de").await })
    };

    let first = a.await??;
    let second = b.await??;
    assert_eq!(first.model_id, second.model_id);
    assert_eq!(runtime.loads(), 1);
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_load_leaves_cache_unchanged_and_permits_retry() {
    let runtime = Arc::new(MockRuntime::loading_only(&[]));
    let cache = cache_with(4, Arc::clone(&runtime), None);

    let error = cache
        .get_or_load(&key("en", "de"), "model-en-de")
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        nmt_server::common::error::NmtError::ModelLoad(_)
    ));
    assert_eq!(cache.len(), 0);

    // The single-flight entry was cleared; a retry reaches the runtime
    let again = cache.get_or_load(&key("en", "de"), "model-en-de").await;
    assert!(again.is_err());
}

#[tokio::test]
async fn idle_eviction_respects_timeout_and_access_times() -> anyhow::Result<()> {
    let runtime = Arc::new(MockRuntime::loading_everything());
    let cache = cache_with(4, Arc::clone(&runtime), None);

    cache.get_or_load(&key("en", "de"), "model-en-de").await?;
    cache.get_or_load(&key("en", "fr"), "model-en-fr").await?;

    // Zero timeout disables the idle evictor
    assert!(cache.evict_idle(Duration::ZERO).await.is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    // Refresh one entry; only the stale one goes
    cache.get(&key("en", "fr"));
    let evicted = cache.evict_idle(Duration::from_millis(25)).await;
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].to_string(), "en->de:opus-mt");
    assert!(cache.get(&key("en", "fr")).is_some());
    Ok(())
}

#[tokio::test]
async fn pressure_eviction_drains_until_cache_empty() -> anyhow::Result<()> {
    let runtime = Arc::new(MockRuntime::loading_everything());
    // RAM pinned above the critical threshold: every entry must go
    let cache = cache_with(4, Arc::clone(&runtime), Some(97.0));

    cache.get_or_load(&key("en", "de"), "model-en-de").await?;
    cache.get_or_load(&key("en", "fr"), "model-en-fr").await?;

    let evicted = cache.evict_under_pressure().await;
    assert_eq!(evicted.len(), 2);
    assert_eq!(cache.len(), 0);
    assert_eq!(runtime.released_handles().len(), 2);
    Ok(())
}

#[tokio::test]
async fn no_pressure_means_no_eviction() -> anyhow::Result<()> {
    let runtime = Arc::new(MockRuntime::loading_everything());
    let cache = cache_with(4, Arc::clone(&runtime), Some(50.0));

    cache.get_or_load(&key("en", "de"), "model-en-de").await?;
    assert!(cache.evict_under_pressure().await.is_empty());
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[tokio::test]
async fn purge_all_releases_everything() -> anyhow::Result<()> {
    let runtime = Arc::new(MockRuntime::loading_everything());
    let cache = cache_with(4, Arc::clone(&runtime), None);

    cache.get_or_load(&key("en", "de"), "model-en-de").await?;
    cache.get_or_load(&key("en", "fr"), "model-en-fr").await?;
    cache.purge_all().await;

    assert_eq!(cache.len(), 0);
    assert_eq!(runtime.released_handles().len(), 2);
    Ok(())
}
