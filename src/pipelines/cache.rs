//! LRU cache of loaded translation pipelines.
//!
//! Three eviction pressures: capacity (LRU), idle age, and memory. Model
//! loading happens outside the cache lock with per-key single-flight, so
//! a burst of requests for one pair produces exactly one load. Every
//! eviction hands the pipeline back to the runtime for release before the
//! cache accepts the next insert.

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::common::error::NmtError;
use crate::device::Device;
use crate::models::ModelFamily;
use crate::pipelines::memory::MemoryProbe;
use crate::runtime::{InferenceRuntime, RuntimeHandle};

const PRESSURE_HYSTERESIS: f64 = 5.0;

/// Cache key: one entry per (pair, family).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub src: String,
    pub tgt: String,
    pub family: ModelFamily,
}

impl CacheKey {
    pub fn new(src: &str, tgt: &str, family: ModelFamily) -> CacheKey {
        CacheKey {
            src: src.to_string(),
            tgt: tgt.to_string(),
            family,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.src, self.tgt, self.family)
    }
}

/// A loaded pipeline. Owned by the cache; borrowed by callers as `Arc`.
/// Never mutated after creation.
#[derive(Debug)]
pub struct Pipeline {
    pub handle: RuntimeHandle,
    pub model_id: String,
    pub family: ModelFamily,
    pub device: Device,
    pub size_hint_bytes: Option<u64>,
}

struct CacheEntry {
    pipeline: Arc<Pipeline>,
    last_access: Instant,
}

/// Snapshot for the `/cache` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub capacity: usize,
    pub size: usize,
    pub keys: Vec<String>,
}

/// Memory thresholds driving pressure eviction.
#[derive(Clone, Copy, Debug)]
pub struct PressureThresholds {
    pub ram_critical: f64,
    pub gpu_critical: f64,
}

pub struct PipelineCache {
    inner: Mutex<LruCache<CacheKey, CacheEntry>>,
    loading: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    capacity: usize,
    device: Device,
    runtime: Arc<dyn InferenceRuntime>,
    memory_probe: Arc<dyn MemoryProbe>,
    thresholds: PressureThresholds,
}

impl PipelineCache {
    pub fn new(
        capacity: usize,
        device: Device,
        runtime: Arc<dyn InferenceRuntime>,
        memory_probe: Arc<dyn MemoryProbe>,
        thresholds: PressureThresholds,
    ) -> PipelineCache {
        let capacity = capacity.max(1);
        PipelineCache {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).expect("capacity is at least 1"),
            )),
            loading: Mutex::new(HashMap::new()),
            capacity,
            device,
            runtime,
            memory_probe,
            thresholds,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fast-path lookup. On a hit the entry moves to the MRU end and its
    /// last-access time is refreshed. Never blocks on I/O.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<Pipeline>> {
        let mut inner = self.inner.lock();
        let size = inner.len();
        match inner.get_mut(key) {
            Some(entry) => {
                entry.last_access = Instant::now();
                info!("cache hit: {key} ({size}/{} models cached)", self.capacity);
                Some(Arc::clone(&entry.pipeline))
            }
            None => {
                info!("cache miss: {key} ({size}/{} models cached)", self.capacity);
                None
            }
        }
    }

    /// Lookup with load-on-miss. Concurrent misses for the same key
    /// collapse into a single runtime load; the losers wait and reuse the
    /// winner's pipeline. A failed load leaves the cache unchanged and
    /// permits a retry.
    pub async fn get_or_load(
        &self,
        key: &CacheKey,
        model_id: &str,
    ) -> Result<Arc<Pipeline>, NmtError> {
        if let Some(pipeline) = self.get(key) {
            return Ok(pipeline);
        }

        let load_guard = {
            let mut loading = self.loading.lock();
            Arc::clone(
                loading
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        let _held = load_guard.lock().await;

        // The winner of the race may have inserted while we waited.
        if let Some(pipeline) = self.get(key) {
            return Ok(pipeline);
        }

        let loaded = self.runtime.load(model_id, self.device).await;

        match loaded {
            Ok(loaded) => {
                let pipeline = Arc::new(Pipeline {
                    handle: loaded.handle,
                    model_id: model_id.to_string(),
                    family: key.family,
                    device: self.device,
                    size_hint_bytes: loaded.size_hint_bytes,
                });
                // Insert before clearing the single-flight entry: a miss
                // arriving in between must find either the guard or the
                // cached pipeline, never neither.
                self.insert(key.clone(), Arc::clone(&pipeline)).await;
                self.loading.lock().remove(key);
                info!("loaded model {model_id} for {key}");
                Ok(pipeline)
            }
            Err(error) => {
                self.loading.lock().remove(key);
                match error {
                    NmtError::ModelLoad(message) => Err(NmtError::ModelLoad(message)),
                    other => Err(NmtError::ModelLoad(other.to_string())),
                }
            }
        }
    }

    async fn insert(&self, key: CacheKey, pipeline: Arc<Pipeline>) {
        // Make room first so the evicted weights are off-device before the
        // new entry lands.
        let evicted = {
            let mut inner = self.inner.lock();
            let mut out = Vec::new();
            while inner.len() >= self.capacity {
                match inner.pop_lru() {
                    Some(item) => out.push(item),
                    None => break,
                }
            }
            out
        };
        for (old_key, entry) in evicted {
            warn!("cache full, evicting {old_key} to make room for {key}");
            self.release_entry(&old_key, entry).await;
        }

        let replaced = {
            let mut inner = self.inner.lock();
            let mut extra = Vec::new();
            while inner.len() >= self.capacity {
                match inner.pop_lru() {
                    Some(item) => extra.push(item),
                    None => break,
                }
            }
            if let Some(old) = inner.push(
                key.clone(),
                CacheEntry {
                    pipeline,
                    last_access: Instant::now(),
                },
            ) {
                // A same-key reload displaces the previous pipeline, which
                // must be released like any other eviction.
                extra.push(old);
            }
            extra
        };
        for (old_key, entry) in replaced {
            self.release_entry(&old_key, entry).await;
        }
    }

    /// Remove every entry idle for longer than `timeout`. A zero timeout
    /// disables idle eviction entirely.
    pub async fn evict_idle(&self, timeout: Duration) -> Vec<CacheKey> {
        if timeout.is_zero() {
            return Vec::new();
        }

        let now = Instant::now();
        let idle: Vec<(CacheKey, CacheEntry)> = {
            let mut inner = self.inner.lock();
            let keys: Vec<CacheKey> = inner
                .iter()
                .filter(|(_, entry)| now.duration_since(entry.last_access) > timeout)
                .map(|(key, _)| key.clone())
                .collect();
            keys.into_iter()
                .filter_map(|key| inner.pop(&key).map(|entry| (key, entry)))
                .collect()
        };

        let mut evicted = Vec::with_capacity(idle.len());
        for (key, entry) in idle {
            let idle_for = now.duration_since(entry.last_access);
            info!("evicting idle model {key} (idle for {}s)", idle_for.as_secs());
            self.release_entry(&key, entry).await;
            evicted.push(key);
        }
        evicted
    }

    /// Evict LRU entries while system RAM or GPU VRAM is above its
    /// critical threshold, stopping once the largest pressure source falls
    /// below threshold minus hysteresis or the cache is empty.
    pub async fn evict_under_pressure(&self) -> Vec<CacheKey> {
        let mut evicted = Vec::new();
        let mut triggered = false;
        loop {
            let ram = self.memory_probe.system_ram_percent();
            let gpu = if self.device.is_gpu() {
                self.runtime.memory().await.gpu_percent
            } else {
                None
            };

            let over_critical = ram.map_or(false, |pct| pct >= self.thresholds.ram_critical)
                || gpu.map_or(false, |pct| pct >= self.thresholds.gpu_critical);
            let over_floor = ram
                .map_or(false, |pct| pct > self.thresholds.ram_critical - PRESSURE_HYSTERESIS)
                || gpu.map_or(false, |pct| {
                    pct > self.thresholds.gpu_critical - PRESSURE_HYSTERESIS
                });

            if !triggered {
                if !over_critical {
                    break;
                }
                triggered = true;
            } else if !over_floor {
                break;
            }

            let popped = self.inner.lock().pop_lru();
            match popped {
                Some((key, entry)) => {
                    warn!(
                        "memory pressure (ram: {ram:?}%, gpu: {gpu:?}%), evicting {key}"
                    );
                    self.release_entry(&key, entry).await;
                    evicted.push(key);
                }
                None => break,
            }
        }
        evicted
    }

    /// Drop every cached pipeline, releasing device memory. Used at
    /// shutdown.
    pub async fn purge_all(&self) {
        loop {
            let popped = self.inner.lock().pop_lru();
            match popped {
                Some((key, entry)) => self.release_entry(&key, entry).await,
                None => break,
            }
        }
    }

    pub fn status(&self) -> CacheStatus {
        let inner = self.inner.lock();
        // lru iterates MRU-first; report LRU-first like insertion order
        let mut keys: Vec<String> = inner.iter().map(|(key, _)| key.to_string()).collect();
        keys.reverse();
        CacheStatus {
            capacity: self.capacity,
            size: inner.len(),
            keys,
        }
    }

    async fn release_entry(&self, key: &CacheKey, entry: CacheEntry) {
        let handle = entry.pipeline.handle.clone();
        if let Err(error) = self.runtime.release(handle).await {
            warn!("error releasing {key}: {error}");
        }
    }
}
