//! Shared test fixtures: a scriptable inference runtime and helpers to
//! wire a full application against it.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use nmt_server::api::{create_router, AppState};
use nmt_server::common::config::Config;
use nmt_server::common::error::NmtError;
use nmt_server::device::Device;
use nmt_server::lang::LanguageDetector;
use nmt_server::pipelines::{
    ModelDiscovery, PipelineCache, PressureThresholds, StaticMemoryProbe, TranslateGate,
    Translator,
};
use nmt_server::runtime::{
    InferenceRuntime, LoadedPipeline, MemoryReport, RuntimeCapabilities, RuntimeHandle,
    TranslateOptions,
};

/// Scriptable in-process runtime. Translations echo the input behind a
/// `[tgt_code]` tag so tests can assert routing decisions from outputs.
#[derive(Default)]
pub struct MockRuntime {
    /// Model ids that load successfully; `None` loads everything.
    pub loadable: Option<HashSet<String>>,
    /// `(src_code, tgt_code)` combinations whose translation fails.
    pub failing_pairs: Mutex<HashSet<(String, String)>>,
    pub load_delay: Duration,
    pub translate_delay: Duration,
    pub load_count: AtomicUsize,
    pub released: Mutex<Vec<String>>,
    pub gpu_percent: Mutex<Option<f64>>,
}

impl MockRuntime {
    pub fn loading_everything() -> MockRuntime {
        MockRuntime::default()
    }

    pub fn loading_only(model_ids: &[&str]) -> MockRuntime {
        MockRuntime {
            loadable: Some(model_ids.iter().map(|id| id.to_string()).collect()),
            ..MockRuntime::default()
        }
    }

    pub fn fail_pair(&self, src_code: &str, tgt_code: &str) {
        self.failing_pairs
            .lock()
            .insert((src_code.to_string(), tgt_code.to_string()));
    }

    pub fn loads(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn released_handles(&self) -> Vec<String> {
        self.released.lock().clone()
    }
}

#[async_trait]
impl InferenceRuntime for MockRuntime {
    async fn capabilities(&self) -> Result<RuntimeCapabilities, NmtError> {
        Ok(RuntimeCapabilities::default())
    }

    async fn load(&self, model_id: &str, _device: Device) -> Result<LoadedPipeline, NmtError> {
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        if let Some(loadable) = &self.loadable {
            if !loadable.contains(model_id) {
                return Err(NmtError::ModelLoad(format!("{model_id}: not available")));
            }
        }
        self.load_count.fetch_add(1, Ordering::SeqCst);
        Ok(LoadedPipeline {
            handle: RuntimeHandle(format!("handle:{model_id}")),
            size_hint_bytes: None,
        })
    }

    async fn translate(
        &self,
        _handle: &RuntimeHandle,
        texts: &[String],
        options: &TranslateOptions,
    ) -> Result<Vec<String>, NmtError> {
        if !self.translate_delay.is_zero() {
            tokio::time::sleep(self.translate_delay).await;
        }
        let src = options.src_code.clone().unwrap_or_default();
        let tgt = options.tgt_code.clone().unwrap_or_default();
        if self.failing_pairs.lock().contains(&(src, tgt.clone())) {
            return Err(NmtError::Inference(format!("no route for {tgt}")));
        }
        Ok(texts.iter().map(|text| format!("[{tgt}] {text}")).collect())
    }

    async fn release(&self, handle: RuntimeHandle) -> Result<(), NmtError> {
        self.released.lock().push(handle.0);
        Ok(())
    }

    async fn memory(&self) -> MemoryReport {
        MemoryReport {
            ram_percent: None,
            gpu_percent: *self.gpu_percent.lock(),
        }
    }

    async fn clear_device_cache(&self) -> Result<(), NmtError> {
        Ok(())
    }
}

/// Baseline configuration for tests: deterministic, no live registry.
pub fn test_config() -> Config {
    let mut config = Config::from_env();
    config.input_sanitize = true;
    config.align_responses = true;
    config.sanitize_placeholder = String::new();
    config.auto_model_fallback = true;
    config.pivot_fallback = true;
    config.pivot_lang = "en".to_string();
    config.enable_queue = true;
    config.max_queue_size = 1000;
    config.max_inflight_translations = Some(4);
    config.translate_timeout = None;
    config.request_log = false;
    config
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    pub runtime: Arc<MockRuntime>,
}

/// Assemble the full application over a mock runtime. Discovery points at
/// an unroutable registry, so opus-mt pair sets stay empty and the
/// multilingual families drive pivot planning.
pub fn build_app(config: Config, runtime: MockRuntime) -> TestApp {
    let config = Arc::new(config);
    let runtime = Arc::new(runtime);
    let runtime_dyn: Arc<dyn InferenceRuntime> = runtime.clone();

    let cache = Arc::new(PipelineCache::new(
        config.max_cached_models,
        Device::Cpu,
        Arc::clone(&runtime_dyn),
        Arc::new(StaticMemoryProbe { ram_percent: None }),
        PressureThresholds {
            ram_critical: config.memory_critical_threshold,
            gpu_critical: config.gpu_memory_critical_threshold,
        },
    ));
    let max_inflight = config.max_inflight_translations.unwrap_or(4);
    let gate = Arc::new(TranslateGate::new(&config, max_inflight));
    let discovery = Arc::new(ModelDiscovery::with_api_base(
        "http://127.0.0.1:1/api/models",
        config.discovery_ttl,
    ));
    let detector = Arc::new(LanguageDetector::new(&config));
    let translator = Arc::new(Translator::new(
        Arc::clone(&config),
        Arc::clone(&cache),
        Arc::clone(&gate),
        Arc::clone(&discovery),
        Arc::clone(&detector),
        Arc::clone(&runtime_dyn),
    ));

    let state = Arc::new(AppState {
        config,
        translator,
        gate,
        cache,
        discovery,
        detector,
        device: Device::Cpu,
    });
    let router = create_router(Arc::clone(&state));

    TestApp {
        state,
        router,
        runtime,
    }
}
