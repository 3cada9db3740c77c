use std::env;
use std::time::Duration;

use crate::models::ModelFamily;

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_opt_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}

/// # Server configuration
/// Typed snapshot of the environment, parsed once at startup and injected
/// into every component. Defaults match the EasyNMT-compatible surface.
#[derive(Debug, Clone)]
pub struct Config {
    // Logging
    pub log_level: String,
    pub log_format: String,
    pub request_log: bool,

    // Device selection
    pub device_env: String,
    pub use_gpu: String,

    // Inference runtime collaborator
    pub runtime_url: String,

    // Model families
    pub default_family: ModelFamily,
    pub model_fallback_order: Vec<ModelFamily>,
    pub auto_model_fallback: bool,

    // Generation limits
    pub batch_size: usize,
    pub max_text_len: Option<usize>,
    pub max_beam_size: Option<usize>,

    // Pipeline cache
    pub max_cached_models: usize,
    pub model_idle_timeout: Duration,
    pub idle_check_interval: Duration,

    // Memory pressure
    pub enable_memory_monitor: bool,
    pub memory_critical_threshold: f64,
    pub gpu_memory_critical_threshold: f64,
    pub cuda_cache_clear_interval: Duration,

    // Queueing and backpressure
    pub enable_queue: bool,
    pub max_inflight_translations: Option<usize>,
    pub max_queue_size: usize,
    pub translate_timeout: Option<Duration>,

    // Retry-After estimation
    pub retry_after_alpha: f64,
    pub retry_after_min_sec: f64,
    pub retry_after_max_sec: f64,

    // Worker pools
    pub max_workers_backend: usize,
    pub max_workers_frontend: usize,

    // Input sanitization
    pub input_sanitize: bool,
    pub input_min_chars: usize,
    pub input_min_alnum_ratio: f64,
    pub undetermined_lang_code: String,

    // Response alignment and splitting
    pub align_responses: bool,
    pub sanitize_placeholder: String,
    pub sentence_splitting_default: bool,
    pub max_sentence_chars: usize,
    pub max_chunk_chars: usize,
    pub join_sentences_with: String,
    pub auto_chunk: bool,
    pub auto_chunk_max_chars: usize,

    // Symbol masking
    pub symbol_masking: bool,
    pub mask_digits: bool,
    pub mask_punct: bool,
    pub mask_emoji: bool,

    // Pivot fallback
    pub pivot_fallback: bool,
    pub pivot_lang: String,

    // Discovery
    pub discovery_ttl: Duration,

    // Startup
    pub preload_models: String,
    pub bind_addr: String,
    pub graceful_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Config {
        let fallback_order = parse_fallback_order(&env_string(
            "MODEL_FALLBACK_ORDER",
            "opus-mt,mbart50,m2m100",
        ));
        let default_family = env_string("EASYNMT_MODEL", "opus-mt")
            .parse()
            .unwrap_or(ModelFamily::OpusMt);

        let translate_timeout_sec = env_u64("TRANSLATE_TIMEOUT_SEC", 0);

        Config {
            log_level: env_string("LOG_LEVEL", "info"),
            log_format: env_string("LOG_FORMAT", "plain").to_lowercase(),
            request_log: env_flag("REQUEST_LOG", false),

            device_env: env_string("DEVICE", "auto"),
            use_gpu: env_string("USE_GPU", "auto").to_lowercase(),

            runtime_url: env_string("RUNTIME_URL", "http://127.0.0.1:8500"),

            default_family,
            model_fallback_order: fallback_order,
            auto_model_fallback: env_flag("AUTO_MODEL_FALLBACK", true),

            batch_size: env_usize("EASYNMT_BATCH_SIZE", 16).max(1),
            max_text_len: env_opt_usize("EASYNMT_MAX_TEXT_LEN"),
            max_beam_size: env_opt_usize("EASYNMT_MAX_BEAM_SIZE"),

            max_cached_models: env_usize("MAX_CACHED_MODELS", 6).max(1),
            model_idle_timeout: Duration::from_secs(env_u64("MODEL_IDLE_TIMEOUT", 0)),
            idle_check_interval: Duration::from_secs(env_u64("IDLE_CHECK_INTERVAL", 60).max(1)),

            enable_memory_monitor: env_flag("ENABLE_MEMORY_MONITOR", true),
            memory_critical_threshold: env_f64("MEMORY_CRITICAL_THRESHOLD", 90.0),
            gpu_memory_critical_threshold: env_f64("GPU_MEMORY_CRITICAL_THRESHOLD", 90.0),
            cuda_cache_clear_interval: Duration::from_secs(env_u64(
                "CUDA_CACHE_CLEAR_INTERVAL_SEC",
                0,
            )),

            enable_queue: env_flag("ENABLE_QUEUE", true),
            max_inflight_translations: env_opt_usize("MAX_INFLIGHT_TRANSLATIONS"),
            max_queue_size: env_usize("MAX_QUEUE_SIZE", 1000),
            translate_timeout: if translate_timeout_sec > 0 {
                Some(Duration::from_secs(translate_timeout_sec))
            } else {
                None
            },

            retry_after_alpha: env_f64("RETRY_AFTER_ALPHA", 0.2),
            retry_after_min_sec: env_f64("RETRY_AFTER_MIN_SEC", 1.0),
            retry_after_max_sec: env_f64("RETRY_AFTER_MAX_SEC", 120.0),

            max_workers_backend: env_usize("MAX_WORKERS_BACKEND", 1).max(1),
            max_workers_frontend: env_usize("MAX_WORKERS_FRONTEND", 2).max(1),

            input_sanitize: env_flag("INPUT_SANITIZE", true),
            input_min_chars: env_usize("INPUT_MIN_CHARS", 1),
            input_min_alnum_ratio: env_f64("INPUT_MIN_ALNUM_RATIO", 0.2),
            undetermined_lang_code: env_string("UNDETERMINED_LANG_CODE", "und"),

            align_responses: env_flag("ALIGN_RESPONSES", true),
            sanitize_placeholder: env_string("SANITIZE_PLACEHOLDER", ""),
            sentence_splitting_default: env_flag("PERFORM_SENTENCE_SPLITTING_DEFAULT", true),
            max_sentence_chars: env_usize("MAX_SENTENCE_CHARS", 500).max(1),
            max_chunk_chars: env_usize("MAX_CHUNK_CHARS", 900).max(1),
            join_sentences_with: env_string("JOIN_SENTENCES_WITH", " "),
            auto_chunk: env_flag("AUTO_CHUNK", true),
            auto_chunk_max_chars: env_usize("AUTO_CHUNK_MAX_CHARS", 2000).max(1),

            symbol_masking: env_flag("SYMBOL_MASKING", true),
            mask_digits: env_flag("MASK_DIGITS", true),
            mask_punct: env_flag("MASK_PUNCT", true),
            mask_emoji: env_flag("MASK_EMOJI", true),

            pivot_fallback: env_flag("PIVOT_FALLBACK", true),
            pivot_lang: env_string("PIVOT_LANG", "en"),

            discovery_ttl: Duration::from_secs(env_u64("DISCOVERY_TTL_SEC", 3600)),

            preload_models: env_string("PRELOAD_MODELS", "").trim().to_string(),
            bind_addr: env_string("BIND_ADDR", "0.0.0.0:8000"),
            graceful_timeout: Duration::from_secs(env_u64("GRACEFUL_TIMEOUT_SEC", 10)),
        }
    }

    /// Fallback order with the preferred family moved to the front and
    /// duplicates removed. Returns a single-element list when automatic
    /// fallback is disabled.
    pub fn family_order(&self, preferred: Option<ModelFamily>) -> Vec<ModelFamily> {
        let first = preferred.unwrap_or(self.default_family);
        let mut order = vec![first];
        if self.auto_model_fallback {
            for family in &self.model_fallback_order {
                if !order.contains(family) {
                    order.push(*family);
                }
            }
        }
        order
    }
}

fn parse_fallback_order(raw: &str) -> Vec<ModelFamily> {
    let mut order = Vec::new();
    for part in raw.split(',') {
        if let Ok(family) = part.trim().parse::<ModelFamily>() {
            if !order.contains(&family) {
                order.push(family);
            }
        }
    }
    if order.is_empty() {
        order = vec![ModelFamily::OpusMt, ModelFamily::Mbart50, ModelFamily::M2m100];
    }
    order
}
