//! Health, readiness, and runtime snapshot endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::types::{
    CacheStatusResponse, HealthResponse, LoggingInfo, ModelInfoResponse, ReadinessResponse,
    WorkerPools,
};
use crate::api::AppState;

pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn readyz(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready".to_string(),
        device: state.device.to_string(),
        queue_enabled: state.gate.queue_enabled(),
        max_inflight: state.gate.max_inflight(),
    })
}

pub async fn cache_status(State(state): State<Arc<AppState>>) -> Json<CacheStatusResponse> {
    let status = state.cache.status();
    let metrics = state.gate.metrics();
    Json(CacheStatusResponse {
        capacity: status.capacity,
        size: status.size,
        keys: status.keys,
        device: state.device.to_string(),
        inflight: metrics.inflight,
        queue_enabled: state.gate.queue_enabled(),
    })
}

pub async fn model_name(State(state): State<Arc<AppState>>) -> Json<ModelInfoResponse> {
    let config = &state.config;
    Json(ModelInfoResponse {
        model_name: format!("{} (dynamic)", config.default_family),
        device: state.device.to_string(),
        easynmt_model: config.default_family.as_str().to_string(),
        batch_size: config.batch_size,
        max_text_len: config.max_text_len,
        max_beam_size: config.max_beam_size,
        workers: WorkerPools {
            backend: config.max_workers_backend,
            frontend: config.max_workers_frontend,
        },
        input_sanitize: config.input_sanitize,
        input_sanitize_min_alnum_ratio: config.input_min_alnum_ratio,
        input_sanitize_min_chars: config.input_min_chars,
        undetermined_lang_code: config.undetermined_lang_code.clone(),
        align_responses: config.align_responses,
        sanitize_placeholder: config.sanitize_placeholder.clone(),
        sentence_splitting_default: config.sentence_splitting_default,
        max_sentence_chars: config.max_sentence_chars,
        max_chunk_chars: config.max_chunk_chars,
        join_sentences_with: config.join_sentences_with.clone(),
        pivot_fallback: config.pivot_fallback,
        pivot_lang: config.pivot_lang.clone(),
        model_fallback_order: config
            .model_fallback_order
            .iter()
            .map(|family| family.as_str().to_string())
            .collect(),
        auto_model_fallback: config.auto_model_fallback,
        logging: LoggingInfo {
            log_level: config.log_level.clone(),
            log_format: config.log_format.clone(),
            request_log: config.request_log,
        },
    })
}
