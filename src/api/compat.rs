//! Strict-EasyNMT compatibility namespace. Mirrors EasyNMT's response
//! shapes exactly, without the enhanced fields.

use std::sync::Arc;

use axum::extract::{Query, RawQuery, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::translation::{normalize_lang, request_id, texts_from_query, validate_target};
use crate::api::types::{TranslateGetParams, TranslatePostBody};
use crate::api::AppState;
use crate::pipelines::TranslationJob;

pub async fn translate_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TranslateGetParams>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, ApiError> {
    let target_lang = normalize_lang(&params.target_lang);
    validate_target(&target_lang)?;

    let texts = texts_from_query(&raw);
    if texts.is_empty() {
        return Ok(Json(json!({ "translations": [] })));
    }

    let job = TranslationJob {
        texts,
        source_lang: params
            .source_lang
            .as_deref()
            .map(normalize_lang)
            .filter(|lang| !lang.is_empty()),
        target_lang,
        beam_size: params.beam_size.unwrap_or(5),
        perform_sentence_splitting: params
            .perform_sentence_splitting
            .unwrap_or(state.config.sentence_splitting_default),
        preferred_family: None,
        include_metadata: false,
    };

    let outcome = state
        .translator
        .translate(job)
        .await
        .map_err(|error| ApiError::from_gate(error, &state.gate))?;

    Ok(Json(json!({ "translations": outcome.translated })))
}

pub async fn translate_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TranslatePostBody>,
) -> Result<Json<Value>, ApiError> {
    let req_id = request_id(&headers);
    let target_lang = normalize_lang(&body.target_lang);
    validate_target(&target_lang)?;

    let source_lang = body
        .source_lang
        .as_deref()
        .map(normalize_lang)
        .filter(|lang| !lang.is_empty());
    let was_auto_detected = source_lang.is_none();
    let texts = body.text.into_vec();

    if texts.is_empty() {
        return Ok(Json(json!({
            "target_lang": target_lang,
            "source_lang": source_lang.unwrap_or_default(),
            "translated": [],
            "translation_time": 0.0,
        })));
    }

    let job = TranslationJob {
        texts,
        source_lang,
        target_lang: target_lang.clone(),
        beam_size: body.beam_size,
        perform_sentence_splitting: body
            .perform_sentence_splitting
            .unwrap_or(state.config.sentence_splitting_default),
        preferred_family: None,
        include_metadata: false,
    };

    let outcome = state
        .translator
        .translate(job)
        .await
        .map_err(|error| ApiError::from_gate(error, &state.gate))?;

    if state.config.request_log {
        info!(
            "{req_id} compat.translate_post done items={} dt={:.3}s",
            outcome.translated.len(),
            outcome.translation_time
        );
    }

    let mut response = json!({
        "target_lang": target_lang,
        "source_lang": outcome.source_lang,
        "translated": outcome.translated,
        "translation_time": outcome.translation_time,
    });
    if was_auto_detected {
        response["detected_langs"] = json!([outcome.source_lang]);
    }
    Ok(Json(response))
}
