//! Enhanced translation endpoints.

use std::sync::Arc;

use axum::extract::{Query, RawQuery, State};
use axum::http::HeaderMap;
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{
    TranslateGetParams, TranslateGetResponse, TranslatePostBody, TranslatePostResponse,
};
use crate::api::AppState;
use crate::common::error::NmtError;
use crate::pipelines::TranslationJob;

pub(crate) fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Repeated `text=` values from the raw query string.
pub(crate) fn texts_from_query(raw: &Option<String>) -> Vec<String> {
    let raw = match raw {
        Some(value) => value.as_str(),
        None => return Vec::new(),
    };
    url::form_urlencoded::parse(raw.as_bytes())
        .filter(|(key, _)| key == "text")
        .map(|(_, value)| value.into_owned())
        .collect()
}

pub(crate) fn normalize_lang(lang: &str) -> String {
    lang.trim().to_lowercase()
}

pub(crate) fn validate_target(target: &str) -> Result<(), NmtError> {
    if target.is_empty() || !target.chars().all(|c| c.is_ascii_lowercase()) {
        return Err(NmtError::ValueError(format!(
            "Invalid target language code: {target:?}"
        )));
    }
    Ok(())
}

pub async fn translate_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TranslatePostBody>,
) -> Result<Json<TranslatePostResponse>, ApiError> {
    let req_id = request_id(&headers);
    let target_lang = normalize_lang(&body.target_lang);
    validate_target(&target_lang)?;

    let source_lang = body
        .source_lang
        .as_deref()
        .map(normalize_lang)
        .filter(|lang| !lang.is_empty());
    let texts = body.text.into_vec();
    let was_auto_detected = source_lang.is_none();

    if state.config.request_log {
        info!(
            "{req_id} translate_post received target={target_lang} src={:?} items={}",
            source_lang,
            texts.len()
        );
    }

    if texts.is_empty() {
        return Ok(Json(TranslatePostResponse {
            target_lang,
            source_lang: source_lang.unwrap_or_default(),
            detected_langs: None,
            translated: Vec::new(),
            translation_time: 0.0,
            pivot_path: None,
            metadata: None,
        }));
    }

    let job = TranslationJob {
        texts,
        source_lang,
        target_lang: target_lang.clone(),
        beam_size: body.beam_size,
        perform_sentence_splitting: body
            .perform_sentence_splitting
            .unwrap_or(state.config.sentence_splitting_default),
        preferred_family: body.model_family,
        include_metadata: true,
    };

    let outcome = state
        .translator
        .translate(job)
        .await
        .map_err(|error| ApiError::from_gate(error, &state.gate))?;

    if state.config.request_log {
        info!(
            "{req_id} translate_post done items={} dt={:.3}s",
            outcome.translated.len(),
            outcome.translation_time
        );
    }

    Ok(Json(TranslatePostResponse {
        target_lang,
        source_lang: outcome.source_lang,
        detected_langs: if was_auto_detected {
            outcome.detected_langs
        } else {
            None
        },
        translated: outcome.translated,
        translation_time: outcome.translation_time,
        pivot_path: outcome.pivot_path,
        metadata: outcome.metadata,
    }))
}

pub async fn translate_get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<TranslateGetParams>,
    RawQuery(raw): RawQuery,
) -> Result<Json<TranslateGetResponse>, ApiError> {
    let req_id = request_id(&headers);
    let target_lang = normalize_lang(&params.target_lang);
    validate_target(&target_lang)?;

    let texts = texts_from_query(&raw);
    let source_lang = params
        .source_lang
        .as_deref()
        .map(normalize_lang)
        .filter(|lang| !lang.is_empty());

    if state.config.request_log {
        info!(
            "{req_id} translate_get received target={target_lang} src={:?} items={}",
            source_lang,
            texts.len()
        );
    }

    if texts.is_empty() {
        return Ok(Json(TranslateGetResponse {
            translations: Vec::new(),
            pivot_path: None,
        }));
    }

    let job = TranslationJob {
        texts,
        source_lang,
        target_lang,
        beam_size: params.beam_size.unwrap_or(5),
        perform_sentence_splitting: params
            .perform_sentence_splitting
            .unwrap_or(state.config.sentence_splitting_default),
        preferred_family: params.model_family,
        include_metadata: false,
    };

    let outcome = state
        .translator
        .translate(job)
        .await
        .map_err(|error| ApiError::from_gate(error, &state.gate))?;

    if state.config.request_log {
        info!(
            "{req_id} translate_get done items={}",
            outcome.translated.len()
        );
    }

    Ok(Json(TranslateGetResponse {
        translations: outcome.translated,
        pivot_path: outcome.pivot_path,
    }))
}
