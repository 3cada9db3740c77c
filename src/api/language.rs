//! Language detection and metadata endpoints.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::api::types::{
    DetectionInput, GetLanguagesParams, LanguageDetectionGetParams, LanguageDetectionPostBody,
    LanguageDetectionResponse, LanguagePairsResponse, LanguagesResponse,
};
use crate::api::AppState;
use crate::models::ModelFamily;

fn supported_languages() -> Vec<String> {
    let mut languages: BTreeSet<&str> = BTreeSet::new();
    for family in [ModelFamily::OpusMt, ModelFamily::Mbart50, ModelFamily::M2m100] {
        languages.extend(family.known_languages().iter().copied());
    }
    languages.into_iter().map(str::to_string).collect()
}

pub async fn lang_pairs(State(_state): State<Arc<AppState>>) -> Json<LanguagePairsResponse> {
    let languages = supported_languages();
    let mut pairs = Vec::new();
    for src in &languages {
        for tgt in &languages {
            if src != tgt {
                pairs.push([src.clone(), tgt.clone()]);
            }
        }
    }
    Json(LanguagePairsResponse {
        language_pairs: pairs,
    })
}

pub async fn get_languages(
    State(_state): State<Arc<AppState>>,
    Query(params): Query<GetLanguagesParams>,
) -> Json<LanguagesResponse> {
    let languages = supported_languages();
    let filtered = if let Some(source) = params
        .source_lang
        .as_deref()
        .filter(|lang| languages.iter().any(|known| known.as_str() == *lang))
    {
        languages
            .iter()
            .filter(|lang| lang.as_str() != source)
            .cloned()
            .collect()
    } else if let Some(target) = params
        .target_lang
        .as_deref()
        .filter(|lang| languages.iter().any(|known| known.as_str() == *lang))
    {
        languages
            .iter()
            .filter(|lang| lang.as_str() != target)
            .cloned()
            .collect()
    } else {
        languages
    };

    Json(LanguagesResponse {
        languages: filtered,
    })
}

pub async fn detect_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LanguageDetectionGetParams>,
) -> Json<LanguageDetectionResponse> {
    Json(LanguageDetectionResponse {
        language: state.detector.detect(&params.text),
    })
}

/// POST detection mirrors the payload shape: a string yields
/// `{"language"}`, a list `{"languages"}`, a map the same map of codes.
pub async fn detect_post(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LanguageDetectionPostBody>,
) -> Json<Value> {
    let response = match body.text {
        DetectionInput::Single(text) => json!({ "language": state.detector.detect(&text) }),
        DetectionInput::Many(texts) => json!({ "languages": state.detector.detect_batch(&texts) }),
        DetectionInput::Map(texts) => json!(state.detector.detect_map(&texts)),
    };
    Json(response)
}
