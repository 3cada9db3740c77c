//! Request and response types for the HTTP surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::ModelFamily;
use crate::pipelines::TranslationMetadata;

/// `text` accepts a single string or a list of strings.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    Single(String),
    Many(Vec<String>),
}

impl TextInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            TextInput::Single(text) => vec![text],
            TextInput::Many(texts) => texts,
        }
    }
}

fn default_beam_size() -> usize {
    5
}

#[derive(Clone, Debug, Deserialize)]
pub struct TranslatePostBody {
    pub text: TextInput,
    pub target_lang: String,
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default = "default_beam_size")]
    pub beam_size: usize,
    #[serde(default)]
    pub perform_sentence_splitting: Option<bool>,
    #[serde(default)]
    pub model_family: Option<ModelFamily>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TranslateGetParams {
    pub target_lang: String,
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default)]
    pub beam_size: Option<usize>,
    #[serde(default)]
    pub perform_sentence_splitting: Option<bool>,
    #[serde(default)]
    pub model_family: Option<ModelFamily>,
}

#[derive(Debug, Serialize)]
pub struct TranslateGetResponse {
    pub translations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranslatePostResponse {
    pub target_lang: String,
    pub source_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_langs: Option<Vec<String>>,
    pub translated: Vec<String>,
    pub translation_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TranslationMetadata>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum DetectionInput {
    Single(String),
    Many(Vec<String>),
    Map(HashMap<String, String>),
}

#[derive(Clone, Debug, Deserialize)]
pub struct LanguageDetectionPostBody {
    pub text: DetectionInput,
}

#[derive(Debug, Serialize)]
pub struct LanguageDetectionResponse {
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct LanguagePairsResponse {
    pub language_pairs: Vec<[String; 2]>,
}

#[derive(Debug, Serialize)]
pub struct LanguagesResponse {
    pub languages: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkerPools {
    pub backend: usize,
    pub frontend: usize,
}

#[derive(Debug, Serialize)]
pub struct LoggingInfo {
    pub log_level: String,
    pub log_format: String,
    pub request_log: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_name: String,
    pub device: String,
    pub easynmt_model: String,
    pub batch_size: usize,
    pub max_text_len: Option<usize>,
    pub max_beam_size: Option<usize>,
    pub workers: WorkerPools,
    pub input_sanitize: bool,
    pub input_sanitize_min_alnum_ratio: f64,
    pub input_sanitize_min_chars: usize,
    pub undetermined_lang_code: String,
    pub align_responses: bool,
    pub sanitize_placeholder: String,
    pub sentence_splitting_default: bool,
    pub max_sentence_chars: usize,
    pub max_chunk_chars: usize,
    pub join_sentences_with: String,
    pub pivot_fallback: bool,
    pub pivot_lang: String,
    pub model_fallback_order: Vec<String>,
    pub auto_model_fallback: bool,
    pub logging: LoggingInfo,
}

#[derive(Debug, Serialize)]
pub struct CacheStatusResponse {
    pub capacity: usize,
    pub size: usize,
    pub keys: Vec<String>,
    pub device: String,
    pub inflight: usize,
    pub queue_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub device: String,
    pub queue_enabled: bool,
    pub max_inflight: usize,
}

#[derive(Debug, Serialize)]
pub struct FamilyPairs {
    pub language_pairs: Vec<[String; 2]>,
    pub pair_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub model_family: String,
    pub language_pairs: Vec<[String; 2]>,
    pub pair_count: usize,
}

#[derive(Debug, Serialize)]
pub struct AllDiscoveryResponse {
    pub models: HashMap<String, FamilyPairs>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DiscoveryParams {
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GetLanguagesParams {
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LanguageDetectionGetParams {
    pub text: String,
}
