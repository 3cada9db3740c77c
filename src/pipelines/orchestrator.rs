//! End-to-end translation driver: slot acquisition, per-item language
//! detection, candidate iteration with family fallback, chunked and
//! masked batched inference, pivot fallback, and response assembly.
//!
//! The alignment contract is enforced here: with `ALIGN_RESPONSES` on,
//! the output always has one entry per input and per-item failures become
//! the sanitize placeholder; with it off, the first failing item fails
//! the whole request.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::warn;

use crate::common::config::Config;
use crate::common::error::NmtError;
use crate::lang::LanguageDetector;
use crate::models::ModelFamily;
use crate::pipelines::cache::{CacheKey, PipelineCache};
use crate::pipelines::gate::TranslateGate;
use crate::pipelines::pivot::{plan_pivot, PivotPlan};
use crate::pipelines::router::{route, Candidate};
use crate::pipelines::discovery::ModelDiscovery;
use crate::runtime::{InferenceRuntime, TranslateOptions};
use crate::text::{
    auto_chunk, chunk_sentences, is_noise, mask_symbols, remove_repeating_new_symbols,
    split_sentences, unmask_symbols, MaskOptions,
};

/// One translation request, normalized by the edge.
#[derive(Clone, Debug)]
pub struct TranslationJob {
    pub texts: Vec<String>,
    pub source_lang: Option<String>,
    pub target_lang: String,
    pub beam_size: usize,
    pub perform_sentence_splitting: bool,
    pub preferred_family: Option<ModelFamily>,
    pub include_metadata: bool,
}

/// Optional response metadata describing how the request was served.
#[derive(Clone, Debug, Serialize)]
pub struct TranslationMetadata {
    pub model_name: String,
    pub model_family: String,
    pub languages_used: Vec<String>,
    pub chunks_processed: usize,
    pub chunk_size: usize,
    pub auto_chunked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pivot_path: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TranslationOutcome {
    pub translated: Vec<String>,
    pub source_lang: String,
    pub detected_langs: Option<Vec<String>>,
    pub translation_time: f64,
    pub pivot_path: Option<String>,
    pub metadata: Option<TranslationMetadata>,
}

struct LegOutput {
    text: String,
    chunks: usize,
    auto_chunked: bool,
}

struct ItemTranslation {
    text: String,
    family: ModelFamily,
    model_id: String,
    chunks: usize,
    auto_chunked: bool,
    pivot: Option<PivotPlan>,
}

#[derive(Default)]
struct RequestStats {
    family: Option<ModelFamily>,
    model_id: Option<String>,
    languages: Vec<String>,
    chunks: usize,
    auto_chunked: bool,
    pivot_path: Option<String>,
}

impl RequestStats {
    fn record_language(&mut self, lang: &str) {
        if !self.languages.iter().any(|known| known.as_str() == lang) {
            self.languages.push(lang.to_string());
        }
    }

    fn record_item(&mut self, item: &ItemTranslation, src: &str, tgt: &str) {
        self.family = Some(item.family);
        self.model_id = Some(item.model_id.clone());
        self.chunks += item.chunks;
        self.auto_chunked |= item.auto_chunked;
        self.record_language(src);
        if let Some(plan) = &item.pivot {
            self.record_language(&plan.mid);
            if self.pivot_path.is_none() {
                self.pivot_path = Some(plan.path());
            }
        }
        self.record_language(tgt);
    }
}

pub struct Translator {
    config: Arc<Config>,
    cache: Arc<PipelineCache>,
    gate: Arc<TranslateGate>,
    discovery: Arc<ModelDiscovery>,
    detector: Arc<LanguageDetector>,
    runtime: Arc<dyn InferenceRuntime>,
}

impl Translator {
    pub fn new(
        config: Arc<Config>,
        cache: Arc<PipelineCache>,
        gate: Arc<TranslateGate>,
        discovery: Arc<ModelDiscovery>,
        detector: Arc<LanguageDetector>,
        runtime: Arc<dyn InferenceRuntime>,
    ) -> Translator {
        Translator {
            config,
            cache,
            gate,
            discovery,
            detector,
            runtime,
        }
    }

    /// Translate a job end to end. Acquires an inflight slot first (this
    /// is where overload errors surface) and records the translation
    /// duration on release.
    pub async fn translate(&self, job: TranslationJob) -> Result<TranslationOutcome, NmtError> {
        if job.texts.is_empty() {
            return Ok(TranslationOutcome {
                translated: Vec::new(),
                source_lang: job.source_lang.unwrap_or_default(),
                detected_langs: None,
                translation_time: 0.0,
                pivot_path: None,
                metadata: None,
            });
        }

        let slot = self.gate.acquire(self.config.translate_timeout).await?;
        let started = Instant::now();

        let result = match self.config.translate_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(&job))
                .await
                .map_err(|_| NmtError::TranslationTimeout)?,
            None => self.run(&job).await,
        };
        drop(slot);

        let mut outcome = result?;
        outcome.translation_time = started.elapsed().as_secs_f64();
        Ok(outcome)
    }

    async fn run(&self, job: &TranslationJob) -> Result<TranslationOutcome, NmtError> {
        let provided = job
            .source_lang
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty());

        let detected = if provided.is_none() {
            Some(self.detector.detect_batch(&job.texts))
        } else {
            None
        };

        let undetermined = self.detector.undetermined_code().to_string();
        let request_source = provided.map(str::to_string).unwrap_or_else(|| {
            detected
                .as_ref()
                .and_then(|langs| langs.iter().find(|lang| **lang != undetermined))
                .cloned()
                .unwrap_or_else(|| undetermined.clone())
        });

        let tgt = job.target_lang.as_str();
        let mut stats = RequestStats::default();
        let mut translated = Vec::with_capacity(job.texts.len());

        for (index, text) in job.texts.iter().enumerate() {
            let src = provided
                .map(str::to_string)
                .or_else(|| detected.as_ref().map(|langs| langs[index].clone()))
                .unwrap_or_else(|| undetermined.clone());

            if self.config.input_sanitize
                && is_noise(
                    text,
                    self.config.input_min_chars,
                    self.config.input_min_alnum_ratio,
                )
            {
                translated.push(self.config.sanitize_placeholder.clone());
                continue;
            }

            if src == undetermined {
                if self.config.align_responses {
                    translated.push(self.config.sanitize_placeholder.clone());
                    continue;
                }
                return Err(NmtError::UnsupportedLanguagePair {
                    src,
                    tgt: tgt.to_string(),
                });
            }

            if src == tgt {
                stats.record_language(&src);
                translated.push(text.clone());
                continue;
            }

            match self.translate_item(text, &src, tgt, job).await {
                Ok(item) => {
                    stats.record_item(&item, &src, tgt);
                    translated.push(item.text);
                }
                Err(error) if self.config.align_responses => {
                    warn!("item {index} failed, inserting placeholder: {error}");
                    translated.push(self.config.sanitize_placeholder.clone());
                }
                Err(error) => return Err(error),
            }
        }

        let metadata = if job.include_metadata {
            Some(TranslationMetadata {
                model_name: stats.model_id.clone().unwrap_or_default(),
                model_family: stats
                    .family
                    .unwrap_or(self.config.default_family)
                    .as_str()
                    .to_string(),
                languages_used: stats.languages.clone(),
                chunks_processed: stats.chunks,
                chunk_size: self.config.max_chunk_chars,
                auto_chunked: stats.auto_chunked,
                pivot_path: stats.pivot_path.clone(),
            })
        } else {
            None
        };

        Ok(TranslationOutcome {
            translated,
            source_lang: request_source,
            detected_langs: detected,
            translation_time: 0.0,
            pivot_path: stats.pivot_path,
            metadata,
        })
    }

    /// Translate one item: direct candidates first, then a pivot plan.
    async fn translate_item(
        &self,
        text: &str,
        src: &str,
        tgt: &str,
        job: &TranslationJob,
    ) -> Result<ItemTranslation, NmtError> {
        let direct_error = match self.translate_pair(text, src, tgt, job).await {
            Ok(item) => return Ok(item),
            Err(error) => error,
        };

        if !self.config.pivot_fallback {
            return Err(direct_error);
        }

        let families = self.config.family_order(job.preferred_family);
        let pair_sets = self.discovery.pair_sets(&families).await;
        let plan = match plan_pivot(src, tgt, &families, &pair_sets, &self.config.pivot_lang) {
            Some(plan) => plan,
            // No pivot route anywhere: surface the direct failure, which
            // is UnsupportedLanguagePair when no family had a candidate.
            None => return Err(direct_error),
        };

        let first = self.translate_pair(text, &plan.src, &plan.mid, job).await?;
        let second = self
            .translate_pair(&first.text, &plan.mid, &plan.tgt, job)
            .await?;

        Ok(ItemTranslation {
            text: second.text,
            family: second.family,
            model_id: second.model_id,
            chunks: first.chunks + second.chunks,
            auto_chunked: first.auto_chunked || second.auto_chunked,
            pivot: Some(plan),
        })
    }

    /// Try every candidate family for one pair; the first success wins.
    async fn translate_pair(
        &self,
        text: &str,
        src: &str,
        tgt: &str,
        job: &TranslationJob,
    ) -> Result<ItemTranslation, NmtError> {
        let candidates = route(src, tgt, job.preferred_family, &self.config);
        if candidates.is_empty() {
            return Err(NmtError::UnsupportedLanguagePair {
                src: src.to_string(),
                tgt: tgt.to_string(),
            });
        }

        let mut last_error = None;
        for candidate in &candidates {
            match self.translate_leg(text, src, tgt, candidate, job).await {
                Ok(leg) => {
                    return Ok(ItemTranslation {
                        text: leg.text,
                        family: candidate.family,
                        model_id: candidate.model_id.clone(),
                        chunks: leg.chunks,
                        auto_chunked: leg.auto_chunked,
                        pivot: None,
                    });
                }
                Err(error) => {
                    warn!(
                        "candidate {} failed for {src}->{tgt}: {error}",
                        candidate.model_id
                    );
                    last_error = Some(error);
                }
            }
        }
        Err(last_error.unwrap_or(NmtError::UnsupportedLanguagePair {
            src: src.to_string(),
            tgt: tgt.to_string(),
        }))
    }

    /// Run one chunked, masked, batched inference pass over a single
    /// candidate pipeline.
    async fn translate_leg(
        &self,
        text: &str,
        src: &str,
        tgt: &str,
        candidate: &Candidate,
        job: &TranslationJob,
    ) -> Result<LegOutput, NmtError> {
        let config = &self.config;
        let joiner = config.join_sentences_with.as_str();

        let (chunks, auto_chunked) = if job.perform_sentence_splitting {
            let sentences = split_sentences(text, config.max_sentence_chars);
            (chunk_sentences(&sentences, config.max_chunk_chars, joiner), false)
        } else {
            let chunks = auto_chunk(
                text,
                config.auto_chunk,
                config.auto_chunk_max_chars,
                config.max_sentence_chars,
                config.max_chunk_chars,
                joiner,
            );
            let auto_chunked = chunks.len() > 1;
            (chunks, auto_chunked)
        };
        let chunks = if chunks.is_empty() {
            vec![text.to_string()]
        } else {
            chunks
        };

        let key = CacheKey::new(src, tgt, candidate.family);
        let pipeline = self.cache.get_or_load(&key, &candidate.model_id).await?;

        let mask_options = MaskOptions::from_config(config);
        let mut masked_chunks = Vec::with_capacity(chunks.len());
        let mut records = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let (masked, originals) = mask_symbols(chunk, &mask_options);
            masked_chunks.push(masked);
            records.push(originals);
        }

        let beam_size = match config.max_beam_size {
            Some(limit) => job.beam_size.max(1).min(limit.max(1)),
            None => job.beam_size.max(1),
        };
        let max_length = config.max_text_len.map_or(512, |limit| limit.clamp(1, 512));
        let options = TranslateOptions {
            batch_size: config.batch_size,
            beam_size,
            max_length: Some(max_length),
            src_code: Some(candidate.src_code.clone()),
            tgt_code: Some(candidate.tgt_code.clone()),
        };

        let mut outputs = Vec::with_capacity(masked_chunks.len());
        for batch in masked_chunks.chunks(config.batch_size.max(1)) {
            let translated = self
                .runtime
                .translate(&pipeline.handle, batch, &options)
                .await?;
            outputs.extend(translated);
        }

        let unmasked: Vec<String> = outputs
            .iter()
            .zip(records.iter())
            .map(|(output, originals)| unmask_symbols(output, originals, &mask_options))
            .collect();

        let joined = unmasked.join(joiner);
        let cleaned = remove_repeating_new_symbols(text, &joined);

        Ok(LegOutput {
            text: cleaned,
            chunks: chunks.len(),
            auto_chunked,
        })
    }
}
