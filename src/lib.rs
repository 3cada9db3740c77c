//! # nmt-server
//!
//! Concurrency-safe machine-translation server fronting the Opus-MT,
//! mBART-50 and M2M-100 model families behind an EasyNMT-compatible HTTP
//! API. Inference itself runs in an external runtime process; this crate
//! owns the request lifecycle: routing across families with automatic
//! fallback, pivoting through a bridging language, sentence splitting and
//! chunking, symbol masking, a pipeline LRU cache with memory-pressure
//! and idle eviction, and a bounded admission queue with adaptive
//! `Retry-After` estimation.

pub mod api;
pub mod common;
pub mod device;
pub mod lang;
pub mod models;
pub mod pipelines;
pub mod runtime;
pub mod text;

pub use common::config::Config;
pub use common::error::NmtError;
pub use device::{resolve_device, Device, DeviceSetup};
pub use lang::LanguageDetector;
pub use models::{
    M2m100Languages, M2m100Models, Mbart50Languages, Mbart50Models, ModelFamily, OpusMtLanguages,
    OpusMtModels,
};
pub use pipelines::{
    CacheKey, ModelDiscovery, Pipeline, PipelineCache, PivotPlan, PressureThresholds,
    QueueMetrics, TranslateGate, TranslationJob, TranslationMetadata, TranslationOutcome,
    Translator,
};
pub use runtime::{
    HttpRuntime, InferenceRuntime, LoadedPipeline, RuntimeHandle, TranslateOptions,
};
