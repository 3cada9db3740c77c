//! # HTTP edge
//!
//! Thin parameter validation, error-to-status mapping, and response
//! shaping over the translation pipelines, including the strict-EasyNMT
//! compatibility namespace.

pub mod compat;
pub mod discovery;
pub mod error;
pub mod language;
pub mod observability;
pub mod routes;
pub mod translation;
pub mod types;

use std::sync::Arc;

use crate::common::config::Config;
use crate::device::Device;
use crate::lang::LanguageDetector;
use crate::pipelines::{ModelDiscovery, PipelineCache, TranslateGate, Translator};

pub use error::ApiError;
pub use routes::create_router;

/// Shared handler state, wired at startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub translator: Arc<Translator>,
    pub gate: Arc<TranslateGate>,
    pub cache: Arc<PipelineCache>,
    pub discovery: Arc<ModelDiscovery>,
    pub detector: Arc<LanguageDetector>,
    pub device: Device,
}
