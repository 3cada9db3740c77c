//! # Serving pipelines
//!
//! The model-serving machinery: the pipeline cache, the concurrency gate,
//! family routing, pivot planning, discovery, the orchestrator composing
//! them, and the background maintainer.

pub mod cache;
pub mod discovery;
pub mod gate;
pub mod maintainer;
pub mod memory;
pub mod orchestrator;
pub mod pivot;
pub mod preload;
pub mod router;

pub use cache::{CacheKey, CacheStatus, Pipeline, PipelineCache, PressureThresholds};
pub use discovery::ModelDiscovery;
pub use gate::{QueueMetrics, TranslateGate, TranslateSlot};
pub use maintainer::spawn_maintainer;
pub use memory::{MemoryProbe, ProcMeminfoProbe, StaticMemoryProbe};
pub use orchestrator::{TranslationJob, TranslationMetadata, TranslationOutcome, Translator};
pub use pivot::{plan_pivot, PivotPlan};
pub use preload::{parse_preload_pairs, preload_models};
pub use router::{route, Candidate};
