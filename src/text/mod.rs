//! # Text preprocessing
//!
//! Deterministic transformations applied around inference: noise
//! detection, sentence splitting, chunking, and symbol masking. These
//! never fail; pathological inputs are classified as noise and replaced
//! by the configured placeholder downstream.

pub mod masking;
pub mod processing;

pub use masking::{mask_symbols, unmask_symbols, MaskOptions};
pub use processing::{
    auto_chunk, chunk_sentences, is_noise, remove_repeating_new_symbols, split_sentences,
    strip_control_chars,
};
