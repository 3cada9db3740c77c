//! Startup model preloading from the `PRELOAD_MODELS` variable.

use std::sync::Arc;

use tracing::{info, warn};

use crate::common::config::Config;
use crate::pipelines::cache::{CacheKey, PipelineCache};
use crate::pipelines::router::route;

/// Parse "en->de,de->en" (comma or semicolon separated) into pairs.
/// Malformed entries are skipped with a warning.
pub fn parse_preload_pairs(raw: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for part in raw.split([',', ';']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.split_once("->") {
            Some((src, tgt)) => {
                let src = src.trim();
                let tgt = tgt.trim();
                if src.is_empty() || tgt.is_empty() || src == tgt {
                    warn!("invalid preload pair: {part}");
                    continue;
                }
                pairs.push((src.to_string(), tgt.to_string()));
            }
            None => warn!("invalid preload pair format: {part}"),
        }
    }
    pairs
}

/// Warm the pipeline cache for the configured pairs. Failures are logged
/// and non-fatal; the first routable candidate per pair is loaded.
pub async fn preload_models(config: &Config, cache: &Arc<PipelineCache>) {
    for (src, tgt) in parse_preload_pairs(&config.preload_models) {
        let candidates = route(&src, &tgt, None, config);
        let Some(candidate) = candidates.first() else {
            warn!("no family supports preload pair {src}->{tgt}");
            continue;
        };
        let key = CacheKey::new(&src, &tgt, candidate.family);
        match cache.get_or_load(&key, &candidate.model_id).await {
            Ok(_) => info!("preloaded model {} for {src}->{tgt}", candidate.model_id),
            Err(error) => warn!("failed to preload {src}->{tgt}: {error}"),
        }
    }
}
