//! Discovery of available language pairs per model family.
//!
//! Opus-MT pairs are enumerated from the Hugging Face model registry and
//! cached with a TTL; the multilingual families derive their pairs from
//! fixed language tables. Failed registry fetches serve the stale cached
//! value so pivot planning degrades instead of breaking.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{info, warn};

use crate::common::error::NmtError;
use crate::models::{ModelFamily, OpusMtModels};
use crate::pipelines::pivot::PairSet;

const HF_API_BASE: &str = "https://huggingface.co/api/models";

#[derive(Deserialize)]
struct HfModel {
    #[serde(rename = "modelId", default)]
    model_id: String,
}

struct CachedPairs {
    pairs: Vec<(String, String)>,
    fetched_at: Instant,
}

pub struct ModelDiscovery {
    http: reqwest::Client,
    api_base: String,
    ttl: Duration,
    cache: RwLock<HashMap<ModelFamily, CachedPairs>>,
}

impl ModelDiscovery {
    pub fn new(ttl: Duration) -> ModelDiscovery {
        ModelDiscovery::with_api_base(HF_API_BASE, ttl)
    }

    pub fn with_api_base(api_base: impl Into<String>, ttl: Duration) -> ModelDiscovery {
        ModelDiscovery {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            ttl,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Available pairs for one family. Within the TTL two calls return
    /// identical sets.
    pub async fn pairs(
        &self,
        family: ModelFamily,
        force_refresh: bool,
    ) -> Vec<(String, String)> {
        match family {
            ModelFamily::OpusMt => self.opus_mt_pairs(force_refresh).await,
            ModelFamily::Mbart50 | ModelFamily::M2m100 => {
                if let Some(cached) = self.cached(family, false) {
                    return cached;
                }
                let pairs = cartesian_pairs(family.known_languages());
                self.store(family, pairs.clone());
                pairs
            }
        }
    }

    pub async fn all_pairs(
        &self,
        force_refresh: bool,
    ) -> HashMap<ModelFamily, Vec<(String, String)>> {
        let mut all = HashMap::new();
        for family in [ModelFamily::OpusMt, ModelFamily::Mbart50, ModelFamily::M2m100] {
            all.insert(family, self.pairs(family, force_refresh).await);
        }
        all
    }

    /// Pair sets in the shape the pivot planner consumes.
    pub async fn pair_sets(&self, families: &[ModelFamily]) -> HashMap<ModelFamily, PairSet> {
        let mut sets = HashMap::new();
        for &family in families {
            let pairs: PairSet = self.pairs(family, false).await.into_iter().collect();
            sets.insert(family, pairs);
        }
        sets
    }

    pub fn clear_cache(&self) {
        self.cache.write().clear();
        info!("model discovery cache cleared");
    }

    async fn opus_mt_pairs(&self, force_refresh: bool) -> Vec<(String, String)> {
        if !force_refresh {
            if let Some(cached) = self.cached(ModelFamily::OpusMt, false) {
                return cached;
            }
        }

        match self.fetch_opus_mt_pairs().await {
            Ok(pairs) => {
                info!("discovered {} opus-mt language pairs", pairs.len());
                self.store(ModelFamily::OpusMt, pairs.clone());
                pairs
            }
            Err(error) => {
                warn!("opus-mt discovery failed: {error}");
                // Serve the stale value if we have one
                self.cached(ModelFamily::OpusMt, true).unwrap_or_default()
            }
        }
    }

    async fn fetch_opus_mt_pairs(&self) -> Result<Vec<(String, String)>, NmtError> {
        let response = self
            .http
            .get(&self.api_base)
            .query(&[
                ("author", "Helsinki-NLP"),
                ("search", "opus-mt"),
                ("limit", "1000"),
                ("full", "false"),
            ])
            .send()
            .await
            .map_err(|e| NmtError::Discovery(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NmtError::Discovery(format!(
                "registry returned HTTP {}",
                response.status()
            )));
        }
        let models: Vec<HfModel> = response
            .json()
            .await
            .map_err(|e| NmtError::Discovery(e.to_string()))?;

        let mut pairs: HashSet<(String, String)> = HashSet::new();
        for model in models {
            if let Some(pair) = OpusMtModels::parse_model_id(&model.model_id) {
                pairs.insert(pair);
            }
        }

        let mut sorted: Vec<(String, String)> = pairs.into_iter().collect();
        sorted.sort();
        Ok(sorted)
    }

    fn cached(&self, family: ModelFamily, allow_stale: bool) -> Option<Vec<(String, String)>> {
        let cache = self.cache.read();
        let entry = cache.get(&family)?;
        if allow_stale || entry.fetched_at.elapsed() < self.ttl {
            Some(entry.pairs.clone())
        } else {
            None
        }
    }

    fn store(&self, family: ModelFamily, pairs: Vec<(String, String)>) {
        self.cache.write().insert(
            family,
            CachedPairs {
                pairs,
                fetched_at: Instant::now(),
            },
        );
    }
}

fn cartesian_pairs(languages: &[&str]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(languages.len() * languages.len().saturating_sub(1));
    for &src in languages {
        for &tgt in languages {
            if src != tgt {
                pairs.push((src.to_string(), tgt.to_string()));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{M2m100Languages, Mbart50Languages};

    #[tokio::test]
    async fn multilingual_families_are_cartesian_minus_identity() {
        let discovery = ModelDiscovery::new(Duration::from_secs(3600));
        let mbart = discovery.pairs(ModelFamily::Mbart50, false).await;
        assert_eq!(mbart.len(), 50 * 49);
        assert!(!mbart.iter().any(|(s, t)| s == t));

        let m2m = discovery.pairs(ModelFamily::M2m100, false).await;
        assert_eq!(m2m.len(), 100 * 99);
        assert_eq!(Mbart50Languages::MANY_TO_MANY.len(), 50);
        assert_eq!(M2m100Languages::M2M100_418M.len(), 100);
    }

    #[tokio::test]
    async fn discovery_is_idempotent_within_ttl() {
        let discovery = ModelDiscovery::new(Duration::from_secs(3600));
        let first = discovery.pairs(ModelFamily::M2m100, false).await;
        let second = discovery.pairs(ModelFamily::M2m100, false).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_opus_fetch_serves_empty_without_cache() {
        // Unroutable registry endpoint
        let discovery =
            ModelDiscovery::with_api_base("http://127.0.0.1:1/api/models", Duration::from_secs(60));
        let pairs = discovery.pairs(ModelFamily::OpusMt, false).await;
        assert!(pairs.is_empty());
    }
}
