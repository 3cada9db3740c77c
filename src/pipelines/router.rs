//! Family routing: map a requested pair to an ordered list of concrete
//! model candidates.

use crate::common::config::Config;
use crate::models::ModelFamily;

/// One concrete translation target. The orchestrator tries candidates in
/// order; the first successful load wins and no candidate is tried twice
/// within a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub family: ModelFamily,
    pub model_id: String,
    pub src_code: String,
    pub tgt_code: String,
}

/// Build the candidate list for `(src, tgt)`. The preferred family leads;
/// the remaining fallback order follows (deduplicated) whenever automatic
/// fallback is enabled, even when the preferred family is expected to
/// work. Families that nominally cannot serve the pair are filtered out;
/// Opus-MT support is established by the loader, not here.
pub fn route(
    src: &str,
    tgt: &str,
    preferred: Option<ModelFamily>,
    config: &Config,
) -> Vec<Candidate> {
    config
        .family_order(preferred)
        .into_iter()
        .filter(|family| family.supports_pair(src, tgt))
        .map(|family| Candidate {
            family,
            model_id: family.model_id(src, tgt),
            src_code: family.lang_code(src),
            tgt_code: family.lang_code(tgt),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::from_env();
        config.auto_model_fallback = true;
        config.default_family = ModelFamily::OpusMt;
        config.model_fallback_order = vec![
            ModelFamily::OpusMt,
            ModelFamily::Mbart50,
            ModelFamily::M2m100,
        ];
        config
    }

    #[test]
    fn preferred_family_leads_and_fallback_follows() {
        let candidates = route("en", "de", Some(ModelFamily::Mbart50), &config());
        let families: Vec<ModelFamily> = candidates.iter().map(|c| c.family).collect();
        assert_eq!(
            families,
            vec![ModelFamily::Mbart50, ModelFamily::OpusMt, ModelFamily::M2m100]
        );
    }

    #[test]
    fn unsupported_multilingual_pairs_are_filtered() {
        // "zu" is in the M2M-100 table but not in the mBART-50 table.
        let candidates = route("en", "zu", None, &config());
        let families: Vec<ModelFamily> = candidates.iter().map(|c| c.family).collect();
        assert_eq!(families, vec![ModelFamily::OpusMt, ModelFamily::M2m100]);
    }

    #[test]
    fn fallback_disabled_yields_single_candidate() {
        let mut config = config();
        config.auto_model_fallback = false;
        let candidates = route("en", "de", None, &config);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].family, ModelFamily::OpusMt);
        assert_eq!(candidates[0].model_id, "helsinki-nlp/opus-mt-en-de");
    }

    #[test]
    fn codes_follow_family_mappers() {
        let candidates = route("en", "hi", Some(ModelFamily::Mbart50), &config());
        let mbart = candidates
            .iter()
            .find(|c| c.family == ModelFamily::Mbart50)
            .unwrap();
        assert_eq!(mbart.src_code, "en_XX");
        assert_eq!(mbart.tgt_code, "hi_XX");
    }
}
