/// # Opus-MT pretrained model registry
///
/// One model per language pair, shared under CC-BY 4.0 by the Opus-MT team
/// from Language Technology at the University of Helsinki at
/// <https://github.com/Helsinki-NLP/Opus-MT>.
pub struct OpusMtModels;

/// # Opus-MT language tables
pub struct OpusMtLanguages;

impl OpusMtModels {
    pub const MODEL_PREFIX: &'static str = "helsinki-nlp/opus-mt";

    /// Model identifier for a direct pair, e.g. `helsinki-nlp/opus-mt-en-de`.
    pub fn model_id(src: &str, tgt: &str) -> String {
        format!("{}-{}-{}", Self::MODEL_PREFIX, src, tgt)
    }

    /// Inverse of [`OpusMtModels::model_id`]: extract the `(src, tgt)` pair
    /// from a registry model identifier. Group checkpoints (uppercase
    /// halves such as `ROMANCE`) are rejected.
    pub fn parse_model_id(model_id: &str) -> Option<(String, String)> {
        let pair = model_id
            .strip_prefix("Helsinki-NLP/opus-mt-")
            .or_else(|| model_id.strip_prefix("helsinki-nlp/opus-mt-"))?;
        let mut parts = pair.split('-');
        let src = parts.next()?;
        let tgt = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        if src.chars().any(|c| c.is_ascii_uppercase())
            || tgt.chars().any(|c| c.is_ascii_uppercase())
        {
            return None;
        }
        Some((src.to_string(), tgt.to_string()))
    }
}

impl OpusMtLanguages {
    /// Codes for which direct Opus-MT checkpoints are commonly published.
    /// Not authoritative: pair support is established by the loader, and
    /// the discovery service enumerates the full registry.
    pub const COMMON: [&'static str; 13] = [
        "en", "es", "fr", "de", "it", "zh", "nl", "hi", "ar", "uk", "fi", "sv", "el",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_model_id_roundtrip() {
        let id = OpusMtModels::model_id("en", "de");
        assert_eq!(
            OpusMtModels::parse_model_id(&id),
            Some(("en".to_string(), "de".to_string()))
        );
    }

    #[test]
    fn parse_model_id_rejects_group_checkpoints() {
        assert_eq!(
            OpusMtModels::parse_model_id("Helsinki-NLP/opus-mt-en-ROMANCE"),
            None
        );
        assert_eq!(
            OpusMtModels::parse_model_id("Helsinki-NLP/opus-mt-gmw-gmw"),
            Some(("gmw".to_string(), "gmw".to_string()))
        );
        assert_eq!(OpusMtModels::parse_model_id("facebook/m2m100_418M"), None);
    }

    #[test]
    fn parse_model_id_rejects_three_part_codes() {
        assert_eq!(
            OpusMtModels::parse_model_id("Helsinki-NLP/opus-mt-en-de-big"),
            None
        );
    }
}
