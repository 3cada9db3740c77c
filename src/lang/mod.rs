//! Language detection backed by whatlang, with noise short-circuiting.

use std::collections::HashMap;

use tracing::debug;

use crate::common::config::Config;
use crate::text::is_noise;

/// Detects the dominant language of input texts. Noise inputs map to the
/// configured undetermined code; unreliable detection falls back to "en".
pub struct LanguageDetector {
    input_sanitize: bool,
    input_min_chars: usize,
    input_min_alnum_ratio: f64,
    undetermined: String,
}

impl LanguageDetector {
    pub fn new(config: &Config) -> LanguageDetector {
        LanguageDetector {
            input_sanitize: config.input_sanitize,
            input_min_chars: config.input_min_chars,
            input_min_alnum_ratio: config.input_min_alnum_ratio,
            undetermined: config.undetermined_lang_code.clone(),
        }
    }

    pub fn detect(&self, text: &str) -> String {
        if self.input_sanitize
            && is_noise(text, self.input_min_chars, self.input_min_alnum_ratio)
        {
            return self.undetermined.clone();
        }

        match whatlang::detect(text) {
            Some(info) if info.is_reliable() => {
                let code = iso_639_1(info.lang());
                debug!(lang = code, chars = text.chars().count(), "language detected");
                code.to_string()
            }
            _ => "en".to_string(),
        }
    }

    pub fn detect_batch(&self, texts: &[String]) -> Vec<String> {
        texts.iter().map(|text| self.detect(text)).collect()
    }

    pub fn detect_map(&self, texts: &HashMap<String, String>) -> HashMap<String, String> {
        texts
            .iter()
            .map(|(key, value)| (key.clone(), self.detect(value)))
            .collect()
    }

    pub fn undetermined_code(&self) -> &str {
        &self.undetermined
    }
}

fn iso_639_1(lang: whatlang::Lang) -> &'static str {
    use whatlang::Lang::*;
    match lang {
        Eng => "en",
        Cmn => "zh",
        Jpn => "ja",
        Kor => "ko",
        Fra => "fr",
        Deu => "de",
        Spa => "es",
        Rus => "ru",
        Por => "pt",
        Ita => "it",
        Ara => "ar",
        Hin => "hi",
        Ben => "bn",
        Tam => "ta",
        Tur => "tr",
        Vie => "vi",
        Tha => "th",
        Nld => "nl",
        Pol => "pl",
        Ukr => "uk",
        Ell => "el",
        Fin => "fi",
        Swe => "sv",
        Dan => "da",
        Ces => "cs",
        Ron => "ro",
        Hun => "hu",
        Heb => "he",
        Ind => "id",
        Urd => "ur",
        Pes => "fa",
        _ => "en",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> LanguageDetector {
        LanguageDetector {
            input_sanitize: true,
            input_min_chars: 1,
            input_min_alnum_ratio: 0.2,
            undetermined: "und".to_string(),
        }
    }

    #[test]
    fn noise_maps_to_undetermined() {
        assert_eq!(detector().detect("!!!"), "und");
        assert_eq!(detector().detect(""), "und");
    }

    #[test]
    fn detects_common_languages() {
        let det = detector();
        assert_eq!(
            det.detect("The quick brown fox jumps over the lazy dog and keeps running"),
            "en"
        );
        assert_eq!(
            det.detect("Der schnelle braune Fuchs springt über den faulen Hund hinweg"),
            "de"
        );
    }

    #[test]
    fn batch_detection_preserves_order_and_length() {
        let det = detector();
        let texts = vec!["Hello world, how are you today?".to_string(), "!!!".to_string()];
        let langs = det.detect_batch(&texts);
        assert_eq!(langs.len(), 2);
        assert_eq!(langs[1], "und");
    }
}
