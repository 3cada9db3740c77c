use lazy_static::lazy_static;
use regex::Regex;

use crate::common::config::Config;

const MASK_PREFIX: &str = "⟪MSK";
const MASK_SUFFIX: &str = "⟫";

// Emoji blocks not reliably covered by the `So` category check below.
const EMOJI_RANGES: [(u32, u32); 6] = [
    (0x1F300, 0x1FAFF),
    (0x1F600, 0x1F64F),
    (0x1F680, 0x1F6FF),
    (0x2600, 0x26FF),
    (0x2700, 0x27BF),
    (0x1F900, 0x1F9FF),
];

lazy_static! {
    static ref PUNCT_SYMBOL_RE: Regex = Regex::new(r"[\p{P}\p{S}]").unwrap();
    static ref SYMBOL_OTHER_RE: Regex = Regex::new(r"\p{So}").unwrap();
    // Tolerant sentinel shapes: quoted/bracketed, then bare. Index matching
    // is done on the captured digits, not in the pattern.
    static ref QUOTED_MASK_RE: Regex =
        Regex::new(r#"["'“”«»⟪\[\(]\s*[Mm][Ss][Kk]\s*([0-9]+)\s*["'“”»⟫\]\)]"#).unwrap();
    static ref BARE_MASK_RE: Regex = Regex::new(r"[Mm][Ss][Kk]\s*([0-9]+)").unwrap();
    static ref LEFTOVER_MASK_RE: Regex = Regex::new(r"⟪\s*[Mm][Ss][Kk]\s*[0-9]+\s*⟫").unwrap();
}

fn char_matches(re: &Regex, ch: char) -> bool {
    let mut buf = [0u8; 4];
    re.is_match(ch.encode_utf8(&mut buf))
}

/// Symbol-masking toggles, taken from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct MaskOptions {
    pub enabled: bool,
    pub digits: bool,
    pub punct: bool,
    pub emoji: bool,
}

impl MaskOptions {
    pub fn from_config(config: &Config) -> MaskOptions {
        MaskOptions {
            enabled: config.symbol_masking,
            digits: config.mask_digits,
            punct: config.mask_punct,
            emoji: config.mask_emoji,
        }
    }

    pub fn disabled() -> MaskOptions {
        MaskOptions {
            enabled: false,
            digits: false,
            punct: false,
            emoji: false,
        }
    }
}

fn is_emoji_char(ch: char) -> bool {
    let cp = ch as u32;
    if EMOJI_RANGES.iter().any(|&(a, b)| (a..=b).contains(&cp)) {
        return true;
    }
    char_matches(&SYMBOL_OTHER_RE, ch)
}

fn is_maskable_char(ch: char, options: &MaskOptions) -> bool {
    if options.digits && ch.is_numeric() {
        return true;
    }
    if options.punct && char_matches(&PUNCT_SYMBOL_RE, ch) {
        return true;
    }
    if options.emoji && is_emoji_char(ch) {
        return true;
    }
    false
}

/// Replace contiguous runs of maskable characters with `⟪MSK{i}⟫`
/// sentinels in insertion order. Returns the masked text and the original
/// runs; `unmask_symbols` restores them positionally.
pub fn mask_symbols(text: &str, options: &MaskOptions) -> (String, Vec<String>) {
    if !options.enabled || text.is_empty() {
        return (text.to_string(), Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    let mut originals = Vec::new();
    let mut masked = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if is_maskable_char(chars[i], options) {
            let mut j = i + 1;
            while j < chars.len() && is_maskable_char(chars[j], options) {
                j += 1;
            }
            let segment: String = chars[i..j].iter().collect();
            masked.push_str(MASK_PREFIX);
            masked.push_str(&originals.len().to_string());
            masked.push_str(MASK_SUFFIX);
            originals.push(segment);
            i = j;
        } else {
            masked.push(chars[i]);
            i += 1;
        }
    }

    (masked, originals)
}

fn replace_first_capture_with_index(
    re: &Regex,
    text: &str,
    index: usize,
    replacement: &str,
) -> Option<String> {
    for captures in re.captures_iter(text) {
        let matched: usize = match captures.get(1).and_then(|m| m.as_str().parse().ok()) {
            Some(value) => value,
            None => continue,
        };
        if matched == index {
            let full = captures.get(0).unwrap();
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..full.start()]);
            out.push_str(replacement);
            out.push_str(&text[full.end()..]);
            return Some(out);
        }
    }
    None
}

/// Substitute each sentinel with its positional original. Translation
/// models damage sentinels in predictable ways (quotes, inserted spaces,
/// case changes, dropped brackets); matching degrades from the exact token
/// through quoted and bare forms. Sentinels the model dropped entirely
/// stay dropped, and unmatched leftovers are removed.
pub fn unmask_symbols(text: &str, originals: &[String], options: &MaskOptions) -> String {
    if !options.enabled || originals.is_empty() || text.is_empty() {
        return text.to_string();
    }

    let mut out = text.to_string();
    for (index, original) in originals.iter().enumerate() {
        let token = format!("{MASK_PREFIX}{index}{MASK_SUFFIX}");
        if let Some(pos) = out.find(&token) {
            out.replace_range(pos..pos + token.len(), original);
            continue;
        }
        if let Some(next) = replace_first_capture_with_index(&QUOTED_MASK_RE, &out, index, original)
        {
            out = next;
            continue;
        }
        if let Some(next) = replace_first_capture_with_index(&BARE_MASK_RE, &out, index, original) {
            out = next;
        }
    }

    LEFTOVER_MASK_RE.replace_all(&out, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on() -> MaskOptions {
        MaskOptions {
            enabled: true,
            digits: true,
            punct: true,
            emoji: true,
        }
    }

    #[test]
    fn roundtrip_restores_original() {
        let options = all_on();
        let samples = [
            "Price: $9.99 (20% off)! 🎉",
            "plain words only",
            "123 456 789",
            "emoji 🤣 inside",
            "trailing punctuation...",
            "mixed: a1! b2? c3.",
            "",
        ];
        for sample in samples {
            let (masked, originals) = mask_symbols(sample, &options);
            assert_eq!(unmask_symbols(&masked, &originals, &options), sample);
        }
    }

    #[test]
    fn masked_text_contains_only_sentinels_for_symbols() {
        let options = all_on();
        let (masked, originals) = mask_symbols("Price: $9.99 (20% off)! 🎉", &options);
        assert!(!masked.contains('$'));
        assert!(!masked.contains('9'));
        assert!(!masked.contains('🎉'));
        assert!(masked.contains("⟪MSK0⟫"));
        assert!(!originals.is_empty());
    }

    #[test]
    fn unmask_tolerates_model_damage() {
        let options = all_on();
        let originals = vec!["$9.99".to_string(), "!".to_string()];
        assert_eq!(
            unmask_symbols("Preis \"MSK 0\" heute MSK1", &originals, &options),
            "Preis $9.99 heute !"
        );
        assert_eq!(
            unmask_symbols("Preis msk0 heute (MSK 1)", &originals, &options),
            "Preis $9.99 heute !"
        );
    }

    #[test]
    fn bare_index_matching_is_exact() {
        let options = all_on();
        let originals = vec!["#".to_string(), "%".to_string()];
        // MSK1 must not be consumed while resolving index 0.
        assert_eq!(
            unmask_symbols("a MSK1 b MSK0", &originals, &options),
            "a % b #"
        );
    }

    #[test]
    fn unmatched_sentinels_are_removed() {
        let options = all_on();
        let originals = vec!["!".to_string()];
        assert_eq!(
            unmask_symbols("ok ⟪MSK0⟫ stray ⟪MSK7⟫", &originals, &options),
            "ok ! stray "
        );
    }

    #[test]
    fn disabled_masking_is_identity() {
        let options = MaskOptions::disabled();
        let (masked, originals) = mask_symbols("$1 and 2%", &options);
        assert_eq!(masked, "$1 and 2%");
        assert!(originals.is_empty());
    }
}
