use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SENT_BOUNDARY_RE: Regex = Regex::new(r"[.!?…]+\s+").unwrap();
    static ref WORD_SPLIT_RE: Regex = Regex::new(r"[,;:]|\s+").unwrap();
    static ref EXCESS_WHITESPACE_RE: Regex = Regex::new(r"\s{3,}").unwrap();
    static ref SYMBOL_CHAR_RE: Regex = Regex::new(r"[\p{P}\p{S}]").unwrap();
}

fn char_matches(re: &Regex, ch: char) -> bool {
    let mut buf = [0u8; 4];
    re.is_match(ch.encode_utf8(&mut buf))
}

/// Remove ASCII control characters except common whitespace.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&ch| ch == '\t' || ch == '\n' || ch == '\r' || ch as u32 >= 32)
        .collect()
}

/// True when the text is too short or carries too little alphanumeric
/// content to be worth translating. Stripping control characters first
/// means stripping can only push a string further towards noise.
pub fn is_noise(text: &str, min_chars: usize, min_alnum_ratio: f64) -> bool {
    let stripped = strip_control_chars(text);
    let trimmed = stripped.trim();
    if trimmed.chars().count() < min_chars {
        return true;
    }

    let no_space: Vec<char> = trimmed.chars().filter(|ch| !ch.is_whitespace()).collect();
    if no_space.is_empty() {
        return true;
    }

    let alnum = no_space.iter().filter(|ch| ch.is_alphanumeric()).count();
    if alnum == 0 {
        // Pure symbols/emoji/punctuation
        return true;
    }

    (alnum as f64) / (no_space.len().max(1) as f64) < min_alnum_ratio
}

fn split_keeping_separators<'a>(re: &Regex, text: &'a str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        if m.start() > last {
            parts.push(&text[last..m.start()]);
        }
        parts.push(m.as_str());
        last = m.end();
    }
    if last < text.len() {
        parts.push(&text[last..]);
    }
    parts
}

/// Split text into sentences on `. ! ? …` boundaries, preserving the
/// terminators. Sentences longer than `max_sentence_chars` are further cut
/// at word boundaries within the window.
pub fn split_sentences(text: &str, max_sentence_chars: usize) -> Vec<String> {
    let stripped = strip_control_chars(text);
    let cleaned = stripped.trim();
    if cleaned.is_empty() {
        return Vec::new();
    }

    let mut parts: Vec<String> = Vec::new();
    let mut last = 0;
    for m in SENT_BOUNDARY_RE.find_iter(cleaned) {
        parts.push(cleaned[last..m.end()].trim().to_string());
        last = m.end();
    }
    if last < cleaned.len() {
        parts.push(cleaned[last..].trim().to_string());
    }
    if parts.is_empty() {
        parts.push(cleaned.to_string());
    }

    let mut enforced = Vec::new();
    for part in parts {
        if part.chars().count() <= max_sentence_chars {
            enforced.push(part);
            continue;
        }

        // Re-cut oversize sentences on word boundaries
        let mut buffer = String::new();
        let mut buffer_len = 0usize;
        for token in split_keeping_separators(&WORD_SPLIT_RE, &part) {
            let token_len = token.chars().count();
            if buffer_len + token_len > max_sentence_chars && !buffer.trim().is_empty() {
                enforced.push(buffer.trim().to_string());
                buffer = token.to_string();
                buffer_len = token_len;
            } else {
                buffer.push_str(token);
                buffer_len += token_len;
            }
        }
        if !buffer.trim().is_empty() {
            enforced.push(buffer.trim().to_string());
        }
    }

    enforced.retain(|s| !s.is_empty());
    enforced
}

/// Greedily pack sentences into chunks that never exceed `max_chars`
/// (joined with `joiner`). A single oversize sentence becomes its own
/// chunk; `split_sentences` already keeps those below the sentence limit.
pub fn chunk_sentences(sentences: &[String], max_chars: usize, joiner: &str) -> Vec<String> {
    let joiner_len = joiner.chars().count();
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for sentence in sentences {
        let sentence_len = sentence.chars().count();
        let add_len = if current.is_empty() {
            sentence_len
        } else {
            joiner_len + sentence_len
        };

        if !current.is_empty() && current_len + add_len > max_chars {
            chunks.push(current.join(joiner));
            current = vec![sentence.as_str()];
            current_len = sentence_len;
        } else {
            current.push(sentence.as_str());
            current_len += add_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current.join(joiner));
    }
    chunks
}

/// Split a long un-split item on sentence boundaries when auto-chunking is
/// enabled and the text exceeds `max_total_chars`; otherwise the item is a
/// single chunk.
pub fn auto_chunk(
    text: &str,
    enabled: bool,
    max_total_chars: usize,
    max_sentence_chars: usize,
    max_chunk_chars: usize,
    joiner: &str,
) -> Vec<String> {
    if !enabled || text.chars().count() <= max_total_chars {
        return vec![text.to_string()];
    }
    let sentences = split_sentences(text, max_sentence_chars);
    if sentences.is_empty() {
        return vec![text.to_string()];
    }
    chunk_sentences(&sentences, max_chunk_chars, joiner)
}

fn is_symbol_char(ch: char) -> bool {
    if ch.is_whitespace() || ch.is_alphanumeric() {
        return false;
    }
    char_matches(&SYMBOL_CHAR_RE, ch)
}

/// Remove runs (length >= 2) of a symbol character that does not occur in
/// the source text. Prevents translation artifacts like `!!!!` or a
/// repeated emoji the model invented.
pub fn remove_repeating_new_symbols(src: &str, out: &str) -> String {
    if out.is_empty() {
        return out.to_string();
    }

    let allowed: std::collections::HashSet<char> =
        src.chars().filter(|&ch| is_symbol_char(ch)).collect();

    let chars: Vec<char> = out.chars().collect();
    let mut cleaned = String::with_capacity(out.len());
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let mut j = i + 1;
        while j < chars.len() && chars[j] == ch {
            j += 1;
        }
        let run_len = j - i;
        if !(run_len >= 2 && is_symbol_char(ch) && !allowed.contains(&ch)) {
            for &c in &chars[i..j] {
                cleaned.push(c);
            }
        }
        i = j;
    }

    EXCESS_WHITESPACE_RE.replace_all(&cleaned, "  ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_detection_boundaries() {
        assert!(is_noise("", 1, 0.2));
        assert!(is_noise("   ", 1, 0.2));
        assert!(is_noise("!!!", 1, 0.2));
        assert!(is_noise("\u{1}\u{2}", 1, 0.2));
        assert!(!is_noise("Hello", 1, 0.2));
        assert!(!is_noise("a", 1, 0.2));
        assert!(is_noise("a", 2, 0.2));
    }

    #[test]
    fn noise_monotone_under_stripping() {
        // Stripping control chars never turns noise into non-noise.
        let samples = ["ok\u{1}", "\u{7}!!", "text\u{0}with\u{0}controls"];
        for s in samples {
            let stripped = strip_control_chars(s);
            if is_noise(&stripped, 1, 0.2) {
                assert!(is_noise(s, 1, 0.2));
            }
        }
    }

    #[test]
    fn sentences_preserve_terminators() {
        let sents = split_sentences("One. Two! Three? Done", 500);
        assert_eq!(sents, vec!["One.", "Two!", "Three?", "Done"]);
    }

    #[test]
    fn oversize_sentence_is_cut_at_word_boundary() {
        let long = "word ".repeat(40);
        let sents = split_sentences(&long, 50);
        assert!(sents.len() > 1);
        for s in &sents {
            assert!(s.chars().count() <= 50, "sentence too long: {s}");
        }
    }

    #[test]
    fn chunking_respects_limit_and_order() {
        let sentences: Vec<String> = (0..5).map(|i| format!("sentence number {i}.")).collect();
        let chunks = chunk_sentences(&sentences, 40, " ");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40);
        }
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined, sentences.join(" "));
    }

    #[test]
    fn auto_chunk_only_beyond_threshold() {
        assert_eq!(auto_chunk("short text.", true, 100, 500, 900, " ").len(), 1);
        let long = "A sentence here. ".repeat(100);
        let chunks = auto_chunk(&long, true, 200, 500, 100, " ");
        assert!(chunks.len() > 1);
        assert_eq!(auto_chunk(&long, false, 200, 500, 100, " ").len(), 1);
    }

    #[test]
    fn repeated_new_symbols_are_dropped() {
        assert_eq!(remove_repeating_new_symbols("hello", "hi!!!!"), "hi");
        // Symbols present in the source survive
        assert_eq!(remove_repeating_new_symbols("wow!!", "wow!!"), "wow!!");
        // Single occurrences survive even when new
        assert_eq!(remove_repeating_new_symbols("hello", "hi!"), "hi!");
    }
}
