//! Preprocessing invariants over a broader corpus than the unit tests:
//! split/chunk recombination order and noise monotonicity.

use nmt_server::text::{
    chunk_sentences, is_noise, remove_repeating_new_symbols, split_sentences, strip_control_chars,
};

fn corpus() -> Vec<String> {
    vec![
        "Hello world.".to_string(),
        "One. Two! Three? And a trailing fragment".to_string(),
        "No terminator at all just words and words and words".to_string(),
        "word ".repeat(300),
        "Short. ".repeat(80),
        "Unicode: füße, 中文句子。 and emoji 🎉 between. Sentences!".to_string(),
        "".to_string(),
        "   ".to_string(),
    ]
}

#[test]
fn chunk_recombination_preserves_segment_order() {
    for text in corpus() {
        let sentences = split_sentences(&text, 120);
        let chunks = chunk_sentences(&sentences, 200, " ");
        let rejoined = chunks.join(" ");
        let direct = sentences.join(" ");
        assert_eq!(rejoined, direct, "order lost for input: {text:?}");
    }
}

#[test]
fn split_sentences_respects_length_limit() {
    for text in corpus() {
        for sentence in split_sentences(&text, 50) {
            assert!(
                sentence.chars().count() <= 50,
                "oversize sentence {sentence:?} from {text:?}"
            );
        }
    }
}

#[test]
fn chunks_never_exceed_limit_when_sentences_fit() {
    for text in corpus() {
        let sentences = split_sentences(&text, 100);
        for chunk in chunk_sentences(&sentences, 100, " ") {
            assert!(chunk.chars().count() <= 100, "oversize chunk {chunk:?}");
        }
    }
}

#[test]
fn noise_is_monotone_under_control_stripping() {
    let noisy_corpus = [
        "ok\u{1}\u{2}",
        "\u{7}",
        "abc",
        "!?!",
        "a\u{0}b\u{0}c",
        "12%",
    ];
    for text in noisy_corpus {
        let stripped = strip_control_chars(text);
        // Stripping can only move a string towards noise, never away
        if is_noise(&stripped, 2, 0.3) {
            assert!(is_noise(text, 2, 0.3), "stripping changed verdict for {text:?}");
        }
    }
}

#[test]
fn repeated_artifact_cleanup_keeps_source_symbols() {
    let src = "Price: $9.99 (20% off)!";
    // The model produced the source punctuation plus an invented run
    let out = "Preis: $9.99 (20% Rabatt)!????";
    let cleaned = remove_repeating_new_symbols(src, out);
    assert!(cleaned.contains("$9.99"));
    assert!(cleaned.contains('!'));
    assert!(!cleaned.contains("????"));
}
