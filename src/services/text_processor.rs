// Text Processing Service
// Sentence/paragraph splitting, tokenization and the shared long-text chunker

use regex::Regex;
use std::sync::LazyLock;

static SENTENCE_BOUNDARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("sentence boundary pattern should compile"));

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word pattern should compile"));

static SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{3000}\u{00A0}]").expect("space pattern should compile"));

static HORIZONTAL_WS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\x0C\x0B]+").expect("whitespace pattern should compile"));

static PREPROCESS_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").expect("token pattern should compile"));

const PREPROCESS_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "her", "was", "one",
    "our", "out", "who", "get", "has", "had", "him",
];

/// Normalize extracted document text before analysis.
///
/// Smart quotes become ASCII quotes, em/en dashes become `-`, non-breaking and
/// ideographic spaces become plain spaces, line endings are unified and runs of
/// horizontal whitespace collapse to a single space. Blank lines are kept so
/// paragraph boundaries survive.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut s = text
        .replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{2014}', '\u{2013}'], "-");

    s = SPACE_RE.replace_all(&s, " ").to_string();
    s = s.replace("\r\n", "\n").replace('\r', "\n");
    s = HORIZONTAL_WS_RE.replace_all(&s, " ").to_string();

    s.lines()
        .map(|ln| ln.trim())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Length in Unicode scalar values. All size thresholds in the pipeline
/// count characters, not UTF-8 bytes.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Split on runs of `.`, `!` and `?`; fragments are trimmed and empty ones dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_BOUNDARY_RE
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Raw `[.!?]+` fragments without trimming or filtering.
pub fn split_sentence_fragments(text: &str) -> Vec<&str> {
    SENTENCE_BOUNDARY_RE.split(text).collect()
}

/// Blank-line delimited paragraphs, empty blocks dropped.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n").filter(|p| !p.trim().is_empty()).collect()
}

/// Alphanumeric word runs (`\b\w+\b`).
pub fn word_tokens(text: &str) -> Vec<&str> {
    WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Greedy sentence accumulation under a character budget.
///
/// The text is split on `.`; each piece is appended together with its `.`
/// while the chunk stays under `budget`, otherwise the chunk is flushed and a
/// new one started. A single piece longer than the budget becomes its own chunk.
pub fn chunk_by_sentences(text: &str, budget: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for piece in text.split('.') {
        let piece_chars = char_len(piece);
        if current_chars + piece_chars < budget {
            current.push_str(piece);
            current.push('.');
            current_chars += piece_chars + 1;
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(piece);
            current.push('.');
            current_chars = piece_chars + 1;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Round to `decimals` places using the exact binary value of `value`.
///
/// `(x * 10).round() / 10` would turn 0.15 into 0.2; formatting uses the exact
/// decimal expansion (0.1499...) and yields 0.1.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Lowercased content words with short tokens and common stop words removed.
pub fn preprocess_text(text: &str) -> String {
    let lower = text.to_lowercase();
    PREPROCESS_TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| !PREPROCESS_STOP_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        let input = "Hello\u{201c}World\u{201d}\r\n  second\u{00A0}\u{00A0}line  ";
        assert_eq!(normalize_text(input), "Hello\"World\"\nsecond line");
    }

    #[test]
    fn test_normalize_keeps_paragraph_breaks() {
        let input = "First.\r\n\r\nSecond.";
        assert_eq!(split_paragraphs(&normalize_text(input)).len(), 2);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One. Two!! Three?  ...");
        assert_eq!(sentences, vec!["One", "Two", "Three"]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_split_paragraphs() {
        let text = "First paragraph.\n\nSecond paragraph.\n\n\n\n";
        assert_eq!(split_paragraphs(text).len(), 2);
    }

    #[test]
    fn test_word_tokens() {
        assert_eq!(word_tokens("It's 2024, okay?").len(), 4);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        let text = "\u{4e00}\u{4e8c}\u{4e09}abc";
        assert_eq!(truncate_chars(text, 2), "\u{4e00}\u{4e8c}");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_chunk_by_sentences_respects_budget() {
        let sentence = "a".repeat(40);
        let text = format!("{}.", sentence).repeat(30);
        let chunks = chunk_by_sentences(&text, 500);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 500);
        }
        let rebuilt: usize = chunks.iter().map(|c| c.matches('a').count()).sum();
        assert_eq!(rebuilt, 40 * 30);
    }

    #[test]
    fn test_chunk_by_sentences_oversized_piece_is_own_chunk() {
        let long = "b".repeat(80);
        let text = format!("short.{}.tail", long);
        let chunks = chunk_by_sentences(&text, 50);
        assert_eq!(chunks[0], "short.");
        assert_eq!(chunks[1], format!("{}.", long));
        assert_eq!(chunks[2], "tail.");
    }

    #[test]
    fn test_round_to_matches_python_semantics() {
        assert_eq!(round_to(0.15, 1), 0.1);
        assert_eq!(round_to(0.05, 1), 0.1);
        assert_eq!(round_to(10.0 / 3.0, 2), 3.33);
        assert_eq!(round_to(0.0, 1), 0.0);
    }

    #[test]
    fn test_preprocess_text() {
        let processed = preprocess_text("The TEST document and our stop words");
        assert_eq!(processed, "test document stop words");
    }
}
