// Keyword Extractor
// Frequency keywords plus pattern-based action items and decisions

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_TOP_N: usize = 20;

/// Captures at or below this many characters are discarded.
const MIN_CAPTURE_CHARS: usize = 10;

static KEYWORD_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{4,}\b").expect("keyword token pattern should compile"));

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "her", "was", "one",
    "our", "out", "who", "get", "has", "had", "him", "how", "man", "its", "now", "old", "see",
    "two", "way", "boy", "did", "let", "put", "say", "she", "too", "use", "that", "with", "this",
    "from", "have", "they", "which", "their", "what", "when", "where", "your", "will", "would",
    "there", "been", "were", "them", "than", "then",
];

/// Tried in order; group 1 is the extracted clause.
static ACTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:need to|must|should|will)\s+([^.!?]*(?:implement|complete|finish|submit|review|approve|prepare|send|check|verify)[^.!?]*[.!?])",
        r"(?i)(?:action item|todo|task):?\s*([^.!?]*[.!?])",
        r"(?i)(?:please|kindly)\s+([^.!?]*(?:prepare|send|check|verify)[^.!?]*[.!?])",
        r"(?i)(?:ensure|make sure)\s+([^.!?]*[.!?])",
        r"(?i)(?:required to|expected to)\s+([^.!?]*[.!?])",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("action pattern should compile"))
    .collect()
});

static DECISION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:decided|agreed|concluded|resolved)\s+([^.!?]*[.!?])",
        r"(?i)(?:decision|resolution):?\s*([^.!?]*[.!?])",
        r"(?i)(?:it was|we have)\s+(?:decided|agreed)\s+([^.!?]*[.!?])",
        r"(?i)(?:the board|committee|team)\s+(?:approved|rejected)\s+([^.!?]*[.!?])",
        r"(?i)(?:conclusion|agreement)\s+([^.!?]*[.!?])",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("decision pattern should compile"))
    .collect()
});

#[derive(Debug, Clone, Copy)]
pub struct KeywordExtractor {
    top_n: usize,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}

impl KeywordExtractor {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Most frequent content words, highest count first. Equal counts keep
    /// first-occurrence order.
    pub fn extract_keywords(&self, text: &str, top_n: usize) -> Vec<String> {
        let lower = text.to_lowercase();

        let mut order: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for word in KEYWORD_TOKEN_RE.find_iter(&lower).map(|m| m.as_str()) {
            if STOP_WORDS.contains(&word) {
                continue;
            }
            let count = counts.entry(word).or_insert(0);
            if *count == 0 {
                order.push(word);
            }
            *count += 1;
        }

        let mut ranked: Vec<(&str, usize)> = order.into_iter().map(|w| (w, counts[w])).collect();
        // Stable: ties stay in first-seen order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        ranked
            .into_iter()
            .take(top_n)
            .map(|(w, _)| w.to_string())
            .collect()
    }

    /// Keywords with the extractor's configured `top_n`.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        self.extract_keywords(text, self.top_n)
    }

    pub fn extract_action_items(&self, text: &str) -> Vec<String> {
        collect_captures(&ACTION_PATTERNS, text)
    }

    pub fn extract_decisions(&self, text: &str) -> Vec<String> {
        collect_captures(&DECISION_PATTERNS, text)
    }
}

/// Group-1 captures of every pattern in table order, trimmed, short ones
/// dropped. Overlapping patterns may yield duplicates; they are kept.
fn collect_captures(patterns: &[Regex], text: &str) -> Vec<String> {
    patterns
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| s.chars().count() > MIN_CAPTURE_CHARS)
        .map(str::to_string)
        .collect()
}
