// Risk / Opportunity Detector
// Pattern matches plus keyword-scored sentences

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::services::text_processor::split_sentence_fragments;

/// Entries at or below this many characters are discarded.
const MIN_ENTRY_CHARS: usize = 15;
/// Scored sentences must be longer than this.
const MIN_SENTENCE_CHARS: usize = 20;
const MIN_SENTENCE_SCORE: u32 = 2;

/// Keyword weights: 3 per high-tier, 2 per medium-tier, 1 per low-tier keyword present.
#[derive(Debug, Clone, Copy)]
pub struct KeywordTiers {
    pub high: &'static [&'static str],
    pub medium: &'static [&'static str],
    pub low: &'static [&'static str],
}

impl KeywordTiers {
    /// Substring presence of each keyword counts once per sentence.
    pub fn score(&self, sentence: &str) -> u32 {
        let lower = sentence.to_lowercase();
        let weigh = |keywords: &[&str], weight: u32| -> u32 {
            keywords
                .iter()
                .filter(|k| lower.contains(**k))
                .count() as u32
                * weight
        };
        weigh(self.high, 3) + weigh(self.medium, 2) + weigh(self.low, 1)
    }
}

pub const RISK_TIERS: KeywordTiers = KeywordTiers {
    high: &["risk", "threat", "danger", "vulnerability", "exposure", "uncertainty", "volatility"],
    medium: &["challenge", "issue", "concern", "problem", "difficulty", "obstacle"],
    low: &["consideration", "factor", "aspect", "element"],
};

pub const OPPORTUNITY_TIERS: KeywordTiers = KeywordTiers {
    high: &["opportunity", "advantage", "benefit", "potential", "growth", "expansion", "innovation"],
    medium: &["improvement", "enhancement", "development", "progress", "advancement"],
    low: &["possibility", "option", "alternative", "prospect"],
};

static RISK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:high|significant|major|serious)\s+(?:risk|threat|danger)[^.!?]*[.!?]",
        r"(?i)(?:potential|possible)\s+risk[^.!?]*[.!?]",
        r"(?i)(?:may|could|might)\s+(?:result in|lead to|cause)\s+[^.!?]*[.!?]",
        r"(?i)(?:challenge|issue|problem)\s+(?:with|in|regarding)[^.!?]*[.!?]",
        r"(?i)(?:failure to|inability to)[^.!?]*[.!?]",
        r"(?i)(?:compliance|regulatory|legal)\s+(?:issue|risk|concern)[^.!?]*[.!?]",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("risk pattern should compile"))
    .collect()
});

static OPPORTUNITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:opportunity|potential|possibility)\s+(?:for|to|in)[^.!?]*[.!?]",
        r"(?i)(?:can|could)\s+(?:lead to|result in|create)[^.!?]*[.!?]",
        r"(?i)(?:benefit|advantage)\s+(?:of|for|in)[^.!?]*[.!?]",
        r"(?i)(?:growth|expansion|improvement)\s+(?:in|of|for)[^.!?]*[.!?]",
        r"(?i)(?:competitive advantage|market opportunity)[^.!?]*[.!?]",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("opportunity pattern should compile"))
    .collect()
});

#[derive(Debug, Default, Clone, Copy)]
pub struct RiskOpportunityDetector;

impl RiskOpportunityDetector {
    pub fn new() -> Self {
        Self
    }

    /// Unique risk statements. Order is unspecified.
    pub fn detect_risks(&self, text: &str) -> Vec<String> {
        detect(&RISK_PATTERNS, &RISK_TIERS, text)
    }

    /// Unique opportunity statements. Order is unspecified.
    pub fn detect_opportunities(&self, text: &str) -> Vec<String> {
        detect(&OPPORTUNITY_PATTERNS, &OPPORTUNITY_TIERS, text)
    }
}

fn detect(patterns: &[Regex], tiers: &KeywordTiers, text: &str) -> Vec<String> {
    let pattern_hits = patterns
        .iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| m.as_str());

    let sentence_hits = split_sentence_fragments(text).into_iter().filter(|sentence| {
        tiers.score(sentence) >= MIN_SENTENCE_SCORE
            && sentence.trim().chars().count() > MIN_SENTENCE_CHARS
    });

    let mut seen = HashSet::new();
    pattern_hits
        .chain(sentence_hits)
        .map(str::trim)
        .filter(|entry| entry.chars().count() > MIN_ENTRY_CHARS)
        .filter(|entry| seen.insert(*entry))
        .map(str::to_string)
        .collect()
}
