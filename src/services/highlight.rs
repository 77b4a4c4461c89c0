// Highlight Service
// Marks key phrases from an analysis result inside the source text

use std::cmp::Reverse;
use std::fmt::Write as _;

use html_escape::encode_text;
use regex::RegexBuilder;
use tracing::{debug, warn};

use crate::models::AnalysisResult;

const PHRASE_ITEMS: usize = 5;
const PHRASE_WORDS: usize = 5;
const KEYWORD_ITEMS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightCategory {
    Risk,
    ActionItem,
    Decision,
    Opportunity,
    Keyword,
}

impl HighlightCategory {
    pub fn color(&self) -> &'static str {
        match self {
            Self::Risk => "#ffcccc",
            Self::ActionItem => "#ffffcc",
            Self::Decision => "#ccffcc",
            Self::Opportunity => "#ccffff",
            Self::Keyword => "#ffccff",
        }
    }
}

/// Phrases to mark, per category, in application order.
pub type HighlightPatterns = Vec<(HighlightCategory, Vec<String>)>;

/// Leading words of the first few items of each list slot, plus the top keywords.
pub fn extract_highlight_patterns(result: &AnalysisResult) -> HighlightPatterns {
    let mut patterns = Vec::new();

    for (category, items) in [
        (HighlightCategory::Risk, &result.risks),
        (HighlightCategory::ActionItem, &result.action_items),
        (HighlightCategory::Decision, &result.decisions),
        (HighlightCategory::Opportunity, &result.opportunities),
    ] {
        if let Some(items) = items {
            patterns.push((category, key_phrases(items)));
        }
    }

    if let Some(keywords) = &result.keywords {
        patterns.push((
            HighlightCategory::Keyword,
            keywords.iter().take(KEYWORD_ITEMS).cloned().collect(),
        ));
    }

    patterns
}

fn key_phrases(items: &[String]) -> Vec<String> {
    items
        .iter()
        .take(PHRASE_ITEMS)
        .map(|item| {
            item.split_whitespace()
                .take(PHRASE_WORDS)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Escape `text` for HTML and wrap every case-insensitive occurrence of each
/// phrase in a coloured span, keeping the source casing.
///
/// All phrases are matched in one pass over the plain text, so markup from one
/// span is never rematched by a later phrase. At a given position the earlier
/// category wins, and within a category the longer phrase.
pub fn highlight_text(text: &str, patterns: &HighlightPatterns) -> String {
    let mut categories = Vec::new();
    let mut groups = Vec::new();
    for (category, terms) in patterns {
        let mut terms: Vec<&str> = terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            continue;
        }
        terms.sort_by_key(|t| Reverse(t.chars().count()));
        let alternation: Vec<String> = terms.iter().map(|t| regex::escape(t)).collect();
        groups.push(format!("({})", alternation.join("|")));
        categories.push(*category);
    }

    if groups.is_empty() {
        return encode_text(text).into_owned();
    }

    let re = match RegexBuilder::new(&groups.join("|"))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            warn!("[HIGHLIGHT] Phrase pattern rejected, emitting plain text: {}", e);
            return encode_text(text).into_owned();
        }
    };

    let mut highlighted = String::with_capacity(text.len() + text.len() / 4);
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let category = (1..caps.len())
            .find(|i| caps.get(*i).is_some())
            .and_then(|i| categories.get(i - 1))
            .copied()
            .unwrap_or(HighlightCategory::Keyword);

        highlighted.push_str(&encode_text(&text[last..whole.start()]));
        let _ = write!(
            highlighted,
            "<span style=\"background-color: {}; padding: 2px; border-radius: 2px;\">{}</span>",
            category.color(),
            encode_text(whole.as_str())
        );
        last = whole.end();
    }
    highlighted.push_str(&encode_text(&text[last..]));

    debug!("[HIGHLIGHT] {} phrase groups applied", categories.len());
    highlighted
}
