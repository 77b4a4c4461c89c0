// Linguistic Backend
// Unicode word/sentence segmentation and pattern-based named entities

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Entity category, named with the conventional short labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityLabel {
    #[serde(rename = "ORG")]
    Org,
    #[serde(rename = "PERSON")]
    Person,
    #[serde(rename = "GPE")]
    Gpe,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "MONEY")]
    Money,
    #[serde(rename = "PERCENT")]
    Percent,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Org => "ORG",
            Self::Person => "PERSON",
            Self::Gpe => "GPE",
            Self::Date => "DATE",
            Self::Money => "MONEY",
            Self::Percent => "PERCENT",
        }
    }
}

/// A named span found in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    /// Byte offset of the span, used for document ordering.
    pub start: usize,
}

pub trait NlpBackend: Send + Sync {
    /// Short identifier for logs (e.g. "rule").
    fn backend_id(&self) -> &str;

    /// Word tokens, punctuation and whitespace excluded.
    fn words<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// Non-empty trimmed sentences.
    fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// Entities in document order.
    fn entities(&self, text: &str) -> Vec<Entity>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleNlpBackend;

impl RuleNlpBackend {
    pub fn new() -> Self {
        Self
    }
}

// ============================================================================
// Entity pattern tables
// ============================================================================

static ORG_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:[A-Z][A-Za-z&\-]*\s+){0,3}[A-Z][A-Za-z&\-]*\s+(?:Inc|Corp|Corporation|Ltd|LLC|plc|PLC|Group|Holdings|Company|Partners|Bank)\b",
    )
    .expect("organization suffix pattern should compile")
});

static ORG_ACRONYM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:SEC|FDA|FTC|IRS|EU|UN|IMF|OECD|WTO|NASDAQ|NYSE|IBM|KPMG|PwC|EY)\b")
        .expect("organization acronym pattern should compile")
});

static PERSON_HONORIFIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)")
        .expect("honorific pattern should compile")
});

static PERSON_ROLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:CEO|CFO|COO|CTO|Chairman|Chairwoman|Chair|President|Director|Manager|Treasurer|Secretary)\s+([A-Z][a-z]+\s+[A-Z][a-z]+)",
    )
    .expect("role pattern should compile")
});

static GPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:United States|United Kingdom|European Union|China|Japan|Germany|France|India|Canada|Brazil|Mexico|Australia|Singapore|Switzerland|Netherlands|New York|London|Tokyo|Beijing|Shanghai|Hong Kong|Paris|Berlin|Frankfurt|Zurich|San Francisco|Chicago|Toronto|Sydney)\b",
    )
    .expect("place pattern should compile")
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(?:st|nd|rd|th)?(?:,\s*\d{4})?|(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4}|\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4}|Q[1-4]\s+\d{4}|FY\s?\d{2,4})\b",
    )
    .expect("date pattern should compile")
});

static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:[$€£¥]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:million|billion|thousand)\b|[MBK]\b)?|\b\d[\d,]*(?:\.\d+)?\s?(?:million\s|billion\s)?(?:dollars|USD|EUR|euros)\b)",
    )
    .expect("money pattern should compile")
});

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(?:\.\d+)?\s?(?:%|percent\b)").expect("percent pattern should compile")
});

fn collect_whole(re: &Regex, label: EntityLabel, text: &str, out: &mut Vec<Entity>) {
    for m in re.find_iter(text) {
        out.push(Entity {
            text: m.as_str().trim().to_string(),
            label,
            start: m.start(),
        });
    }
}

fn collect_group(re: &Regex, label: EntityLabel, text: &str, out: &mut Vec<Entity>) {
    for caps in re.captures_iter(text) {
        if let Some(m) = caps.get(1) {
            out.push(Entity {
                text: m.as_str().to_string(),
                label,
                start: m.start(),
            });
        }
    }
}

impl NlpBackend for RuleNlpBackend {
    fn backend_id(&self) -> &str {
        "rule"
    }

    fn words<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.unicode_words().collect()
    }

    fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn entities(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();

        collect_whole(&ORG_SUFFIX_RE, EntityLabel::Org, text, &mut entities);
        collect_whole(&ORG_ACRONYM_RE, EntityLabel::Org, text, &mut entities);
        collect_group(&PERSON_HONORIFIC_RE, EntityLabel::Person, text, &mut entities);
        collect_group(&PERSON_ROLE_RE, EntityLabel::Person, text, &mut entities);
        collect_whole(&GPE_RE, EntityLabel::Gpe, text, &mut entities);
        collect_whole(&DATE_RE, EntityLabel::Date, text, &mut entities);
        collect_whole(&MONEY_RE, EntityLabel::Money, text, &mut entities);
        collect_whole(&PERCENT_RE, EntityLabel::Percent, text, &mut entities);

        entities.retain(|e| !e.text.is_empty());
        entities.sort_by_key(|e| (e.start, e.label));
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(entities: &[Entity], label: EntityLabel) -> Vec<&str> {
        entities
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.text.as_str())
            .collect()
    }

    #[test]
    fn test_words_skip_punctuation() {
        let nlp = RuleNlpBackend::new();
        assert_eq!(nlp.words("Revenue rose, sharply!"), vec!["Revenue", "rose", "sharply"]);
    }

    #[test]
    fn test_sentences() {
        let nlp = RuleNlpBackend::new();
        let sentences = nlp.sentences("Sales grew. Costs fell! Is that good?");
        assert_eq!(sentences, vec!["Sales grew.", "Costs fell!", "Is that good?"]);
        assert!(nlp.sentences("   ").is_empty());
    }

    #[test]
    fn test_entities_by_label() {
        let nlp = RuleNlpBackend::new();
        let text = "Acme Holdings reported $4.5 million in revenue on March 3, 2024. \
                    CEO Jane Smith said margins rose 12% in Germany.";
        let entities = nlp.entities(text);

        assert_eq!(labelled(&entities, EntityLabel::Org), vec!["Acme Holdings"]);
        assert_eq!(labelled(&entities, EntityLabel::Person), vec!["Jane Smith"]);
        assert_eq!(labelled(&entities, EntityLabel::Gpe), vec!["Germany"]);
        assert_eq!(labelled(&entities, EntityLabel::Date), vec!["March 3, 2024"]);
        assert_eq!(labelled(&entities, EntityLabel::Money), vec!["$4.5 million"]);
        assert_eq!(labelled(&entities, EntityLabel::Percent), vec!["12%"]);
    }

    #[test]
    fn test_entities_in_document_order() {
        let nlp = RuleNlpBackend::new();
        let entities = nlp.entities("Offices in Tokyo and London.");
        let texts: Vec<_> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Tokyo", "London"]);
        assert_eq!(EntityLabel::Gpe.as_str(), "GPE");
    }
}
