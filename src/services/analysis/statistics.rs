// Statistics Collector
// Word/sentence/paragraph counts, reading time and named entities

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::DocumentStatistics;
use crate::services::text_processor::{
    preprocess_text, round_to, split_paragraphs, split_sentences, word_tokens,
};

use super::nlp::{NlpBackend, RuleNlpBackend};

const WORDS_PER_MINUTE: f64 = 200.0;

/// Segmentation capability, chosen once at construction.
#[derive(Clone)]
pub enum StatisticsBackend {
    /// Linguistic segmentation plus entities.
    Linguistic(Arc<dyn NlpBackend>),
    /// Regex word runs and `[.!?]+` sentence splitting, no entities.
    Simple,
}

#[derive(Clone)]
pub struct StatisticsCollector {
    backend: StatisticsBackend,
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::linguistic()
    }
}

impl StatisticsCollector {
    pub fn new(backend: StatisticsBackend) -> Self {
        Self { backend }
    }

    pub fn linguistic() -> Self {
        Self::new(StatisticsBackend::Linguistic(Arc::new(RuleNlpBackend::new())))
    }

    pub fn simple() -> Self {
        Self::new(StatisticsBackend::Simple)
    }

    pub fn has_nlp_model(&self) -> bool {
        matches!(self.backend, StatisticsBackend::Linguistic(_))
    }

    /// Name of the segmentation backend, for logs.
    pub fn backend_name(&self) -> &str {
        match &self.backend {
            StatisticsBackend::Linguistic(nlp) => nlp.backend_id(),
            StatisticsBackend::Simple => "simple",
        }
    }

    pub fn get_statistics(&self, text: &str) -> DocumentStatistics {
        if text.trim().is_empty() {
            return DocumentStatistics::default();
        }

        let (word_count, sentence_count, entities) = match &self.backend {
            StatisticsBackend::Linguistic(nlp) => (
                nlp.words(text).len(),
                nlp.sentences(text).len(),
                group_entities(nlp.as_ref(), text),
            ),
            StatisticsBackend::Simple => (
                word_tokens(text).len(),
                split_sentences(text).len(),
                BTreeMap::new(),
            ),
        };

        let avg_sentence_length = if sentence_count > 0 {
            round_to(word_count as f64 / sentence_count as f64, 2)
        } else {
            0.0
        };

        DocumentStatistics {
            word_count,
            sentence_count,
            paragraph_count: split_paragraphs(text).len(),
            reading_time_minutes: round_to(word_count as f64 / WORDS_PER_MINUTE, 1),
            avg_sentence_length,
            entities,
        }
    }

    /// Entities grouped by label; empty without a linguistic backend.
    pub fn extract_entities(&self, text: &str) -> BTreeMap<String, Vec<String>> {
        match &self.backend {
            StatisticsBackend::Linguistic(nlp) => group_entities(nlp.as_ref(), text),
            StatisticsBackend::Simple => BTreeMap::new(),
        }
    }

    pub fn segment_sentences(&self, text: &str) -> Vec<String> {
        let sentences = match &self.backend {
            StatisticsBackend::Linguistic(nlp) => nlp.sentences(text),
            StatisticsBackend::Simple => split_sentences(text),
        };
        sentences.into_iter().map(str::to_string).collect()
    }

    pub fn preprocess_text(&self, text: &str) -> String {
        preprocess_text(text)
    }
}

fn group_entities(nlp: &dyn NlpBackend, text: &str) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entity in nlp.entities(text) {
        let bucket = grouped.entry(entity.label.as_str().to_string()).or_default();
        if !bucket.contains(&entity.text) {
            bucket.push(entity.text);
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::nlp::{Entity, EntityLabel};

    #[test]
    fn test_empty_text_is_all_zero() {
        for collector in [StatisticsCollector::simple(), StatisticsCollector::linguistic()] {
            let stats = collector.get_statistics("");
            assert_eq!(stats, DocumentStatistics::default());
            assert_eq!(collector.get_statistics("  \n\n ").word_count, 0);
        }
    }

    #[test]
    fn test_simple_counts_and_rounding() {
        let collector = StatisticsCollector::simple();
        let stats = collector.get_statistics("one two three. four five!\n\nsix seven");
        assert_eq!(stats.word_count, 7);
        assert_eq!(stats.sentence_count, 3);
        assert_eq!(stats.paragraph_count, 2);
        assert_eq!(stats.avg_sentence_length, 2.33);
        assert_eq!(stats.reading_time_minutes, round_to(7.0 / 200.0, 1));
        assert!(stats.entities.is_empty());
    }

    #[test]
    fn test_reading_time_property() {
        let collector = StatisticsCollector::simple();
        let text = "word ".repeat(460);
        let stats = collector.get_statistics(&text);
        assert_eq!(stats.word_count, 460);
        assert_eq!(stats.reading_time_minutes, 2.3);
        assert_eq!(stats.sentence_count, 1);
        assert_eq!(stats.avg_sentence_length, 460.0);
    }

    #[test]
    fn test_linguistic_excludes_punctuation() {
        let collector = StatisticsCollector::linguistic();
        let stats = collector.get_statistics("Profit rose - sharply. Costs, however, fell.");
        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.sentence_count, 2);
        assert_eq!(stats.avg_sentence_length, 3.0);
    }

    struct RepeatingNlp;

    impl NlpBackend for RepeatingNlp {
        fn backend_id(&self) -> &str {
            "repeating"
        }

        fn words<'a>(&self, text: &'a str) -> Vec<&'a str> {
            text.split_whitespace().collect()
        }

        fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
            vec![text]
        }

        fn entities(&self, _text: &str) -> Vec<Entity> {
            let make = |text: &str, label| Entity {
                text: text.to_string(),
                label,
                start: 0,
            };
            vec![
                make("Globex", EntityLabel::Org),
                make("Paris", EntityLabel::Gpe),
                make("Initech", EntityLabel::Org),
                make("Globex", EntityLabel::Org),
            ]
        }
    }

    #[test]
    fn test_entities_grouped_unique_in_first_seen_order() {
        let collector = StatisticsCollector::new(StatisticsBackend::Linguistic(Arc::new(RepeatingNlp)));
        let stats = collector.get_statistics("anything at all");
        assert_eq!(stats.entities["ORG"], vec!["Globex", "Initech"]);
        assert_eq!(stats.entities["GPE"], vec!["Paris"]);
        assert!(collector.has_nlp_model());
        assert!(StatisticsCollector::simple().extract_entities("Globex").is_empty());
        assert_eq!(StatisticsCollector::linguistic().backend_name(), "rule");
        assert_eq!(StatisticsCollector::simple().backend_name(), "simple");
    }

    #[test]
    fn test_segment_sentences() {
        let collector = StatisticsCollector::simple();
        assert_eq!(collector.segment_sentences("A. B! C"), vec!["A", "B", "C"]);
        assert_eq!(collector.preprocess_text("The quick fox"), "quick fox");
    }
}
