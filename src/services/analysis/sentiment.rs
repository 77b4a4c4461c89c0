// Sentiment Analyzer
// Classifier path with long-text chunk voting, lexicon fallback

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::models::{SentimentLabel, SentimentScore};
use crate::services::text_processor::{char_len, chunk_by_sentences, truncate_chars};

use super::model::{with_timeout, Classification, ModelError, SentimentClassifier};

/// Classifier input window, in characters.
pub const MODEL_MAX_CHARS: usize = 512;
const CHUNK_BUDGET: usize = 500;
/// Texts and chunks at or below this length never reach the classifier.
const MIN_MODEL_CHARS: usize = 10;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "positive", "success", "profit", "growth", "improve", "benefit",
    "opportunity", "strong", "better", "best", "win", "advantage", "achievement", "progress",
    "successful", "outstanding",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "negative", "loss", "decline", "risk", "problem", "issue", "challenge", "weak",
    "worse", "worst", "fail", "disadvantage", "threat", "difficult", "concern", "weakness",
    "failure",
];

#[derive(Clone)]
pub enum SentimentBackend {
    ModelBacked(Arc<dyn SentimentClassifier>),
    RuleBased,
}

#[derive(Clone)]
pub struct SentimentAnalyzer {
    backend: SentimentBackend,
    timeout: Duration,
}

impl SentimentAnalyzer {
    pub fn new(backend: SentimentBackend, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn rule_based() -> Self {
        Self::new(SentimentBackend::RuleBased, Duration::ZERO)
    }

    pub fn uses_fallback(&self) -> bool {
        matches!(self.backend, SentimentBackend::RuleBased)
    }

    pub async fn analyze(&self, text: &str) -> SentimentScore {
        if text.trim().is_empty() {
            return SentimentScore::neutral();
        }

        let model = match &self.backend {
            SentimentBackend::ModelBacked(model) if char_len(text) > MIN_MODEL_CHARS => model,
            _ => return rule_based_sentiment(text),
        };

        match self.classify_with_model(model.as_ref(), text).await {
            Ok(Some(score)) => score,
            Ok(None) => {
                debug!("[SENTIMENT] No chunk reached the classifier, using lexicon fallback");
                rule_based_sentiment(text)
            }
            Err(e) => {
                warn!(
                    "[SENTIMENT] Model {} failed, using lexicon fallback: {}",
                    model.model_id(),
                    e
                );
                rule_based_sentiment(text)
            }
        }
    }

    /// `Ok(None)` when no chunk was long enough to classify.
    async fn classify_with_model(
        &self,
        model: &dyn SentimentClassifier,
        text: &str,
    ) -> Result<Option<SentimentScore>, ModelError> {
        if char_len(text) <= MODEL_MAX_CHARS {
            let verdict = self.classify(model, text).await?;
            return Ok(Some(SentimentScore {
                label: verdict.label,
                score: verdict.score,
                confidence: verdict.score,
            }));
        }

        let chunks = chunk_by_sentences(text, CHUNK_BUDGET);
        let mut verdicts = Vec::with_capacity(chunks.len());
        for chunk in chunks.iter().filter(|c| char_len(c) > MIN_MODEL_CHARS) {
            verdicts.push(self.classify(model, chunk).await?);
        }

        if verdicts.is_empty() {
            return Ok(None);
        }

        debug!("[SENTIMENT] Classified {} chunks", verdicts.len());
        Ok(Some(aggregate_chunks(&verdicts)))
    }

    async fn classify(
        &self,
        model: &dyn SentimentClassifier,
        text: &str,
    ) -> Result<Classification, ModelError> {
        with_timeout(self.timeout, model.classify(truncate_chars(text, MODEL_MAX_CHARS))).await
    }
}

/// Majority vote (strictly more than half POSITIVE) with the mean chunk score.
fn aggregate_chunks(verdicts: &[Classification]) -> SentimentScore {
    let total = verdicts.len() as f64;
    let positive = verdicts
        .iter()
        .filter(|v| v.label == SentimentLabel::Positive)
        .count() as f64;
    let mean = verdicts.iter().map(|v| v.score).sum::<f64>() / total;

    let label = if positive > total / 2.0 {
        SentimentLabel::Positive
    } else {
        SentimentLabel::Negative
    };

    SentimentScore {
        label,
        score: mean,
        confidence: mean,
    }
}

/// Lexicon scoring over whitespace-separated lowercase tokens. Tokens carrying
/// punctuation ("good.") do not match.
pub fn rule_based_sentiment(text: &str) -> SentimentScore {
    let lower = text.to_lowercase();
    let (mut positive, mut negative) = (0usize, 0usize);
    for word in lower.split_whitespace() {
        if POSITIVE_WORDS.contains(&word) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&word) {
            negative += 1;
        }
    }

    let total = positive + negative;
    if total == 0 {
        return SentimentScore::neutral();
    }

    let score = positive as f64 / total as f64;
    let label = if score > 0.6 {
        SentimentLabel::Positive
    } else if score < 0.4 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    SentimentScore {
        label,
        score,
        confidence: (score - 0.5).abs() * 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// POSITIVE 0.9 for text mentioning "great", otherwise NEGATIVE 0.6.
    #[derive(Default)]
    struct KeywordClassifier {
        calls: AtomicUsize,
        fail: bool,
        /// 1-based call number that errors; earlier calls succeed.
        fail_on_call: Option<usize>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl SentimentClassifier for KeywordClassifier {
        fn model_id(&self) -> String {
            "mock:keyword".to_string()
        }

        async fn classify(&self, text: &str) -> Result<Classification, ModelError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            assert!(char_len(text) <= MODEL_MAX_CHARS);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail || self.fail_on_call == Some(call) {
                return Err(ModelError::EmptyOutput);
            }
            Ok(if text.contains("great") {
                Classification {
                    label: SentimentLabel::Positive,
                    score: 0.9,
                }
            } else {
                Classification {
                    label: SentimentLabel::Negative,
                    score: 0.6,
                }
            })
        }
    }

    fn model_backed(model: Arc<KeywordClassifier>, timeout: Duration) -> SentimentAnalyzer {
        SentimentAnalyzer::new(SentimentBackend::ModelBacked(model), timeout)
    }

    #[test]
    fn test_rule_based_positive() {
        let score = rule_based_sentiment("good good good bad");
        assert_eq!(score.label, SentimentLabel::Positive);
        assert_eq!(score.score, 0.75);
        assert_eq!(score.confidence, 0.5);
    }

    #[test]
    fn test_rule_based_negative_and_neutral() {
        let score = rule_based_sentiment("Bad loss but good");
        assert_eq!(score.label, SentimentLabel::Negative);
        assert!((score.score - 1.0 / 3.0).abs() < 1e-9);
        assert!((score.confidence - 1.0 / 3.0).abs() < 1e-9);

        let score = rule_based_sentiment("good bad");
        assert_eq!(score.label, SentimentLabel::Neutral);
        assert_eq!(score.confidence, 0.0);

        // Punctuation stays attached to the token.
        assert_eq!(rule_based_sentiment("good. bad,"), SentimentScore::neutral());
    }

    #[tokio::test]
    async fn test_empty_text_is_neutral() {
        let analyzer = SentimentAnalyzer::rule_based();
        assert_eq!(analyzer.analyze("   ").await, SentimentScore::neutral());
        assert!(analyzer.uses_fallback());
    }

    #[tokio::test]
    async fn test_short_text_uses_classifier_directly() {
        let model = Arc::new(KeywordClassifier::default());
        let analyzer = model_backed(model.clone(), Duration::from_secs(5));

        let score = analyzer.analyze("What a great quarter for us").await;
        assert_eq!(score.label, SentimentLabel::Positive);
        assert_eq!(score.score, 0.9);
        assert_eq!(score.confidence, 0.9);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert!(!analyzer.uses_fallback());
    }

    #[tokio::test]
    async fn test_tiny_text_skips_classifier() {
        let model = Arc::new(KeywordClassifier::default());
        let analyzer = model_backed(model.clone(), Duration::from_secs(5));

        let score = analyzer.analyze("good").await;
        assert_eq!(score, rule_based_sentiment("good"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_long_text_majority_vote() {
        let model = Arc::new(KeywordClassifier::default());
        let analyzer = model_backed(model.clone(), Duration::from_secs(5));

        let positive = format!("{}great", "word ".repeat(59));
        let negative = "word ".repeat(60);
        let text = [positive.as_str(), positive.as_str(), negative.as_str()].join(".");

        let score = analyzer.analyze(&text).await;
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        assert_eq!(score.label, SentimentLabel::Positive);
        assert!((score.score - 0.8).abs() < 1e-9);
        assert_eq!(score.score, score.confidence);
    }

    #[test]
    fn test_half_positive_is_negative() {
        let verdicts = [
            Classification {
                label: SentimentLabel::Positive,
                score: 0.8,
            },
            Classification {
                label: SentimentLabel::Negative,
                score: 0.6,
            },
        ];
        let score = aggregate_chunks(&verdicts);
        assert_eq!(score.label, SentimentLabel::Negative);
        assert!((score.score - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back() {
        let model = Arc::new(KeywordClassifier {
            fail: true,
            ..Default::default()
        });
        let analyzer = model_backed(model, Duration::from_secs(5));
        let text = "Strong growth and a great outlook despite one risk";
        assert_eq!(analyzer.analyze(text).await, rule_based_sentiment(text));
    }

    #[tokio::test]
    async fn test_model_timeout_falls_back() {
        let model = Arc::new(KeywordClassifier {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let analyzer = model_backed(model, Duration::from_millis(20));
        let text = "Strong growth and a great outlook despite one risk";
        assert_eq!(analyzer.analyze(text).await, rule_based_sentiment(text));
    }

    #[tokio::test]
    async fn test_chunk_failure_discards_earlier_verdicts() {
        let model = Arc::new(KeywordClassifier {
            fail_on_call: Some(2),
            ..Default::default()
        });
        let analyzer = model_backed(model.clone(), Duration::from_secs(5));

        let positive = format!("{}great", "word ".repeat(59));
        let negative = "word ".repeat(60);
        let text = [positive.as_str(), positive.as_str(), negative.as_str()].join(".");
        assert!(char_len(&text) > MODEL_MAX_CHARS);

        let score = analyzer.analyze(&text).await;
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
        assert_eq!(score, rule_based_sentiment(&text));
        // "great" only appears glued to a period, so the lexicon sees nothing.
        assert_eq!(score, SentimentScore::neutral());
    }
}
