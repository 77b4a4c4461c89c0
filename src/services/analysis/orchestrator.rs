// Analysis Orchestrator
// Runs the analyzer subset a mode asks for and assembles one result

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::info;
use uuid::Uuid;

use crate::models::{AnalysisMode, AnalysisResult};
use crate::services::config_store::{AnalysisConfig, AppConfig};
use crate::services::text_processor::char_len;

use super::keywords::KeywordExtractor;
use super::model::ModelBackends;
use super::risk::RiskOpportunityDetector;
use super::sentiment::{SentimentAnalyzer, SentimentBackend};
use super::statistics::StatisticsCollector;
use super::summarizer::{Summarizer, SummaryBackend, DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH};

/// Immutable after construction; share it behind an `Arc` to serve many requests.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    statistics: StatisticsCollector,
    keywords: KeywordExtractor,
    detector: RiskOpportunityDetector,
    sentiment: SentimentAnalyzer,
    summarizer: Summarizer,
    summary_max_length: usize,
    summary_min_length: usize,
}

impl AnalysisOrchestrator {
    pub fn new(
        statistics: StatisticsCollector,
        keywords: KeywordExtractor,
        detector: RiskOpportunityDetector,
        sentiment: SentimentAnalyzer,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            statistics,
            keywords,
            detector,
            sentiment,
            summarizer,
            summary_max_length: DEFAULT_MAX_LENGTH,
            summary_min_length: DEFAULT_MIN_LENGTH,
        }
    }

    pub fn with_summary_lengths(mut self, max_length: usize, min_length: usize) -> Self {
        self.summary_max_length = max_length.max(1);
        self.summary_min_length = min_length.min(self.summary_max_length);
        self
    }

    /// Every analyzer on its rule-based path.
    pub fn rule_based() -> Self {
        Self::with_backends(&AnalysisConfig::default(), ModelBackends::rule_based())
    }

    /// Resolve model backends from the config (API keys, provider selectors).
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_backends(&config.analysis, ModelBackends::from_config(config))
    }

    pub fn with_backends(settings: &AnalysisConfig, backends: ModelBackends) -> Self {
        let timeout = Duration::from_secs(settings.model_timeout_secs);

        let sentiment = match backends.sentiment {
            Some(model) => SentimentAnalyzer::new(SentimentBackend::ModelBacked(model), timeout),
            None => SentimentAnalyzer::rule_based(),
        };
        let summarizer = match backends.summarizer {
            Some(model) => Summarizer::new(SummaryBackend::ModelBacked(model), timeout),
            None => Summarizer::extractive(),
        }
        .with_num_sentences(settings.extractive_sentences);

        let orchestrator = Self::new(
            StatisticsCollector::linguistic(),
            KeywordExtractor::new(settings.keyword_top_n),
            RiskOpportunityDetector::new(),
            sentiment,
            summarizer,
        )
        .with_summary_lengths(settings.summary_max_length, settings.summary_min_length);

        info!("[ORCHESTRATOR] Initialized ({})", orchestrator.backend_summary());
        orchestrator
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// One-line description of which path each analyzer takes.
    pub fn backend_summary(&self) -> String {
        let path = |fallback: bool| if fallback { "rule-based" } else { "model" };
        format!(
            "summary={} sentiment={} statistics={} keywords=top{}",
            path(self.summarizer.uses_fallback()),
            path(self.sentiment.uses_fallback()),
            self.statistics.backend_name(),
            self.keywords.top_n()
        )
    }

    /// Run exactly the analyzers `mode` calls for. Analyzers never fail; a
    /// model problem only moves that analyzer onto its fallback path.
    pub async fn analyze(&self, text: &str, mode: AnalysisMode) -> AnalysisResult {
        let run_id = Uuid::new_v4();
        let start = Instant::now();
        let plan = mode.analyzers();
        info!(
            "[ORCHESTRATOR] run={} mode={} chars={}",
            run_id,
            mode,
            char_len(text)
        );

        let summary = async {
            if plan.summary {
                Some(
                    self.summarizer
                        .summarize(text, self.summary_max_length, self.summary_min_length)
                        .await,
                )
            } else {
                None
            }
        };
        let sentiment = async {
            if plan.sentiment {
                Some(self.sentiment.analyze(text).await)
            } else {
                None
            }
        };
        let (summary, sentiment) = tokio::join!(summary, sentiment);

        let mut result = AnalysisResult {
            summary,
            sentiment,
            ..Default::default()
        };

        if plan.key_points {
            result.keywords = Some(self.keywords.keywords(text));
            result.action_items = Some(self.keywords.extract_action_items(text));
            result.decisions = Some(self.keywords.extract_decisions(text));
        }
        if plan.risks {
            result.risks = Some(self.detector.detect_risks(text));
        }
        if plan.opportunities {
            result.opportunities = Some(self.detector.detect_opportunities(text));
        }
        if plan.statistics {
            result.statistics = Some(self.statistics.get_statistics(text));
        }

        info!(
            "[ORCHESTRATOR] run={} done in {}ms slots={:?}",
            run_id,
            start.elapsed().as_millis(),
            result.slots()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::model::{
        AbstractiveSummarizer, Classification, ModelError, SentimentClassifier,
    };
    use async_trait::async_trait;
    use std::collections::HashSet;

    const MEMO: &str = "The board approved the new supplier contract. \
        Revenue growth was strong this quarter and margins improved. \
        There is a significant risk of failure to comply with regulations. \
        The team must review the compliance checklist by Friday. \
        Expansion into Asia is an opportunity for growth in new markets.";

    struct BrokenModel;

    #[async_trait]
    impl SentimentClassifier for BrokenModel {
        fn model_id(&self) -> String {
            "mock:broken".to_string()
        }

        async fn classify(&self, _text: &str) -> Result<Classification, ModelError> {
            Err(ModelError::EmptyOutput)
        }
    }

    #[async_trait]
    impl AbstractiveSummarizer for BrokenModel {
        fn model_id(&self) -> String {
            "mock:broken".to_string()
        }

        async fn summarize(&self, _: &str, _: usize, _: usize) -> Result<String, ModelError> {
            Err(ModelError::EmptyOutput)
        }
    }

    fn keys(result: &AnalysisResult) -> HashSet<&'static str> {
        result.slots().into_iter().collect()
    }

    #[tokio::test]
    async fn test_sentiment_mode_has_only_sentiment() {
        let orchestrator = AnalysisOrchestrator::rule_based();
        let result = orchestrator.analyze(MEMO, AnalysisMode::Sentiment).await;
        assert_eq!(result.slots(), vec!["sentiment"]);
    }

    #[tokio::test]
    async fn test_mode_slot_table() {
        let orchestrator = AnalysisOrchestrator::rule_based();
        let expect = [
            (AnalysisMode::Summary, vec!["summary"]),
            (AnalysisMode::KeyPoints, vec!["keywords", "action_items", "decisions"]),
            (AnalysisMode::RiskAnalysis, vec!["risks", "opportunities"]),
            (AnalysisMode::Opportunities, vec!["opportunities"]),
            (AnalysisMode::Sentiment, vec!["sentiment"]),
        ];
        for (mode, slots) in expect {
            let result = orchestrator.analyze(MEMO, mode).await;
            assert_eq!(result.slots(), slots, "mode {}", mode);
        }
    }

    #[tokio::test]
    async fn test_full_report_is_superset() {
        let orchestrator = AnalysisOrchestrator::rule_based();
        let full = keys(&orchestrator.analyze(MEMO, AnalysisMode::FullReport).await);
        assert!(full.contains("statistics"));
        for mode in AnalysisMode::ALL {
            let other = keys(&orchestrator.analyze(MEMO, mode).await);
            assert!(other.is_subset(&full), "mode {}", mode);
        }
    }

    #[tokio::test]
    async fn test_broken_models_do_not_abort_report() {
        let broken = Arc::new(BrokenModel);
        let backends = ModelBackends {
            sentiment: Some(broken.clone()),
            summarizer: Some(broken),
        };
        let orchestrator = AnalysisOrchestrator::with_backends(&AnalysisConfig::default(), backends);
        assert!(orchestrator.backend_summary().contains("sentiment=model"));

        let result = orchestrator.analyze(MEMO, AnalysisMode::FullReport).await;
        let rule = AnalysisOrchestrator::rule_based()
            .analyze(MEMO, AnalysisMode::FullReport)
            .await;
        assert_eq!(result.summary, rule.summary);
        assert_eq!(result.sentiment, rule.sentiment);
        assert_eq!(result.slots().len(), 8);
    }

    #[tokio::test]
    async fn test_fallback_paths_are_idempotent() {
        let orchestrator = AnalysisOrchestrator::rule_based();
        let first = orchestrator.analyze(MEMO, AnalysisMode::KeyPoints).await;
        let second = orchestrator.analyze(MEMO, AnalysisMode::KeyPoints).await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_summary_lengths_are_clamped() {
        let orchestrator = AnalysisOrchestrator::rule_based().with_summary_lengths(20, 80);
        assert_eq!(orchestrator.summary_max_length, 20);
        assert_eq!(orchestrator.summary_min_length, 20);
    }
}
