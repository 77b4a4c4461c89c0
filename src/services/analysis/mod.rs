// Analysis Pipeline
// Five independent analyzers and the orchestrator that combines them per mode

pub mod keywords;
pub mod model;
pub mod nlp;
pub mod orchestrator;
pub mod risk;
pub mod sentiment;
pub mod statistics;
pub mod summarizer;

pub use keywords::KeywordExtractor;
pub use model::{
    AbstractiveSummarizer, Classification, LlmModel, ModelBackends, ModelError,
    SentimentClassifier,
};
pub use nlp::{Entity, EntityLabel, NlpBackend, RuleNlpBackend};
pub use orchestrator::AnalysisOrchestrator;
pub use risk::RiskOpportunityDetector;
pub use sentiment::{SentimentAnalyzer, SentimentBackend};
pub use statistics::{StatisticsBackend, StatisticsCollector};
pub use summarizer::{Summarizer, SummaryBackend};
