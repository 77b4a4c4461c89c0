// DocAnalyzer Data Models
// Analysis modes, per-analyzer outputs and the combined result

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============ Analysis Mode ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisMode {
    Summary,
    KeyPoints,
    RiskAnalysis,
    Opportunities,
    Sentiment,
    FullReport,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown analysis mode '{0}' (expected one of: Summary, Key Points, Risk Analysis, Opportunities, Sentiment, Full Report)")]
pub struct ModeParseError(pub String);

/// Which analyzers a mode runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalyzerSet {
    pub summary: bool,
    pub key_points: bool,
    pub risks: bool,
    pub opportunities: bool,
    pub sentiment: bool,
    pub statistics: bool,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 6] = [
        AnalysisMode::Summary,
        AnalysisMode::KeyPoints,
        AnalysisMode::RiskAnalysis,
        AnalysisMode::Opportunities,
        AnalysisMode::Sentiment,
        AnalysisMode::FullReport,
    ];

    /// Display label, as shown in the mode selector.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::KeyPoints => "Key Points",
            Self::RiskAnalysis => "Risk Analysis",
            Self::Opportunities => "Opportunities",
            Self::Sentiment => "Sentiment",
            Self::FullReport => "Full Report",
        }
    }

    pub fn analyzers(&self) -> AnalyzerSet {
        match self {
            Self::Summary => AnalyzerSet {
                summary: true,
                ..Default::default()
            },
            Self::KeyPoints => AnalyzerSet {
                key_points: true,
                ..Default::default()
            },
            Self::RiskAnalysis => AnalyzerSet {
                risks: true,
                opportunities: true,
                ..Default::default()
            },
            Self::Opportunities => AnalyzerSet {
                opportunities: true,
                ..Default::default()
            },
            Self::Sentiment => AnalyzerSet {
                sentiment: true,
                ..Default::default()
            },
            Self::FullReport => AnalyzerSet {
                summary: true,
                key_points: true,
                risks: true,
                opportunities: true,
                sentiment: true,
                statistics: true,
            },
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnalysisMode {
    type Err = ModeParseError;

    /// Accepts the display label or any spacing/case variant of it
    /// ("Key Points", "key_points", "keypoints", "full-report").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "summary" => Ok(Self::Summary),
            "keypoints" => Ok(Self::KeyPoints),
            "riskanalysis" | "risks" => Ok(Self::RiskAnalysis),
            "opportunities" => Ok(Self::Opportunities),
            "sentiment" => Ok(Self::Sentiment),
            "fullreport" | "full" => Ok(Self::FullReport),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

// ============ Sentiment ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
            Self::Neutral => "NEUTRAL",
        }
    }

    /// Parse a classifier label; tolerant of case and of `LABEL_0`/`LABEL_1` style names.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "POSITIVE" | "POS" | "LABEL_1" => Some(Self::Positive),
            "NEGATIVE" | "NEG" | "LABEL_0" => Some(Self::Negative),
            "NEUTRAL" | "NEU" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: SentimentLabel,
    pub score: f64,
    pub confidence: f64,
}

impl SentimentScore {
    /// Result for empty or lexicon-free text.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.5,
            confidence: 0.0,
        }
    }
}

// ============ Statistics ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DocumentStatistics {
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub reading_time_minutes: f64,
    pub avg_sentence_length: f64,
    /// Entity label -> surface strings, unique within a label in first-seen order.
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<String>>,
}

// ============ Combined Result ============

/// Output of one orchestrated analysis. A slot is `Some` exactly when the
/// requested mode runs the analyzer that fills it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_items: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decisions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opportunities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<DocumentStatistics>,
}

impl AnalysisResult {
    /// Names of the populated slots, in canonical order.
    pub fn slots(&self) -> Vec<&'static str> {
        let mut slots = Vec::new();
        if self.summary.is_some() {
            slots.push("summary");
        }
        if self.keywords.is_some() {
            slots.push("keywords");
        }
        if self.action_items.is_some() {
            slots.push("action_items");
        }
        if self.decisions.is_some() {
            slots.push("decisions");
        }
        if self.risks.is_some() {
            slots.push("risks");
        }
        if self.opportunities.is_some() {
            slots.push("opportunities");
        }
        if self.sentiment.is_some() {
            slots.push("sentiment");
        }
        if self.statistics.is_some() {
            slots.push("statistics");
        }
        slots
    }
}
