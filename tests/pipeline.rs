//! End-to-end pipeline tests
//!
//! Extract a document, run every analysis mode through the public API and
//! render the reports, all on the rule-based analyzers.

use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run};

use doc_analyzer_lib::services::analysis::StatisticsCollector;
use doc_analyzer_lib::services::export::{to_csv, to_json, to_markdown};
use doc_analyzer_lib::services::highlight::{extract_highlight_patterns, highlight_text};
use doc_analyzer_lib::services::{extract_text, normalize_text, ExtractionError};
use doc_analyzer_lib::{AnalysisMode, AnalysisOrchestrator, AnalysisResult, SentimentLabel};

const MINUTES: &[&str] = &[
    "Quarterly board meeting of Acme Corp.",
    "The board approved the acquisition of a regional distributor.",
    "Revenue growth was strong and customer satisfaction improved.",
    "There is a significant risk of failure to comply with the new export rules.",
    "The finance team must prepare the revised forecast before the next meeting.",
    "Expansion into new markets is a clear opportunity for growth.",
];

fn write_docx(dir: &std::path::Path, name: &str, paragraphs: &[&str]) -> std::path::PathBuf {
    let mut docx = Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
    }
    let mut cursor = Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();

    let path = dir.join(name);
    std::fs::write(&path, cursor.into_inner()).unwrap();
    path
}

fn minutes_text() -> String {
    MINUTES.join("\n")
}

fn expected_slots(mode: AnalysisMode) -> Vec<&'static str> {
    match mode {
        AnalysisMode::Summary => vec!["summary"],
        AnalysisMode::KeyPoints => vec!["keywords", "action_items", "decisions"],
        AnalysisMode::RiskAnalysis => vec!["risks", "opportunities"],
        AnalysisMode::Opportunities => vec!["opportunities"],
        AnalysisMode::Sentiment => vec!["sentiment"],
        AnalysisMode::FullReport => vec![
            "summary",
            "keywords",
            "action_items",
            "decisions",
            "risks",
            "opportunities",
            "sentiment",
            "statistics",
        ],
    }
}

#[tokio::test]
async fn test_docx_through_every_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_docx(dir.path(), "minutes.docx", MINUTES);

    let document = extract_text(&path).unwrap();
    let text = normalize_text(&document.text);
    assert_eq!(text, minutes_text());

    let orchestrator = AnalysisOrchestrator::rule_based();
    for mode in AnalysisMode::ALL {
        let result = orchestrator.analyze(&text, mode).await;
        assert_eq!(result.slots(), expected_slots(mode), "mode {}", mode);
    }
}

#[tokio::test]
async fn test_full_report_contents() {
    let text = minutes_text();
    let result = AnalysisOrchestrator::rule_based()
        .analyze(&text, AnalysisMode::FullReport)
        .await;

    let risks = result.risks.as_ref().unwrap();
    assert!(risks.iter().any(|r| r.contains("failure to comply")));

    let opportunities = result.opportunities.as_ref().unwrap();
    assert!(opportunities.iter().any(|o| o.contains("new markets")));

    let decisions = result.decisions.as_ref().unwrap();
    assert!(decisions.iter().any(|d| d.contains("acquisition")));

    let sentiment = result.sentiment.as_ref().unwrap();
    assert!((0.0..=1.0).contains(&sentiment.score));
    assert_eq!(sentiment.confidence, (sentiment.score - 0.5).abs() * 2.0);

    let stats = result.statistics.as_ref().unwrap();
    assert_eq!(stats.sentence_count, MINUTES.len());
    assert!(stats.word_count > 0);

    let summary = result.summary.as_ref().unwrap();
    assert!(!summary.is_empty());
}

#[tokio::test]
async fn test_full_report_is_superset_of_every_mode() {
    let text = minutes_text();
    let orchestrator = AnalysisOrchestrator::rule_based();
    let full = orchestrator.analyze(&text, AnalysisMode::FullReport).await;

    for mode in AnalysisMode::ALL {
        let partial = orchestrator.analyze(&text, mode).await;
        let restricted = AnalysisResult {
            summary: partial.summary.as_ref().and(full.summary.clone()),
            keywords: partial.keywords.as_ref().and(full.keywords.clone()),
            action_items: partial.action_items.as_ref().and(full.action_items.clone()),
            decisions: partial.decisions.as_ref().and(full.decisions.clone()),
            risks: partial.risks.as_ref().and(full.risks.clone()),
            opportunities: partial.opportunities.as_ref().and(full.opportunities.clone()),
            sentiment: partial.sentiment.as_ref().and(full.sentiment.clone()),
            statistics: partial.statistics.as_ref().and(full.statistics.clone()),
        };
        assert_eq!(partial, restricted, "mode {}", mode);
    }
}

#[tokio::test]
async fn test_sentiment_mode_only_fills_sentiment() {
    let result = AnalysisOrchestrator::rule_based()
        .analyze(
            "Excellent results, strong growth and great success.",
            AnalysisMode::Sentiment,
        )
        .await;

    assert_eq!(result.slots(), vec!["sentiment"]);
    let sentiment = result.sentiment.unwrap();
    assert_eq!(sentiment.label, SentimentLabel::Positive);
    assert_eq!(sentiment.score, 1.0);
    assert_eq!(sentiment.confidence, 1.0);
}

#[tokio::test]
async fn test_shared_orchestrator_serves_concurrent_requests() {
    let orchestrator = AnalysisOrchestrator::rule_based().shared();
    let text = minutes_text();
    let baseline = orchestrator.analyze(&text, AnalysisMode::FullReport).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let orchestrator = orchestrator.clone();
            let text = text.clone();
            tokio::spawn(async move { orchestrator.analyze(&text, AnalysisMode::FullReport).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), baseline);
    }
}

#[test]
fn test_statistics_counts() {
    let stats = StatisticsCollector::linguistic()
        .get_statistics("This is a test sentence. This is another test sentence.");
    assert_eq!(stats.word_count, 10);
    assert_eq!(stats.sentence_count, 2);
    assert_eq!(stats.paragraph_count, 1);
    assert_eq!(stats.avg_sentence_length, 5.0);

    let empty = StatisticsCollector::linguistic().get_statistics("   ");
    assert_eq!(empty.word_count, 0);
    assert_eq!(empty.sentence_count, 0);
    assert_eq!(empty.reading_time_minutes, 0.0);
    assert!(empty.entities.is_empty());
}

#[test]
fn test_extraction_failures_stop_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();

    let blank = write_docx(dir.path(), "blank.docx", &["  "]);
    assert!(matches!(extract_text(&blank), Err(ExtractionError::NoText(_))));

    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "plain text").unwrap();
    assert!(matches!(
        extract_text(&notes),
        Err(ExtractionError::UnsupportedFormat(_))
    ));
}

#[tokio::test]
async fn test_reports_render() {
    let text = minutes_text();
    let result = AnalysisOrchestrator::rule_based()
        .analyze(&text, AnalysisMode::FullReport)
        .await;

    let json: serde_json::Value = serde_json::from_str(&to_json(&result)).unwrap();
    assert!(json["risks"].is_array());
    assert!(json["statistics"]["word_count"].is_u64());

    let csv = to_csv(&result);
    assert!(csv.starts_with("Keywords\r\n"));
    assert!(csv.contains("\r\nRisks\r\n"));

    let markdown = to_markdown(&result, AnalysisMode::FullReport);
    assert!(markdown.starts_with("# Document Analysis: Full Report\n"));
    assert!(markdown.contains("## Opportunities"));

    let html = highlight_text(&text, &extract_highlight_patterns(&result));
    assert!(html.contains("background-color: #ffcccc"));
}
