// Export Service
// JSON, CSV, flattened and Markdown renderings of an analysis result

use std::fmt::Write as _;

use serde_json::{Map, Value};
use tracing::error;

use crate::models::{AnalysisMode, AnalysisResult};

const CSV_LINE_END: &str = "\r\n";

/// Pretty JSON; `"{}"` if serialization fails.
pub fn to_json(result: &AnalysisResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|e| {
        error!("[EXPORT] JSON export failed: {}", e);
        "{}".to_string()
    })
}

/// Keyword, action item and risk sections, one value per row, each section
/// followed by an empty row. Absent slots are skipped.
pub fn to_csv(result: &AnalysisResult) -> String {
    let sections = [
        ("Keywords", &result.keywords),
        ("Action Items", &result.action_items),
        ("Risks", &result.risks),
    ];

    let mut out = String::new();
    for (title, values) in sections {
        let Some(values) = values else {
            continue;
        };
        out.push_str(&csv_field(title));
        out.push_str(CSV_LINE_END);
        for value in values {
            out.push_str(&csv_field(value));
            out.push_str(CSV_LINE_END);
        }
        out.push_str(CSV_LINE_END);
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Flatten to scalars, lists of strings and string-valued maps.
pub fn format_for_export(result: &AnalysisResult) -> Map<String, Value> {
    let value = match serde_json::to_value(result) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            error!("[EXPORT] Flattening failed: {}", e);
            Map::new()
        }
    };

    value
        .into_iter()
        .map(|(key, value)| {
            let flat = match value {
                Value::Array(items) => {
                    Value::Array(items.into_iter().map(|v| Value::String(stringify(v))).collect())
                }
                Value::Object(fields) => Value::Object(
                    fields
                        .into_iter()
                        .map(|(k, v)| (k, Value::String(stringify(v))))
                        .collect(),
                ),
                scalar => scalar,
            };
            (key, flat)
        })
        .collect()
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Plain-text report used by the command line front end.
pub fn to_markdown(result: &AnalysisResult, mode: AnalysisMode) -> String {
    let mut out = format!("# Document Analysis: {}\n", mode);

    if let Some(summary) = &result.summary {
        let _ = write!(out, "\n## Summary\n\n{}\n", summary);
    }
    if let Some(keywords) = &result.keywords {
        out.push_str("\n## Keywords\n\n");
        if keywords.is_empty() {
            out.push_str("_None found._\n");
        } else {
            let _ = writeln!(out, "{}", keywords.join(", "));
        }
    }
    for (title, items) in [
        ("Action Items", &result.action_items),
        ("Decisions", &result.decisions),
        ("Risks", &result.risks),
        ("Opportunities", &result.opportunities),
    ] {
        if let Some(items) = items {
            push_list(&mut out, title, items);
        }
    }
    if let Some(sentiment) = &result.sentiment {
        let _ = write!(
            out,
            "\n## Sentiment\n\n- Label: {}\n- Score: {:.2}\n- Confidence: {:.2}\n",
            sentiment.label, sentiment.score, sentiment.confidence
        );
    }
    if let Some(stats) = &result.statistics {
        let _ = write!(
            out,
            "\n## Statistics\n\n- Words: {}\n- Sentences: {}\n- Paragraphs: {}\n- Reading time: {} min\n- Average sentence length: {}\n",
            stats.word_count,
            stats.sentence_count,
            stats.paragraph_count,
            stats.reading_time_minutes,
            stats.avg_sentence_length
        );
        for (label, names) in &stats.entities {
            let _ = writeln!(out, "- {}: {}", label, names.join(", "));
        }
    }

    out
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    let _ = write!(out, "\n## {}\n\n", title);
    if items.is_empty() {
        out.push_str("_None found._\n");
        return;
    }
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}
