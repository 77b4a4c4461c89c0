// Summarizer
// Abstractive model path with chunking, extractive frequency fallback

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::services::text_processor::{char_len, chunk_by_sentences, split_sentences};

use super::model::{with_timeout, AbstractiveSummarizer, ModelError};

pub const NO_TEXT_MESSAGE: &str = "No text available for summarization.";
pub const DEFAULT_MAX_LENGTH: usize = 150;
pub const DEFAULT_MIN_LENGTH: usize = 30;
pub const DEFAULT_NUM_SENTENCES: usize = 3;

/// Texts at or below this length go straight to the extractive path.
const MIN_MODEL_CHARS: usize = 100;
/// Longest text summarized in one model call.
const SINGLE_PASS_MAX_CHARS: usize = 1024;
const CHUNK_BUDGET: usize = 1000;
const MIN_CHUNK_CHARS: usize = 50;
/// Words at or below this length are left out of the frequency table.
const MIN_SCORED_WORD_CHARS: usize = 2;

#[derive(Clone)]
pub enum SummaryBackend {
    ModelBacked(Arc<dyn AbstractiveSummarizer>),
    Extractive,
}

#[derive(Clone)]
pub struct Summarizer {
    backend: SummaryBackend,
    timeout: Duration,
    num_sentences: usize,
}

impl Summarizer {
    pub fn new(backend: SummaryBackend, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            num_sentences: DEFAULT_NUM_SENTENCES,
        }
    }

    pub fn extractive() -> Self {
        Self::new(SummaryBackend::Extractive, Duration::ZERO)
    }

    /// Sentences kept by the extractive path (at least one).
    pub fn with_num_sentences(mut self, num_sentences: usize) -> Self {
        self.num_sentences = num_sentences.max(1);
        self
    }

    pub fn uses_fallback(&self) -> bool {
        matches!(self.backend, SummaryBackend::Extractive)
    }

    pub async fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> String {
        if text.trim().is_empty() {
            return NO_TEXT_MESSAGE.to_string();
        }

        let model = match &self.backend {
            SummaryBackend::ModelBacked(model) if char_len(text) > MIN_MODEL_CHARS => model,
            _ => return extractive_summarize(text, self.num_sentences),
        };

        match self
            .summarize_with_model(model.as_ref(), text, max_length, min_length)
            .await
        {
            Ok(Some(summary)) => summary,
            Ok(None) => {
                debug!("[SUMMARIZER] No chunk long enough to summarize, using extractive fallback");
                extractive_summarize(text, self.num_sentences)
            }
            Err(e) => {
                warn!(
                    "[SUMMARIZER] Model {} failed, using extractive fallback: {}",
                    model.model_id(),
                    e
                );
                extractive_summarize(text, self.num_sentences)
            }
        }
    }

    async fn summarize_with_model(
        &self,
        model: &dyn AbstractiveSummarizer,
        text: &str,
        max_length: usize,
        min_length: usize,
    ) -> Result<Option<String>, ModelError> {
        if char_len(text) <= SINGLE_PASS_MAX_CHARS {
            let summary =
                with_timeout(self.timeout, model.summarize(text, min_length, max_length)).await?;
            return Ok(Some(summary));
        }

        let chunks = chunk_by_sentences(text, CHUNK_BUDGET);
        let mut summaries = Vec::new();
        for chunk in chunks.iter().filter(|c| char_len(c) > MIN_CHUNK_CHARS) {
            summaries
                .push(with_timeout(self.timeout, model.summarize(chunk, min_length, max_length)).await?);
        }

        debug!(
            "[SUMMARIZER] Summarized {} of {} chunks",
            summaries.len(),
            chunks.len()
        );
        Ok((!summaries.is_empty()).then(|| summaries.join(" ")))
    }
}

/// Frequency-scored sentence selection.
///
/// With `num_sentences` or fewer sentences the text is returned re-joined.
/// Otherwise each sentence scores the summed document frequency of its words
/// (longer than two characters) divided by its word count; the best
/// `num_sentences` are kept, earlier sentences winning ties, and emitted in
/// document order.
pub fn extractive_summarize(text: &str, num_sentences: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return NO_TEXT_MESSAGE.to_string();
    }
    if sentences.len() <= num_sentences {
        return format!("{}.", sentences.join(". "));
    }

    let lowered: Vec<String> = sentences.iter().map(|s| s.to_lowercase()).collect();

    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for sentence in &lowered {
        for word in sentence.split_whitespace() {
            if char_len(word) > MIN_SCORED_WORD_CHARS {
                *frequency.entry(word).or_insert(0) += 1;
            }
        }
    }

    let mut scored: Vec<(usize, f64)> = lowered
        .iter()
        .enumerate()
        .map(|(idx, sentence)| {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            let total: usize = words
                .iter()
                .filter(|w| char_len(w) > MIN_SCORED_WORD_CHARS)
                .map(|w| frequency.get(w).copied().unwrap_or(0))
                .sum();
            (idx, total as f64 / words.len().max(1) as f64)
        })
        .collect();

    // Stable: equal scores keep document order.
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(num_sentences);
    scored.sort_by_key(|(idx, _)| *idx);

    let picked: Vec<&str> = scored.iter().map(|(idx, _)| sentences[*idx]).collect();
    format!("{}.", picked.join(". "))
}
