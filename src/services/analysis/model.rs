// Model Backends
// Learned-model capabilities (sentiment classification, abstractive summaries)
// behind async traits, with an LLM provider implementation

use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::SentimentLabel;
use crate::services::config_store::AppConfig;
use crate::services::providers::{
    get_api_key, parse_provider, resolve_custom_url, ChatPrompt, ProviderClient, ProviderError,
    ProviderKind,
};

const CLASSIFY_MAX_TOKENS: u32 = 64;
const SUMMARY_MIN_TOKENS: u32 = 64;

const SENTIMENT_SYSTEM_PROMPT: &str = r#"You are a sentiment classifier for corporate documents.
Classify the overall sentiment of the text the user sends.
Reply with JSON only, in exactly this shape:
{"label": "POSITIVE" | "NEGATIVE", "score": <confidence between 0 and 1>}"#;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Unparseable model output: {0}")]
    InvalidResponse(String),
    #[error("Model returned no output")]
    EmptyOutput,
}

/// One classifier verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    pub score: f64,
}

#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    fn model_id(&self) -> String;

    async fn classify(&self, text: &str) -> Result<Classification, ModelError>;
}

#[async_trait]
pub trait AbstractiveSummarizer: Send + Sync {
    fn model_id(&self) -> String;

    /// Summary of roughly `min_length..=max_length` output tokens.
    async fn summarize(
        &self,
        text: &str,
        min_length: usize,
        max_length: usize,
    ) -> Result<String, ModelError>;
}

/// Run a model call under a deadline; an elapsed deadline is a `ModelError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, ModelError>
where
    F: Future<Output = Result<T, ModelError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ModelError::Timeout(limit)),
    }
}

/// Chat-completion model used for both sentiment and summaries.
pub struct LlmModel {
    client: ProviderClient,
    kind: ProviderKind,
    model: String,
    api_key: String,
}

impl LlmModel {
    pub fn new(
        client: ProviderClient,
        kind: ProviderKind,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            kind,
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a model from a `name[:model]` selector, or from the first provider
    /// with a configured key when no selector is given. `None` when no key exists.
    pub fn resolve(selector: Option<&str>, proxy: Option<&str>) -> Option<Self> {
        let (kind, model) = match selector.map(str::trim).filter(|s| !s.is_empty()) {
            Some(selector) => {
                let spec = parse_provider(selector);
                let kind = match ProviderKind::from_name(&spec.name) {
                    Ok(kind) => kind,
                    Err(e) => {
                        warn!("[MODEL] {}", e);
                        return None;
                    }
                };
                (kind, spec.model)
            }
            None => {
                let kind = ProviderKind::PREFERENCE
                    .into_iter()
                    .find(|k| get_api_key(k.name()).is_some())?;
                (kind, String::new())
            }
        };

        let Some(api_key) = get_api_key(kind.name()) else {
            warn!("[MODEL] {} API key not configured", kind.name());
            return None;
        };

        let model = if model.trim().is_empty() {
            kind.default_model().to_string()
        } else {
            model
        };

        let mut client = match proxy {
            Some(url) => ProviderClient::with_proxy(url).unwrap_or_else(|e| {
                warn!("[MODEL] Invalid proxy '{}', connecting directly: {}", url, e);
                ProviderClient::new()
            }),
            None => ProviderClient::new(),
        };
        if let Some(url) = resolve_custom_url(kind.name()) {
            client = client.with_base_url(url);
        }

        info!("[MODEL] Using {}:{}", kind.name(), model);
        Some(Self::new(client, kind, model, api_key))
    }

    async fn complete(&self, prompt: &ChatPrompt<'_>) -> Result<String, ModelError> {
        let result = self
            .client
            .chat(self.kind, &self.model, &self.api_key, prompt)
            .await?;
        debug!(
            "[MODEL] {}:{} replied in {}ms ({} chars{})",
            self.kind.name(),
            self.model,
            result.latency_ms,
            result.content.chars().count(),
            if result.reasoning.is_some() { ", with reasoning" } else { "" }
        );
        Ok(result.content)
    }
}

#[async_trait]
impl SentimentClassifier for LlmModel {
    fn model_id(&self) -> String {
        format!("{}:{}", self.kind.name(), self.model)
    }

    async fn classify(&self, text: &str) -> Result<Classification, ModelError> {
        let prompt = ChatPrompt {
            system: SENTIMENT_SYSTEM_PROMPT,
            user: text,
            max_tokens: CLASSIFY_MAX_TOKENS,
            json_response: true,
        };
        let content = self.complete(&prompt).await?;
        parse_classification(&content)
    }
}

#[async_trait]
impl AbstractiveSummarizer for LlmModel {
    fn model_id(&self) -> String {
        format!("{}:{}", self.kind.name(), self.model)
    }

    async fn summarize(
        &self,
        text: &str,
        min_length: usize,
        max_length: usize,
    ) -> Result<String, ModelError> {
        let system = format!(
            "You summarize corporate documents. Write a single plain-text summary of \
             between {} and {} words using only facts stated in the text. \
             Do not add a title or preamble.",
            min_length, max_length
        );
        let max_tokens = u32::try_from(max_length.saturating_mul(2))
            .unwrap_or(u32::MAX)
            .max(SUMMARY_MIN_TOKENS);
        let prompt = ChatPrompt {
            system: &system,
            user: text,
            max_tokens,
            json_response: false,
        };

        let summary = self.complete(&prompt).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(ModelError::EmptyOutput);
        }
        Ok(summary.to_string())
    }
}

#[derive(Deserialize)]
struct ClassificationReply {
    label: String,
    #[serde(default = "default_score")]
    score: f64,
}

fn default_score() -> f64 {
    0.5
}

fn parse_classification(content: &str) -> Result<Classification, ModelError> {
    let json = extract_json(content)?;
    let reply: ClassificationReply = serde_json::from_str(json)
        .map_err(|e| ModelError::InvalidResponse(format!("JSON parse error: {}", e)))?;

    let label = SentimentLabel::parse(&reply.label)
        .ok_or_else(|| ModelError::InvalidResponse(format!("unknown label '{}'", reply.label)))?;
    if !reply.score.is_finite() {
        return Err(ModelError::InvalidResponse("score is not a number".to_string()));
    }

    Ok(Classification {
        label,
        score: reply.score.clamp(0.0, 1.0),
    })
}

/// Extract the JSON object from response content, tolerating surrounding prose.
fn extract_json(content: &str) -> Result<&str, ModelError> {
    let content = content.trim();
    match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&content[start..=end]),
        (Some(_), _) => Err(ModelError::InvalidResponse("Invalid JSON response".to_string())),
        _ => Err(ModelError::InvalidResponse("No JSON in response".to_string())),
    }
}

/// Model handles for the analyzers that have a learned path, resolved once.
#[derive(Clone, Default)]
pub struct ModelBackends {
    pub sentiment: Option<Arc<dyn SentimentClassifier>>,
    pub summarizer: Option<Arc<dyn AbstractiveSummarizer>>,
}

impl ModelBackends {
    pub fn rule_based() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AppConfig) -> Self {
        if !config.analysis.use_models {
            info!("[MODEL] Models disabled in config, all analyzers rule-based");
            return Self::default();
        }

        let proxy = config.proxy_url();
        let default_selector = config.default_provider.as_deref();

        let sentiment = LlmModel::resolve(
            config.analysis.sentiment_provider.as_deref().or(default_selector),
            proxy.as_deref(),
        )
        .map(|m| Arc::new(m) as Arc<dyn SentimentClassifier>);
        if sentiment.is_none() {
            warn!("[MODEL] No sentiment model available, using lexicon fallback");
        }

        let summarizer = LlmModel::resolve(
            config.analysis.summary_provider.as_deref().or(default_selector),
            proxy.as_deref(),
        )
        .map(|m| Arc::new(m) as Arc<dyn AbstractiveSummarizer>);
        if summarizer.is_none() {
            warn!("[MODEL] No summarization model available, using extractive fallback");
        }

        Self {
            sentiment,
            summarizer,
        }
    }
}
