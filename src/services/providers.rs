// AI Provider Service
// OpenAI-compatible chat completions (OpenAI, DeepSeek, GLM) and Anthropic messages

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::config_store::ConfigStore;

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEEPSEEK_DEFAULT_URL: &str = "https://api.deepseek.com/chat/completions";
const GLM_DEFAULT_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
const ANTHROPIC_DEFAULT_URL: &str = "https://api.anthropic.com/v1/messages";

pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
const CLIENT_TIMEOUT_SECS: u64 = 80;

static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("json object pattern should compile"));

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Wire protocol family of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    DeepSeek,
    Glm,
    Anthropic,
}

impl ProviderKind {
    /// Auto-detection order when no provider is requested explicitly.
    pub const PREFERENCE: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::DeepSeek,
        ProviderKind::Glm,
    ];

    pub fn from_name(name: &str) -> Result<Self, ProviderError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "deepseek" => Ok(Self::DeepSeek),
            "glm" => Ok(Self::Glm),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Glm => "glm",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_DEFAULT_MODEL,
            Self::DeepSeek => "deepseek-chat",
            Self::Glm => "glm-4-flash",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    fn default_url(&self) -> String {
        let (var, fallback) = match self {
            Self::OpenAi => ("OPENAI_API_URL", OPENAI_DEFAULT_URL),
            Self::DeepSeek => ("DEEPSEEK_API_URL", DEEPSEEK_DEFAULT_URL),
            Self::Glm => ("GLM_API_URL", GLM_DEFAULT_URL),
            Self::Anthropic => ("ANTHROPIC_API_URL", ANTHROPIC_DEFAULT_URL),
        };
        env::var(var).unwrap_or_else(|_| fallback.to_string())
    }

    fn env_keys(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["OPENAI_API_KEY", "DOCANALYZER_OPENAI_API_KEY"],
            Self::DeepSeek => &["DEEPSEEK_API_KEY", "DOCANALYZER_DEEPSEEK_API_KEY"],
            Self::Glm => &["GLM_API_KEY", "DOCANALYZER_GLM_API_KEY"],
            Self::Anthropic => &["ANTHROPIC_API_KEY", "DOCANALYZER_ANTHROPIC_API_KEY"],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub model: String,
}

/// Parse `name[:model]`.
pub fn parse_provider(spec: &str) -> ProviderSpec {
    match spec.split_once(':') {
        Some((name, model)) => ProviderSpec {
            name: name.to_string(),
            model: model.to_string(),
        },
        None => ProviderSpec {
            name: spec.to_string(),
            model: String::new(),
        },
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
    reasoning_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
    reasoning_content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub latency_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// One chat turn sent to a provider.
#[derive(Debug, Clone)]
pub struct ChatPrompt<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub max_tokens: u32,
    pub json_response: bool,
}

pub struct ProviderClient {
    client: Client,
    base_url_override: Option<String>,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url_override: None,
        }
    }

    pub fn with_proxy(proxy_url: &str) -> Result<Self, ProviderError> {
        let proxy = reqwest::Proxy::all(proxy_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .proxy(proxy)
            .build()?;

        Ok(Self {
            client,
            base_url_override: None,
        })
    }

    /// Send every request to `url` instead of the provider default.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url_override = Some(url.into());
        self
    }

    fn url_for(&self, kind: ProviderKind) -> String {
        self.base_url_override
            .clone()
            .unwrap_or_else(|| kind.default_url())
    }

    pub async fn chat(
        &self,
        kind: ProviderKind,
        model: &str,
        api_key: &str,
        prompt: &ChatPrompt<'_>,
    ) -> Result<ChatResult, ProviderError> {
        let url = self.url_for(kind);
        match kind {
            ProviderKind::Anthropic => self.call_anthropic_api(&url, model, api_key, prompt).await,
            // DeepSeek and GLM honour json_object; plain OpenAI models do too.
            _ => self.call_chat_api(&url, model, api_key, prompt).await,
        }
    }

    async fn call_anthropic_api(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        prompt: &ChatPrompt<'_>,
    ) -> Result<ChatResult, ProviderError> {
        #[derive(Serialize)]
        struct AnthropicRequest {
            model: String,
            max_tokens: u32,
            temperature: f64,
            #[serde(skip_serializing_if = "String::is_empty")]
            system: String,
            messages: Vec<ChatMessage>,
        }

        #[derive(Deserialize)]
        struct AnthropicResponse {
            content: Option<Vec<AnthropicContent>>,
        }

        #[derive(Deserialize)]
        struct AnthropicContent {
            text: Option<String>,
        }

        let request = AnthropicRequest {
            model: model.to_string(),
            max_tokens: prompt.max_tokens,
            temperature: 0.0,
            system: prompt.system.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.user.to_string(),
            }],
        };

        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data
            .content
            .and_then(|c| c.into_iter().find_map(|c| c.text))
            .ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult {
            content,
            latency_ms,
            reasoning: None,
        })
    }

    async fn call_chat_api(
        &self,
        url: &str,
        model: &str,
        api_key: &str,
        prompt: &ChatPrompt<'_>,
    ) -> Result<ChatResult, ProviderError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.to_string(),
                },
            ],
            max_tokens: prompt.max_tokens,
            temperature: 0.0,
            response_format: prompt.json_response.then(|| ResponseFormat {
                r#type: "json_object".to_string(),
            }),
        };

        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let message = data
            .choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref());

        let mut content = message
            .and_then(|m| m.content.clone())
            .filter(|c| !c.trim().is_empty());

        let reasoning = message
            .and_then(|m| m.reasoning_content.clone())
            .or(data.reasoning_content);

        // Reasoning models sometimes leave content empty and put the JSON in the trace.
        if content.is_none() && prompt.json_response {
            if let Some(ref r) = reasoning {
                content = JSON_OBJECT_RE.find(r).map(|m| m.as_str().to_string());
            }
        }

        let content = content.ok_or(ProviderError::MissingContent)?;

        Ok(ChatResult {
            content,
            latency_ms,
            reasoning,
        })
    }
}

/// Get API key from environment or config file
pub fn get_api_key(provider: &str) -> Option<String> {
    let kind = ProviderKind::from_name(provider).ok()?;

    for key in kind.env_keys() {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    ConfigStore::open_default()
        .and_then(|store| store.get_api_key(kind.name()).ok().flatten())
        .filter(|k| !k.trim().is_empty())
}

/// Custom base URL for a provider from the config file, if any.
pub fn resolve_custom_url(provider: &str) -> Option<String> {
    let store = ConfigStore::open_default()?;
    store.get_provider_url(provider).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        let spec = parse_provider("glm:glm-4-plus");
        assert_eq!(spec.name, "glm");
        assert_eq!(spec.model, "glm-4-plus");

        let spec2 = parse_provider("deepseek");
        assert_eq!(spec2.name, "deepseek");
        assert_eq!(spec2.model, "");
    }

    #[test]
    fn test_provider_kind_names() {
        assert_eq!(ProviderKind::from_name("Claude").unwrap(), ProviderKind::Anthropic);
        assert_eq!(ProviderKind::from_name("openai").unwrap().default_model(), OPENAI_DEFAULT_MODEL);
        assert!(matches!(
            ProviderKind::from_name("nope"),
            Err(ProviderError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_unknown_provider_has_no_key() {
        assert!(get_api_key("not-a-provider").is_none());
    }

    #[test]
    fn test_base_url_override() {
        let client = ProviderClient::new().with_base_url("http://127.0.0.1:1/v1");
        assert_eq!(client.url_for(ProviderKind::Glm), "http://127.0.0.1:1/v1");
    }
}
