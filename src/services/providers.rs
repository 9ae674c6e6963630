// LLM Provider Service
// OpenAI-compatible chat completion calls used to build the lexicon

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::future::Future;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

pub const OPENAI_DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Providers with a known chat completion endpoint and key variables.
pub const SUPPORTED_PROVIDERS: [&str; 1] = ["openai"];
const REQUEST_TIMEOUT_SECS: u64 = 80;
const DEFAULT_MAX_TOKENS: i32 = 4096;

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
    #[error("API key not configured")]
    MissingApiKey,
    #[error("Unsupported provider: {0} (supported: openai)")]
    UnsupportedProvider(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub model: String,
}

/// Parse `name[:model]`; the model defaults per provider. Names outside
/// [`SUPPORTED_PROVIDERS`] are rejected.
pub fn parse_provider(spec: &str) -> Result<ProviderSpec, ProviderError> {
    let parts: Vec<&str> = spec.trim().splitn(2, ':').collect();
    let name = parts[0].to_ascii_lowercase();
    if !SUPPORTED_PROVIDERS.contains(&name.as_str()) {
        return Err(ProviderError::UnsupportedProvider(parts[0].to_string()));
    }
    let model = match parts.get(1) {
        Some(model) if !model.is_empty() => model.to_string(),
        _ => OPENAI_DEFAULT_MODEL.to_string(),
    };
    Ok(ProviderSpec { name, model })
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
    max_tokens: i32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
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
}

static JSON_OBJECT_RE: OnceLock<Regex> = OnceLock::new();

fn json_object_re() -> &'static Regex {
    JSON_OBJECT_RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid json object pattern"))
}

/// One system + user exchange with a chat model. Implemented by the HTTP
/// client and by test doubles.
pub trait ChatCompletion {
    fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

pub struct ProviderClient {
    client: Client,
    url: String,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderClient {
    pub fn new() -> Self {
        let url = env::var("OPENAI_API_URL").unwrap_or_else(|_| OPENAI_DEFAULT_URL.to_string());
        Self::with_url(&url)
    }

    pub fn with_url(url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.to_string(),
        }
    }

    pub fn with_proxy(url: &str, proxy_url: &str) -> Result<Self, ProviderError> {
        let proxy = reqwest::Proxy::all(proxy_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .proxy(proxy)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn call_chat_api(
        &self,
        model: &str,
        api_key: &str,
        system: &str,
        user: &str,
        max_tokens: i32,
    ) -> Result<ChatResult, ProviderError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens,
            temperature: 0.0,
        };

        let start = Instant::now();

        let response = self
            .client
            .post(&self.url)
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

        let mut content = message.and_then(|m| m.content.clone());

        // Reasoning models sometimes leave the answer only in reasoning_content.
        if content.as_deref().map_or(true, |c| c.trim().is_empty()) {
            if let Some(reasoning) = message.and_then(|m| m.reasoning_content.as_deref()) {
                if let Some(m) = json_object_re().find(reasoning) {
                    content = Some(m.as_str().to_string());
                }
            }
        }

        let content = content.ok_or(ProviderError::MissingContent)?;
        debug!(latency_ms, chars = content.len(), "provider.chat.completed");

        Ok(ChatResult {
            content,
            latency_ms,
        })
    }
}

/// A provider client bound to a model and key.
pub struct ChatModel {
    client: ProviderClient,
    model: String,
    api_key: String,
    max_tokens: i32,
}

impl ChatModel {
    pub fn new(client: ProviderClient, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            api_key: api_key.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Resolve the API key for `spec` from the environment, then `api_keys`
    /// (the loaded config's `apiKeys`).
    pub fn from_spec(
        client: ProviderClient,
        spec: &ProviderSpec,
        api_keys: &HashMap<String, String>,
    ) -> Result<Self, ProviderError> {
        let api_key = get_api_key(&spec.name, api_keys).ok_or(ProviderError::MissingApiKey)?;
        Ok(Self::new(client, spec.model.clone(), api_key))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatCompletion for ChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let result = self
            .client
            .call_chat_api(&self.model, &self.api_key, system, user, self.max_tokens)
            .await?;
        Ok(result.content)
    }
}

/// Get API key from environment, falling back to configured keys
pub fn get_api_key(provider: &str, api_keys: &HashMap<String, String>) -> Option<String> {
    let env_keys = match provider {
        "openai" => vec!["OPENAI_API_KEY", "CEFR_OPENAI_API_KEY"],
        _ => vec![],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    api_keys
        .get(provider)
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(|k| k.to_string())
}
