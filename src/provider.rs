//! Text Provider Abstraction
//!
//! Unified interface for chat-completion text providers (OpenAI-compatible
//! endpoints and Anthropic). The pipeline only sees [`TextGenerator`]; clients
//! are built from configuration by [`ProviderFactory`].

use crate::error::ProviderFailure;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// One completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub usage: TokenUsage,
    pub finish_reason: Option<String>,
}

/// Text generation client trait
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run a single completion round trip
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, ProviderFailure>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Supported provider kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    OpenAI,
    Anthropic,
}

/// Provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_type: ProviderType,

    /// API key given inline
    #[serde(default)]
    pub api_key: Option<String>,

    /// Name of an environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Base URL override (custom or proxy endpoints)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            api_key: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            endpoint: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Resolve the API key, preferring the inline value.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone().filter(|k| !k.is_empty()).or_else(|| {
            self.api_key_env
                .as_ref()
                .and_then(|var| std::env::var(var).ok())
                .filter(|k| !k.is_empty())
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Endpoint must be an http(s) URL: {}", endpoint));
            }
        }
        if self.api_key.is_none() && self.api_key_env.is_none() {
            return Err("Either api_key or api_key_env must be set".to_string());
        }
        if self.connect_timeout_secs == 0 {
            return Err("connect_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }
}

fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

/// Map transport-level reqwest errors to a provider failure. `timeout` is the
/// limit the client was running under, reported when reqwest gives up waiting.
pub(crate) fn map_http_error(error: reqwest::Error, timeout: Duration) -> ProviderFailure {
    if let Some(status) = error.status() {
        ProviderFailure::from_status(status.as_u16(), error.to_string())
    } else if error.is_timeout() {
        ProviderFailure::Timeout(timeout.as_secs())
    } else if error.is_connect() {
        ProviderFailure::Network(format!("Connection error: {}", error))
    } else {
        ProviderFailure::Network(format!("HTTP error: {}", error))
    }
}

/// Turn a non-success response into a failure, reading its body for context.
pub(crate) async fn failure_from_response(response: reqwest::Response) -> ProviderFailure {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    ProviderFailure::from_status(status, body)
}

pub(crate) fn build_provider_http_client(connect_timeout: Duration) -> Result<Client, ProviderFailure> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| ProviderFailure::Client(format!("Failed to create HTTP client: {}", e)))
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    connect_timeout: Duration,
}

impl OpenAIClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(
        api_key: String,
        base_url: Option<String>,
        connect_timeout: Duration,
    ) -> Result<Self, ProviderFailure> {
        let client = build_provider_http_client(connect_timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            api_key,
            base_url,
            connect_timeout,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderFailure> {
        let body = ChatCompletionRequest {
            model: request.model,
            messages: request
                .messages
                .into_iter()
                .map(|msg| OpenAIMessage {
                    role: role_to_string(msg.role).to_string(),
                    content: Some(msg.content),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_http_error(e, self.connect_timeout))?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderFailure::MalformedResponse("No choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: completion.model,
            usage: completion.usage.unwrap_or_default(),
            finish_reason: choice.finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

/// Anthropic messages API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    connect_timeout: Duration,
}

impl AnthropicClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com/v1";
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(
        api_key: String,
        base_url: Option<String>,
        connect_timeout: Duration,
    ) -> Result<Self, ProviderFailure> {
        let client = build_provider_http_client(connect_timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            api_key,
            base_url,
            connect_timeout,
        })
    }
}

#[derive(Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicContent>,
    stop_reason: Option<String>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderFailure> {
        let system_message = request
            .messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone());

        let messages: Vec<_> = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| json!({"role": role_to_string(m.role), "content": m.content}))
            .collect();

        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": messages,
        });
        if let Some(system) = system_message {
            body["system"] = json!(system);
        }

        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_http_error(e, self.connect_timeout))?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let usage = parsed
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            model: parsed.model,
            usage,
            finish_reason: parsed.stop_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

/// Provider factory for creating text clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(config: &ProviderConfig) -> Result<Box<dyn TextGenerator>, ProviderFailure> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ProviderFailure::AuthFailed(match &config.api_key_env {
                Some(var) => format!("no API key configured (set {})", var),
                None => "no API key configured".to_string(),
            })
        })?;
        let connect_timeout = Duration::from_secs(config.connect_timeout_secs);

        match config.provider_type {
            ProviderType::OpenAI => Ok(Box::new(OpenAIClient::new(
                api_key,
                config.endpoint.clone(),
                connect_timeout,
            )?)),
            ProviderType::Anthropic => Ok(Box::new(AnthropicClient::new(
                api_key,
                config.endpoint.clone(),
                connect_timeout,
            )?)),
        }
    }
}
