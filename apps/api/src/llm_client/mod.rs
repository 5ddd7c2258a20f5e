//! LLM Client: the single point of entry for all text generation calls.
//!
//! ARCHITECTURAL RULE: No other module may call a provider API directly.
//! Every call is exactly one request. No retries, no backoff, no streaming.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{LlmConfig, ProviderKind};

pub mod anthropic;
pub mod chat_completions;

pub use anthropic::AnthropicProvider;
pub use chat_completions::ChatCompletionsProvider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Client setup failed: {0}")]
    Setup(String),
}

/// Token counts reported by the provider, normalized across APIs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Uses the provider's total when it reports one, the sum otherwise.
    pub fn new(prompt_tokens: u32, completion_tokens: u32, total_tokens: Option<u32>) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: total_tokens
                .unwrap_or_else(|| prompt_tokens.saturating_add(completion_tokens)),
        }
    }
}

/// A successful generation.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
    /// The provider's response body, kept for callers that archive it.
    pub raw: serde_json::Value,
}

/// One text generation capability, whatever API sits behind it.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError>;
}

/// The configured provider. Built once at startup from [`LlmConfig`].
#[derive(Clone)]
pub enum LlmClient {
    Anthropic(Arc<AnthropicProvider>),
    ChatCompletions(Arc<ChatCompletionsProvider>),
}

impl LlmClient {
    /// Returns `Ok(None)` when no credential is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, LlmError> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let client = match config.provider {
            ProviderKind::Anthropic => {
                LlmClient::Anthropic(Arc::new(AnthropicProvider::new(api_key, config)?))
            }
            ProviderKind::Groq => LlmClient::ChatCompletions(Arc::new(
                ChatCompletionsProvider::new(api_key, config)?,
            )),
        };

        info!(
            "LLM client initialized (provider: {}, model: {})",
            config.provider.as_str(),
            config.model
        );
        Ok(Some(client))
    }

    fn inner(&self) -> &dyn TextGenerator {
        match self {
            LlmClient::Anthropic(p) => &**p,
            LlmClient::ChatCompletions(p) => &**p,
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    fn provider(&self) -> ProviderKind {
        self.inner().provider()
    }

    fn model(&self) -> &str {
        self.inner().model()
    }

    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        debug!(
            "Sending {} prompt chars to {}",
            prompt.len(),
            self.provider().as_str()
        );
        let completion = self.inner().generate(prompt).await?;
        debug!(
            "LLM call succeeded: prompt_tokens={}, completion_tokens={}, total_tokens={}",
            completion.usage.prompt_tokens,
            completion.usage.completion_tokens,
            completion.usage.total_tokens
        );
        Ok(completion)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Builds an [`LlmError::Api`] from a non-2xx response body, preferring the
/// provider's `{"error":{"message":...}}` text over the raw body.
pub(crate) fn api_error(status: u16, body: String) -> LlmError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    LlmError::Api { status, message }
}

pub(crate) fn http_client(config: &LlmConfig) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| LlmError::Setup(format!("failed to build HTTP client: {e}")))
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}
