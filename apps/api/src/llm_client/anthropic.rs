//! Messages API backend (Anthropic).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{api_error, endpoint, http_client, Completion, LlmError, TextGenerator, TokenUsage};
use crate::config::{LlmConfig, ProviderKind};

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Sends the prompt as a single user message. No temperature is sent, the
/// API's default sampling applies.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(config)?,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            url: endpoint(&config.base_url, MESSAGES_PATH),
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicProvider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), text));
        }

        let raw: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| LlmError::InvalidResponse(format!("body is not JSON: {e}")))?;
        let parsed: MessagesResponse = serde_json::from_value(raw.clone())
            .map_err(|e| LlmError::InvalidResponse(format!("unexpected messages shape: {e}")))?;

        let generated = parsed
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<String>();
        if generated.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }

        Ok(Completion {
            text: generated,
            usage: TokenUsage::new(parsed.usage.input_tokens, parsed.usage.output_tokens, None),
            raw,
        })
    }
}
