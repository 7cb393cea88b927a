//! LLM provider abstraction and HTTP implementations
//!
//! Each provider wraps one vendor's completion API behind a uniform trait.
//! Wire formats follow the vendors' chat/messages schemas; parsing is
//! tolerant, and any transport or schema surprise becomes an `Error::Llm`
//! for the retry/fallback logic to absorb.

use async_trait::async_trait;
use namesift_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A completed provider call
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Trait over LLM completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<ProviderResponse>;

    /// Provider name for logs and learned records
    fn name(&self) -> &str;

    /// Model id, used for pricing
    fn model(&self) -> &str;
}

/// Construction-time provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    /// Override the default API endpoint (proxies, self-hosted gateways)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Connect timeout; the per-request deadline is enforced by the caller
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("failed to build http client: {}", e)))
    }
}

// =============================================================================
// OpenAI-compatible chat completions
// =============================================================================

/// Provider speaking the OpenAI chat-completions schema
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::config("openai provider requires an api key"));
        }
        Ok(Self {
            client: config.build_client()?,
            config,
        })
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1");
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<ProviderResponse> {
        let request = OpenAiRequest {
            model: &self.config.model,
            messages: vec![OpenAiMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("openai request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "openai returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("openai response malformed: {}", e)))?;

        let text = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| Error::llm("openai response had no content"))?;
        let usage = parsed.usage.unwrap_or_default();

        Ok(ProviderResponse {
            text,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// =============================================================================
// Anthropic messages API
// =============================================================================

/// Provider speaking the Anthropic messages schema
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: ProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::config("anthropic provider requires an api key"));
        }
        Ok(Self {
            client: config.build_client()?,
            config,
        })
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.anthropic.com");
        format!("{}/v1/messages", base.trim_end_matches('/'))
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<ProviderResponse> {
        let request = AnthropicRequest {
            model: &self.config.model,
            max_tokens,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("anthropic request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "anthropic returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("anthropic response malformed: {}", e)))?;

        let text = parsed
            .content
            .first()
            .and_then(|c| c.text.clone())
            .ok_or_else(|| Error::llm("anthropic response had no text content"))?;
        let usage = parsed.usage.unwrap_or_default();

        Ok(ProviderResponse {
            text,
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
