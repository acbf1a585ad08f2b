//! Anthropic Messages API provider.
//!
//! System text moves to the top-level `system` field; the remaining turns
//! keep their `user`/`assistant` roles. Anthropic has no embeddings endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{
    ChatRole, CompletionAdapter, GenerationConfig, HttpClientConfig, LlmError, Message,
};

use super::client::{ApiKey, ProviderClient, ProviderConfig};
use super::constants::anthropic;
use super::{Provider, fold_system_messages};

/// Anthropic-specific configuration
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    pub generation_config: GenerationConfig,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self::new(ApiKey::Default)
    }
}

impl AnthropicConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: anthropic::API_BASE.to_string(),
            model: anthropic::DEFAULT_MODEL.to_string(),
            generation_config: GenerationConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }
}

impl ProviderConfig for AnthropicConfig {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    fn auth_header(&self, key: &str) -> (String, String) {
        (anthropic::API_KEY_HEADER.to_string(), key.to_string())
    }

    fn extra_headers(&self) -> Vec<(String, String)> {
        vec![(
            "anthropic-version".to_string(),
            anthropic::API_VERSION.to_string(),
        )]
    }

    fn error_message(&self, body: &str) -> Option<String> {
        parse_error_message(body)
    }
}

pub struct AnthropicProvider {
    client: ProviderClient<AnthropicConfig>,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig, http_config: &HttpClientConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: ProviderClient::new(config, http_config)?,
        })
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.client.config
    }
}

#[async_trait]
impl CompletionAdapter for AnthropicProvider {
    type Request = MessagesRequest;

    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn build_request(&self, messages: &[Message]) -> Result<MessagesRequest, LlmError> {
        let (system, turns) = fold_system_messages(Provider::Anthropic, messages)?;
        let config = &self.client.config;
        let generation = &config.generation_config;

        Ok(MessagesRequest {
            model: config.model.clone(),
            max_tokens: generation
                .max_tokens
                .unwrap_or(anthropic::DEFAULT_MAX_TOKENS),
            system,
            messages: turns
                .into_iter()
                .map(|m| AnthropicMessage {
                    role: match m.role {
                        ChatRole::Assistant => AnthropicRole::Assistant,
                        _ => AnthropicRole::User,
                    },
                    content: m.content.clone(),
                })
                .collect(),
            temperature: generation.temperature,
            top_p: generation.top_p,
        })
    }

    async fn send(&self, request: &MessagesRequest) -> Result<String, LlmError> {
        self.client
            .post_json(anthropic::MESSAGES_ENDPOINT, request)
            .await
    }

    fn parse_response(&self, body: &str) -> Result<String, LlmError> {
        let res: MessagesResponse = match serde_json::from_str(body) {
            Ok(res) => res,
            Err(e) => {
                return Err(match parse_error_message(body) {
                    Some(message) => LlmError::Provider {
                        message: format!("Anthropic: {message}"),
                        status_code: None,
                        retry_after: None,
                    },
                    None => LlmError::malformed_json("Failed to parse Anthropic response", e),
                });
            }
        };

        let texts: Vec<String> = res
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();

        if texts.is_empty() {
            return Err(LlmError::malformed("No text blocks in Anthropic response"));
        }

        Ok(texts.concat())
    }
}

fn parse_error_message(body: &str) -> Option<String> {
    let res: ErrorResponse = serde_json::from_str(body).ok()?;
    Some(format!("{}: {}", res.error.kind, res.error.message))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct AnthropicMessage {
    role: AnthropicRole,
    content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum AnthropicRole {
    User,
    Assistant,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}
