//! OpenAI provider: chat completions and embeddings.
//!
//! Role mapping is one-to-one: `system`, `user` and `assistant` keep their
//! names.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{
    ChatRole, CompletionAdapter, EmbeddingAdapter, EmbeddingModel, EmbeddingRequest,
    GenerationConfig, HttpClientConfig, LlmError, Message,
};

use super::client::{ApiKey, ProviderClient, ProviderConfig};
use super::constants::openai;
use super::{Provider, check_embedding, expected_dimensions};

/// OpenAI-specific configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    /// Sent as `OpenAI-Organization` when set
    pub organization: Option<String>,
    pub model: String,
    pub embedding_model: EmbeddingModel,
    pub generation_config: GenerationConfig,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self::new(ApiKey::Default)
    }
}

impl OpenAiConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: openai::API_BASE.to_string(),
            organization: None,
            model: openai::DEFAULT_MODEL.to_string(),
            embedding_model: EmbeddingModel::new(
                openai::EMBEDDING_MODEL,
                openai::EMBEDDING_DIMENSIONS,
            ),
            generation_config: GenerationConfig::default(),
        }
    }

    /// Default configuration plus the organization from `OPENAI_ORG_ID`.
    pub fn from_env() -> Self {
        let organization = std::env::var(openai::ORGANIZATION_ENV_VAR)
            .ok()
            .filter(|org| !org.trim().is_empty());
        Self {
            organization,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_embedding_model(mut self, model: EmbeddingModel) -> Self {
        self.embedding_model = model;
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }
}

impl ProviderConfig for OpenAiConfig {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    fn auth_header(&self, key: &str) -> (String, String) {
        ("Authorization".to_string(), format!("Bearer {key}"))
    }

    fn extra_headers(&self) -> Vec<(String, String)> {
        self.organization
            .iter()
            .map(|org| ("OpenAI-Organization".to_string(), org.clone()))
            .collect()
    }

    fn error_message(&self, body: &str) -> Option<String> {
        parse_error_message(body)
    }
}

pub struct OpenAiProvider {
    client: ProviderClient<OpenAiConfig>,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig, http_config: &HttpClientConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: ProviderClient::new(config, http_config)?,
        })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.client.config
    }
}

#[async_trait]
impl CompletionAdapter for OpenAiProvider {
    type Request = ChatCompletionRequest;

    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn build_request(&self, messages: &[Message]) -> Result<ChatCompletionRequest, LlmError> {
        let config = &self.client.config;
        let generation = &config.generation_config;

        Ok(ChatCompletionRequest {
            model: config.model.clone(),
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: match m.role {
                        ChatRole::System => ChatMessageRole::System,
                        ChatRole::User => ChatMessageRole::User,
                        ChatRole::Assistant => ChatMessageRole::Assistant,
                    },
                    content: m.content.clone(),
                })
                .collect(),
            temperature: generation
                .temperature
                .unwrap_or(openai::DEFAULT_TEMPERATURE),
            max_tokens: generation.max_tokens,
            top_p: generation.top_p,
        })
    }

    async fn send(&self, request: &ChatCompletionRequest) -> Result<String, LlmError> {
        self.client
            .post_json(openai::CHAT_COMPLETIONS_ENDPOINT, request)
            .await
    }

    fn parse_response(&self, body: &str) -> Result<String, LlmError> {
        let res: ChatCompletionResponse = match serde_json::from_str(body) {
            Ok(res) => res,
            Err(e) => {
                return Err(match parse_error_message(body) {
                    Some(message) => provider_error(message),
                    None => LlmError::malformed_json("Failed to parse OpenAI chat completion", e),
                });
            }
        };

        let choice = res
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::malformed("No choices in OpenAI response"))?;

        match (choice.message.content, choice.message.refusal) {
            (Some(content), _) => Ok(content),
            (None, Some(refusal)) => Err(provider_error(format!("Model refused: {refusal}"))),
            (None, None) => Err(LlmError::malformed("OpenAI choice has no message content")),
        }
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiProvider {
    type Request = OpenAiEmbeddingRequest;

    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn embedding_model(&self) -> &EmbeddingModel {
        &self.client.config.embedding_model
    }

    fn build_embedding_request(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<OpenAiEmbeddingRequest, LlmError> {
        let model = self.embedding_model();
        expected_dimensions(Provider::OpenAI, model, request.target_dimensionality)?;

        Ok(OpenAiEmbeddingRequest {
            model: model.name.clone(),
            input: request.text.clone(),
            dimensions: request.target_dimensionality,
            encoding_format: EncodingFormat::Float,
        })
    }

    async fn send_embedding(&self, request: &OpenAiEmbeddingRequest) -> Result<String, LlmError> {
        self.client
            .post_json(openai::EMBEDDINGS_ENDPOINT, request)
            .await
    }

    fn parse_embedding_response(
        &self,
        body: &str,
        request: &EmbeddingRequest,
    ) -> Result<Vec<f32>, LlmError> {
        let expected = expected_dimensions(
            Provider::OpenAI,
            self.embedding_model(),
            request.target_dimensionality,
        )?;

        let res: EmbeddingResponse = match serde_json::from_str(body) {
            Ok(res) => res,
            Err(e) => {
                return Err(match parse_error_message(body) {
                    Some(message) => provider_error(message),
                    None => LlmError::malformed_json("Failed to parse OpenAI embedding", e),
                });
            }
        };

        let data = res
            .data
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::malformed("No embedding data in OpenAI response"))?;

        check_embedding(data.embedding, expected)
    }
}

fn provider_error(message: String) -> LlmError {
    LlmError::Provider {
        message: format!("OpenAI: {message}"),
        status_code: None,
        retry_after: None,
    }
}

fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|res| res.error.message)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChatMessage {
    role: ChatMessageRole,
    content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum ChatMessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiEmbeddingRequest {
    model: String,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
    encoding_format: EncodingFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
enum EncodingFormat {
    Float,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
}
