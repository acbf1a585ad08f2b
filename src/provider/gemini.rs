//! Google Gemini provider: content generation, embeddings and the model
//! catalog.
//!
//! Gemini names the assistant role `model` and takes system text as a
//! separate `systemInstruction`, so system messages are folded out of the
//! turn list before the request is built.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{
    ChatRole, CompletionAdapter, EmbeddingAdapter, EmbeddingModel, EmbeddingRequest,
    GenerationConfig, HttpClientConfig, LlmError, Message, ModelCatalog, ModelInfo,
};

use super::client::{ApiKey, ProviderClient, ProviderConfig};
use super::constants::gemini;
use super::{Provider, check_embedding, expected_dimensions, fold_system_messages};

/// Gemini-specific configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    pub embedding_model: EmbeddingModel,
    pub generation_config: GenerationConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self::new(ApiKey::Default)
    }
}

impl GeminiConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: gemini::API_BASE.to_string(),
            model: gemini::DEFAULT_MODEL.to_string(),
            embedding_model: EmbeddingModel::new(
                gemini::EMBEDDING_MODEL,
                gemini::EMBEDDING_DIMENSIONS,
            ),
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

    pub fn with_embedding_model(mut self, model: EmbeddingModel) -> Self {
        self.embedding_model = model;
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }
}

impl ProviderConfig for GeminiConfig {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    // Key travels in a header so it never shows up in a logged URL.
    fn auth_header(&self, key: &str) -> (String, String) {
        (gemini::API_KEY_HEADER.to_string(), key.to_string())
    }

    fn error_message(&self, body: &str) -> Option<String> {
        parse_error_message(body)
    }
}

pub struct GeminiProvider {
    client: ProviderClient<GeminiConfig>,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig, http_config: &HttpClientConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: ProviderClient::new(config, http_config)?,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.client.config
    }

    fn generation_config(&self) -> Option<RequestGenerationConfig> {
        let config = &self.client.config.generation_config;
        let request = RequestGenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
            top_p: config.top_p,
            thinking_config: config.thinking_budget.map(|thinking_budget| ThinkingConfig {
                thinking_budget,
            }),
        };

        (request != RequestGenerationConfig::default()).then_some(request)
    }
}

#[async_trait]
impl CompletionAdapter for GeminiProvider {
    type Request = GenerateContentRequest;

    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn build_request(&self, messages: &[Message]) -> Result<GenerateContentRequest, LlmError> {
        let (system, turns) = fold_system_messages(Provider::Gemini, messages)?;

        let contents = turns
            .into_iter()
            .map(|m| Content {
                role: Some(match m.role {
                    ChatRole::Assistant => ContentRole::Model,
                    _ => ContentRole::User,
                }),
                parts: vec![Part::text(&m.content)],
            })
            .collect();

        Ok(GenerateContentRequest {
            contents,
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part::text(&text)],
            }),
            generation_config: self.generation_config(),
        })
    }

    async fn send(&self, request: &GenerateContentRequest) -> Result<String, LlmError> {
        let endpoint = format!("/models/{}:generateContent", self.client.config.model);
        self.client.post_json(&endpoint, request).await
    }

    fn parse_response(&self, body: &str) -> Result<String, LlmError> {
        let res: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
            match parse_error_message(body) {
                Some(message) => provider_error(message),
                None => LlmError::malformed_json("Failed to parse Gemini response", e),
            }
        })?;

        let Some(candidate) = res.candidates.into_iter().next() else {
            return Err(match res.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => provider_error(format!("prompt blocked: {reason}")),
                None => match parse_error_message(body) {
                    Some(message) => provider_error(message),
                    None => LlmError::malformed("No candidates in Gemini response"),
                },
            });
        };

        // Thought-only or empty output, e.g. when thinking used up the
        // whole token budget, is reported through `finishReason`.
        let stopped = |missing: &str| match &candidate.finish_reason {
            Some(reason) => provider_error(format!("generation stopped: {reason}")),
            None => LlmError::malformed(format!("Gemini candidate has no {missing}")),
        };

        let Some(content) = &candidate.content else {
            return Err(stopped("content"));
        };

        let texts: Vec<&str> = content
            .parts
            .iter()
            .filter(|p| !p.thought.unwrap_or(false))
            .filter_map(|p| p.text.as_deref())
            .collect();

        if texts.is_empty() {
            return Err(stopped("text parts"));
        }

        Ok(texts.concat())
    }
}

#[async_trait]
impl EmbeddingAdapter for GeminiProvider {
    type Request = EmbedContentRequest;

    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    fn embedding_model(&self) -> &EmbeddingModel {
        &self.client.config.embedding_model
    }

    fn build_embedding_request(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<EmbedContentRequest, LlmError> {
        let model = self.embedding_model();
        expected_dimensions(Provider::Gemini, model, request.target_dimensionality)?;

        Ok(EmbedContentRequest {
            model: model_resource(&model.name),
            content: Content {
                role: None,
                parts: vec![Part::text(&request.text)],
            },
            output_dimensionality: request.target_dimensionality,
        })
    }

    async fn send_embedding(&self, request: &EmbedContentRequest) -> Result<String, LlmError> {
        let endpoint = format!("/{}:embedContent", request.model);
        self.client.post_json(&endpoint, request).await
    }

    fn parse_embedding_response(
        &self,
        body: &str,
        request: &EmbeddingRequest,
    ) -> Result<Vec<f32>, LlmError> {
        let expected = expected_dimensions(
            Provider::Gemini,
            self.embedding_model(),
            request.target_dimensionality,
        )?;

        let res: EmbedContentResponse = serde_json::from_str(body).map_err(|e| {
            match parse_error_message(body) {
                Some(message) => provider_error(message),
                None => LlmError::malformed_json("Failed to parse Gemini embedding", e),
            }
        })?;

        check_embedding(res.embedding.values, expected)
    }
}

#[async_trait]
impl ModelCatalog for GeminiProvider {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError> {
        let body = self.client.get("/models").await?;
        let res: ListModelsResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::malformed_json("Failed to parse Gemini model list", e))?;
        Ok(res.models)
    }

    async fn get_model_info(&self, model: &str) -> Result<ModelInfo, LlmError> {
        if model.trim().is_empty() {
            return Err(LlmError::InvalidRequest(
                "model name must not be empty".to_string(),
            ));
        }

        let body = self.client.get(&format!("/{}", model_resource(model))).await?;
        serde_json::from_str(&body)
            .map_err(|e| LlmError::malformed_json("Failed to parse Gemini model info", e))
    }
}

/// `gemini-2.0-flash` -> `models/gemini-2.0-flash`; already-qualified names
/// pass through.
fn model_resource(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{name}")
    }
}

fn provider_error(message: String) -> LlmError {
    LlmError::Provider {
        message: format!("Gemini: {message}"),
        status_code: None,
        retry_after: None,
    }
}

fn parse_error_message(body: &str) -> Option<String> {
    let res: ErrorResponse = serde_json::from_str(body).ok()?;
    Some(match res.error.status {
        Some(status) => format!("{status}: {}", res.error.message),
        None => res.error.message,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<RequestGenerationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<ContentRole>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ContentRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
    /// Set on parts that carry the model's reasoning rather than its answer.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    thought: Option<bool>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            thought: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentRequest {
    model: String,
    content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(
            GeminiConfig::new(ApiKey::Custom("test-key".to_string())),
            &HttpClientConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_request_maps_roles_and_folds_system() {
        let messages = vec![
            Message::system("You are a storyteller."),
            Message::user("Write the first line of a story about a magic backpack."),
            Message::assistant("In the heart of a bustling city..."),
            Message::system("Keep it short."),
            Message::user("Now write the second line."),
        ];

        let request = provider().build_request(&messages).unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body["contents"],
            json!([
                { "role": "user", "parts": [{ "text": "Write the first line of a story about a magic backpack." }] },
                { "role": "model", "parts": [{ "text": "In the heart of a bustling city..." }] },
                { "role": "user", "parts": [{ "text": "Now write the second line." }] }
            ])
        );
        assert_eq!(
            body["systemInstruction"],
            json!({ "parts": [{ "text": "You are a storyteller.\n\nKeep it short." }] })
        );
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_build_request_without_system_omits_instruction() {
        let request = provider()
            .build_request(&[Message::user("Hello")])
            .unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_build_request_rejects_system_only_conversation() {
        let err = provider()
            .build_request(&[Message::system("rules only")])
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidRequest(_)));
    }

    #[test]
    fn test_build_request_applies_generation_config() {
        let config = GeminiConfig::new(ApiKey::Custom("k".to_string())).with_generation_config(
            GenerationConfig::new()
                .with_temperature(0.5)
                .with_max_tokens(100)
                .with_thinking_budget(0),
        );
        let provider = GeminiProvider::new(config, &HttpClientConfig::default()).unwrap();

        let body =
            serde_json::to_value(provider.build_request(&[Message::user("hi")]).unwrap()).unwrap();

        assert_eq!(body["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
        assert!(body["generationConfig"].get("topP").is_none());
    }

    #[test]
    fn test_parse_response_joins_text_parts_and_skips_thoughts() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Let me think about backpacks.", "thought": true },
                        { "text": "Once upon a time, " },
                        { "text": "a backpack sang." }
                    ]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 9, "candidatesTokenCount": 7 }
        })
        .to_string();

        assert_eq!(
            provider().parse_response(&body).unwrap(),
            "Once upon a time, a backpack sang."
        );
    }

    #[test]
    fn test_parse_response_blocked_prompt_is_provider_error() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } }).to_string();

        match provider().parse_response(&body) {
            Err(LlmError::Provider { message, .. }) => assert!(message.contains("SAFETY")),
            other => panic!("Expected Provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_candidate_without_content() {
        let body = json!({ "candidates": [{ "finishReason": "RECITATION" }] }).to_string();
        assert!(matches!(
            provider().parse_response(&body),
            Err(LlmError::Provider { .. })
        ));

        let body = json!({ "candidates": [{}] }).to_string();
        assert!(matches!(
            provider().parse_response(&body),
            Err(LlmError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_parse_response_thought_only_candidate_reports_finish_reason() {
        let body = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "Planning the answer at length...", "thought": true }]
                },
                "finishReason": "MAX_TOKENS"
            }]
        })
        .to_string();

        match provider().parse_response(&body) {
            Err(LlmError::Provider { message, .. }) => assert!(message.contains("MAX_TOKENS")),
            other => panic!("Expected Provider error, got {:?}", other),
        }

        let body = json!({
            "candidates": [{ "content": { "role": "model", "parts": [] } }]
        })
        .to_string();
        assert!(matches!(
            provider().parse_response(&body),
            Err(LlmError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_parse_response_error_payload_and_garbage() {
        let error = json!({
            "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
        })
        .to_string();
        match provider().parse_response(&error) {
            Err(LlmError::Provider { message, .. }) => {
                assert!(message.contains("API key not valid."))
            }
            other => panic!("Expected Provider error, got {:?}", other),
        }

        assert!(matches!(
            provider().parse_response("not json"),
            Err(LlmError::MalformedResponse { .. })
        ));
        assert!(matches!(
            provider().parse_response("{}"),
            Err(LlmError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_embedding_request_shape() {
        let request = provider()
            .build_embedding_request(&EmbeddingRequest::new("What is the meaning of life?", Some(768)))
            .unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "models/gemini-embedding-001",
                "content": { "parts": [{ "text": "What is the meaning of life?" }] },
                "outputDimensionality": 768
            })
        );
    }

    #[test]
    fn test_embedding_dimensionality_limits() {
        let provider = provider();

        assert!(matches!(
            provider.build_embedding_request(&EmbeddingRequest::new("x", Some(4096))),
            Err(LlmError::UnsupportedDimensionality { max: 3072, .. })
        ));
        assert!(matches!(
            provider.build_embedding_request(&EmbeddingRequest::new("x", Some(0))),
            Err(LlmError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_parse_embedding_response() {
        let provider = provider();
        let request = EmbeddingRequest::new("x", Some(4));

        let body = json!({ "embedding": { "values": [0.25, -0.5, 0.0, 1.0] } }).to_string();
        assert_eq!(
            provider.parse_embedding_response(&body, &request).unwrap(),
            vec![0.25, -0.5, 0.0, 1.0]
        );

        let body = json!({ "embedding": { "values": [0.25] } }).to_string();
        assert!(matches!(
            provider.parse_embedding_response(&body, &request),
            Err(LlmError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_model_resource() {
        assert_eq!(model_resource("gemini-2.0-flash"), "models/gemini-2.0-flash");
        assert_eq!(
            model_resource("models/gemini-2.0-flash"),
            "models/gemini-2.0-flash"
        );
    }
}
