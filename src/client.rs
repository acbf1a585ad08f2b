//! The client façade: provider-agnostic entry points.
//!
//! Every operation resolves the provider identifier, builds the payload once,
//! sends it under the retry policy and parses the successful body once.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{debug, instrument};

use crate::core::retry::with_backoff;
use crate::core::{
    CompletionAdapter, EmbeddingAdapter, EmbeddingRequest, HttpClientConfig, LlmError, Message,
    ModelCatalog, ModelInfo,
};
use crate::provider::{AnthropicConfig, GeminiConfig, OpenAiConfig, Provider};
use crate::registry::{Adapter, EmbeddingBackend, ProviderRegistry};

/// Provider-agnostic LLM client.
///
/// Cheap to clone; clones share the provider registry and its connection
/// pools. Safe to use from many tasks at once.
#[derive(Clone)]
pub struct LlmClient {
    registry: Arc<ProviderRegistry>,
    http_config: HttpClientConfig,
    embedding_provider: String,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("providers", &self.registry.ids())
            .field("http_config", &self.http_config)
            .field("embedding_provider", &self.embedding_provider)
            .finish()
    }
}

impl LlmClient {
    pub fn builder() -> LlmClientBuilder {
        LlmClientBuilder::default()
    }

    /// Client with default settings; API keys come from `OPENAI_API_KEY`,
    /// `GEMINI_API_KEY` and `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::builder().build()
    }

    pub fn http_config(&self) -> &HttpClientConfig {
        &self.http_config
    }

    /// Send a conversation to `provider` and return the reply text as the
    /// provider reported it.
    ///
    /// The conversation must be non-empty and no message may be blank.
    #[instrument(skip_all, fields(provider = provider, messages = messages.len()))]
    pub async fn call_llm(&self, provider: &str, messages: Vec<Message>) -> Result<String, LlmError> {
        let adapter = self.registry.resolve(provider)?;

        if messages.is_empty() {
            return Err(LlmError::InvalidRequest(
                "at least one message is required".to_string(),
            ));
        }

        if let Some(index) = messages.iter().position(|m| m.content.trim().is_empty()) {
            return Err(LlmError::InvalidRequest(format!(
                "message {index} ({}) has no content",
                messages[index].role
            )));
        }

        match adapter {
            Adapter::OpenAI(a) => self.complete(a, &messages).await,
            Adapter::Gemini(a) => self.complete(a, &messages).await,
            Adapter::Anthropic(a) => self.complete(a, &messages).await,
        }
    }

    /// Send one user message to `provider`.
    pub async fn send_single_message(
        &self,
        provider: &str,
        text: impl Into<String>,
    ) -> Result<String, LlmError> {
        self.call_llm(provider, vec![Message::user(text)]).await
    }

    /// Embed `text` with the configured embedding provider.
    pub async fn get_embedding(
        &self,
        text: &str,
        target_dimensionality: Option<u32>,
    ) -> Result<Vec<f32>, LlmError> {
        self.get_embedding_with(&self.embedding_provider, text, target_dimensionality)
            .await
    }

    /// Embed `text` with an explicitly chosen provider.
    #[instrument(skip_all, fields(provider = provider, dimensions = ?target_dimensionality))]
    pub async fn get_embedding_with(
        &self,
        provider: &str,
        text: &str,
        target_dimensionality: Option<u32>,
    ) -> Result<Vec<f32>, LlmError> {
        let backend = self.registry.resolve_embedding(provider)?;

        if text.is_empty() {
            return Err(LlmError::InvalidRequest(
                "text to embed must not be empty".to_string(),
            ));
        }

        let request = EmbeddingRequest::new(text, target_dimensionality);
        match backend {
            EmbeddingBackend::OpenAI(a) => self.embed(a, &request).await,
            EmbeddingBackend::Gemini(a) => self.embed(a, &request).await,
        }
    }

    /// Models offered by `provider`. Only Gemini publishes a catalog.
    #[instrument(skip_all, fields(provider = provider))]
    pub async fn list_models(&self, provider: &str) -> Result<Vec<ModelInfo>, LlmError> {
        let catalog = self.registry.resolve_catalog(provider)?;
        with_backoff(&self.http_config, move || catalog.list_models()).await
    }

    #[instrument(skip_all, fields(provider = provider, model = model))]
    pub async fn get_model_info(&self, provider: &str, model: &str) -> Result<ModelInfo, LlmError> {
        let catalog = self.registry.resolve_catalog(provider)?;
        with_backoff(&self.http_config, move || catalog.get_model_info(model)).await
    }

    async fn complete<A>(&self, adapter: &A, messages: &[Message]) -> Result<String, LlmError>
    where
        A: CompletionAdapter,
    {
        let payload = adapter.build_request(messages)?;
        let payload = &payload;
        let body = with_backoff(&self.http_config, move || adapter.send(payload)).await?;
        let text = adapter.parse_response(&body)?;

        debug!(
            provider = %adapter.provider(),
            chars = text.chars().count(),
            "completion received"
        );
        Ok(text)
    }

    async fn embed<A>(&self, adapter: &A, request: &EmbeddingRequest) -> Result<Vec<f32>, LlmError>
    where
        A: EmbeddingAdapter,
    {
        let payload = adapter.build_embedding_request(request)?;
        let payload = &payload;
        let body = with_backoff(&self.http_config, move || adapter.send_embedding(payload)).await?;
        let embedding = adapter.parse_embedding_response(&body, request)?;

        debug!(
            provider = %adapter.provider(),
            model = %adapter.embedding_model().name,
            dimensions = embedding.len(),
            "embedding received"
        );
        Ok(embedding)
    }
}

/// Assembles an [`LlmClient`] from per-provider configuration.
#[derive(Debug, Clone)]
pub struct LlmClientBuilder {
    http_config: HttpClientConfig,
    openai: OpenAiConfig,
    gemini: GeminiConfig,
    anthropic: AnthropicConfig,
    embedding_provider: String,
}

impl Default for LlmClientBuilder {
    fn default() -> Self {
        Self {
            http_config: HttpClientConfig::default(),
            openai: OpenAiConfig::from_env(),
            gemini: GeminiConfig::default(),
            anthropic: AnthropicConfig::default(),
            embedding_provider: Provider::OpenAI.id().to_string(),
        }
    }
}

impl LlmClientBuilder {
    pub fn http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http_config.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.http_config.max_retries = max_retries;
        self
    }

    pub fn openai(mut self, config: OpenAiConfig) -> Self {
        self.openai = config;
        self
    }

    pub fn gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = config;
        self
    }

    pub fn anthropic(mut self, config: AnthropicConfig) -> Self {
        self.anthropic = config;
        self
    }

    /// Provider used by [`LlmClient::get_embedding`]. Checked on use.
    pub fn embedding_provider(mut self, provider: impl Into<String>) -> Self {
        self.embedding_provider = provider.into();
        self
    }

    pub fn build(self) -> Result<LlmClient, LlmError> {
        let registry =
            ProviderRegistry::new(self.openai, self.gemini, self.anthropic, &self.http_config)?;

        Ok(LlmClient {
            registry: Arc::new(registry),
            http_config: self.http_config,
            embedding_provider: self.embedding_provider,
        })
    }
}

static DEFAULT_CLIENT: OnceLock<LlmClient> = OnceLock::new();

fn default_client() -> Result<&'static LlmClient, LlmError> {
    if let Some(client) = DEFAULT_CLIENT.get() {
        return Ok(client);
    }
    let client = LlmClient::from_env()?;
    Ok(DEFAULT_CLIENT.get_or_init(|| client))
}

/// [`LlmClient::call_llm`] on a process-wide client built with
/// [`LlmClient::from_env`] on first use.
pub async fn call_llm(provider: &str, messages: Vec<Message>) -> Result<String, LlmError> {
    default_client()?.call_llm(provider, messages).await
}

/// [`LlmClient::get_embedding`] on the process-wide default client.
pub async fn get_embedding(
    text: &str,
    target_dimensionality: Option<u32>,
) -> Result<Vec<f32>, LlmError> {
    default_client()?
        .get_embedding(text, target_dimensionality)
        .await
}
