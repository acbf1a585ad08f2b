//! Maps provider identifiers to constructed adapters.
//!
//! Lookup is exact and case-sensitive. The registry is immutable once built
//! and shared between concurrent calls.

use crate::core::{HttpClientConfig, LlmError};
use crate::provider::{
    AnthropicConfig, AnthropicProvider, GeminiConfig, GeminiProvider, OpenAiConfig,
    OpenAiProvider, Provider,
};

const UNKNOWN_PROVIDER: &str = "no such provider is registered";
const NO_EMBEDDINGS: &str = "provider does not support embeddings";

/// A completion-capable adapter selected by identifier.
pub enum Adapter<'a> {
    OpenAI(&'a OpenAiProvider),
    Gemini(&'a GeminiProvider),
    Anthropic(&'a AnthropicProvider),
}

/// An embedding-capable adapter selected by identifier.
pub enum EmbeddingBackend<'a> {
    OpenAI(&'a OpenAiProvider),
    Gemini(&'a GeminiProvider),
}

pub struct ProviderRegistry {
    openai: OpenAiProvider,
    gemini: GeminiProvider,
    anthropic: AnthropicProvider,
}

impl ProviderRegistry {
    pub fn new(
        openai: OpenAiConfig,
        gemini: GeminiConfig,
        anthropic: AnthropicConfig,
        http_config: &HttpClientConfig,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            openai: OpenAiProvider::new(openai, http_config)?,
            gemini: GeminiProvider::new(gemini, http_config)?,
            anthropic: AnthropicProvider::new(anthropic, http_config)?,
        })
    }

    /// Identifiers accepted by [`resolve`](Self::resolve).
    pub fn ids(&self) -> Vec<&'static str> {
        Provider::ALL.iter().map(Provider::id).collect()
    }

    pub fn resolve(&self, id: &str) -> Result<Adapter<'_>, LlmError> {
        match Provider::from_id(id) {
            Some(Provider::OpenAI) => Ok(Adapter::OpenAI(&self.openai)),
            Some(Provider::Gemini) => Ok(Adapter::Gemini(&self.gemini)),
            Some(Provider::Anthropic) => Ok(Adapter::Anthropic(&self.anthropic)),
            None => Err(LlmError::invalid_provider(id, UNKNOWN_PROVIDER)),
        }
    }

    pub fn resolve_embedding(&self, id: &str) -> Result<EmbeddingBackend<'_>, LlmError> {
        match Provider::from_id(id) {
            Some(Provider::OpenAI) => Ok(EmbeddingBackend::OpenAI(&self.openai)),
            Some(Provider::Gemini) => Ok(EmbeddingBackend::Gemini(&self.gemini)),
            Some(Provider::Anthropic) => Err(LlmError::invalid_provider(id, NO_EMBEDDINGS)),
            None => Err(LlmError::invalid_provider(id, UNKNOWN_PROVIDER)),
        }
    }

    /// Only Gemini publishes a model catalog.
    pub fn resolve_catalog(&self, id: &str) -> Result<&GeminiProvider, LlmError> {
        match Provider::from_id(id) {
            Some(Provider::Gemini) => Ok(&self.gemini),
            Some(provider) => Err(LlmError::InvalidRequest(format!(
                "{provider} does not expose a model catalog"
            ))),
            None => Err(LlmError::invalid_provider(id, UNKNOWN_PROVIDER)),
        }
    }
}
