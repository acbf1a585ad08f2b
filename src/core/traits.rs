use async_trait::async_trait;
use serde::Serialize;

use crate::provider::Provider;

use super::{
    error::LlmError,
    types::{EmbeddingModel, EmbeddingRequest, Message, ModelInfo},
};

/// Wire-level contract for text completions with one provider.
///
/// The client façade calls `build_request` once, `send` once per attempt and
/// `parse_response` once on the successful body.
#[async_trait]
pub trait CompletionAdapter: Send + Sync {
    /// The provider-specific request type
    type Request: Serialize + Send + Sync;

    fn provider(&self) -> Provider;

    /// Translate the conversation into the provider's payload. Pure: no I/O,
    /// same input gives the same payload.
    fn build_request(&self, messages: &[Message]) -> Result<Self::Request, LlmError>;

    /// Perform exactly one HTTP attempt and return the raw success body.
    async fn send(&self, request: &Self::Request) -> Result<String, LlmError>;

    /// Extract the reply text. Any shape other than the documented success
    /// shape is an error.
    fn parse_response(&self, body: &str) -> Result<String, LlmError>;
}

/// Wire-level contract for vector embeddings with one provider.
#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    type Request: Serialize + Send + Sync;

    fn provider(&self) -> Provider;

    fn embedding_model(&self) -> &EmbeddingModel;

    /// Fails with [`LlmError::UnsupportedDimensionality`] when the model
    /// cannot produce the requested length.
    fn build_embedding_request(
        &self,
        request: &EmbeddingRequest,
    ) -> Result<Self::Request, LlmError>;

    async fn send_embedding(&self, request: &Self::Request) -> Result<String, LlmError>;

    fn parse_embedding_response(
        &self,
        body: &str,
        request: &EmbeddingRequest,
    ) -> Result<Vec<f32>, LlmError>;
}

/// Providers that publish metadata about their models.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, LlmError>;

    async fn get_model_info(&self, model: &str) -> Result<ModelInfo, LlmError>;
}
