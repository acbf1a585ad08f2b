pub mod error;
pub mod http;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::LlmError;
pub use http::{HttpClient, HttpClientConfig, RawResponse};
pub use traits::{CompletionAdapter, EmbeddingAdapter, ModelCatalog};
pub use types::{
    ChatRole, EmbeddingModel, EmbeddingRequest, GenerationConfig, Message, ModelInfo,
};
