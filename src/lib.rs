//! # llm-api-access
//!
//! One call surface for chat completions and embeddings across OpenAI, Gemini
//! and Anthropic. Pick the provider with a string, get text or a vector back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_api_access::{LlmClient, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LlmClient::from_env()?;
//!
//!     let reply = client
//!         .call_llm(
//!             "openai",
//!             vec![
//!                 Message::system("You are a helpful assistant."),
//!                 Message::user("Hello, tell me a joke."),
//!             ],
//!         )
//!         .await?;
//!     println!("{reply}");
//!
//!     let embedding = client.get_embedding("This is a test sentence.", Some(256)).await?;
//!     assert_eq!(embedding.len(), 256);
//!     Ok(())
//! }
//! ```
//!
//! Unknown provider identifiers fail with an error whose message contains
//! `"Invalid LLM type"`. Transient failures (timeouts, connection errors,
//! HTTP 5xx, and HTTP 429 carrying `Retry-After`) are retried with
//! exponential backoff; see [`HttpClientConfig`].

pub mod client;
pub mod core;
pub mod provider;
pub mod registry;

pub use client::{LlmClient, LlmClientBuilder, call_llm, get_embedding};
pub use crate::core::{
    ChatRole, EmbeddingModel, GenerationConfig, HttpClientConfig, LlmError, Message, ModelInfo,
};
pub use provider::{AnthropicConfig, ApiKey, GeminiConfig, OpenAiConfig, Provider};
