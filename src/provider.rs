mod constants;
pub(crate) mod anthropic;
pub(crate) mod client;
pub(crate) mod gemini;
pub(crate) mod openai;

pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use client::{ApiKey, ProviderClient, ProviderConfig};
pub use gemini::{GeminiConfig, GeminiProvider};
pub use openai::{OpenAiConfig, OpenAiProvider};

use crate::core::{ChatRole, EmbeddingModel, LlmError, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAI,
    Gemini,
    Anthropic,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAI => write!(f, "OpenAI"),
            Provider::Gemini => write!(f, "Gemini"),
            Provider::Anthropic => write!(f, "Anthropic"),
        }
    }
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::OpenAI, Provider::Gemini, Provider::Anthropic];

    /// The identifier callers pass to select this provider.
    pub fn id(&self) -> &'static str {
        match self {
            Provider::OpenAI => constants::openai::ID,
            Provider::Gemini => constants::gemini::ID,
            Provider::Anthropic => constants::anthropic::ID,
        }
    }

    /// Exact, case-sensitive lookup of a provider identifier.
    pub fn from_id(id: &str) -> Option<Provider> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Get the default environment variable name for this provider's API key
    pub fn default_api_key_env_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => constants::openai::API_KEY_ENV_VAR,
            Provider::Gemini => constants::gemini::API_KEY_ENV_VAR,
            Provider::Anthropic => constants::anthropic::API_KEY_ENV_VAR,
        }
    }
}

/// Split a conversation for providers that carry system text outside the
/// turn list. System messages are joined by a blank line in their original
/// order; the remaining turns keep their relative order.
pub(crate) fn fold_system_messages(
    provider: Provider,
    messages: &[Message],
) -> Result<(Option<String>, Vec<&Message>), LlmError> {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .collect();

    let turns: Vec<&Message> = messages
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .collect();

    if turns.is_empty() {
        return Err(LlmError::InvalidRequest(format!(
            "{provider} needs at least one user or assistant message besides system messages"
        )));
    }

    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    Ok((system, turns))
}

/// Resolve the vector length an embedding call must return.
pub(crate) fn expected_dimensions(
    provider: Provider,
    model: &EmbeddingModel,
    requested: Option<u32>,
) -> Result<u32, LlmError> {
    match requested {
        None => Ok(model.dimensions),
        Some(0) => Err(LlmError::InvalidRequest(
            "target dimensionality must be a positive integer".to_string(),
        )),
        Some(d) if d > model.dimensions => Err(LlmError::UnsupportedDimensionality {
            provider: provider.to_string(),
            model: model.name.clone(),
            requested: d,
            max: model.dimensions,
        }),
        Some(d) => Ok(d),
    }
}

/// Reject vectors whose length or contents do not match the request.
pub(crate) fn check_embedding(values: Vec<f32>, expected: u32) -> Result<Vec<f32>, LlmError> {
    if values.len() != expected as usize {
        return Err(LlmError::malformed(format!(
            "expected an embedding of {expected} dimensions, got {}",
            values.len()
        )));
    }

    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(LlmError::malformed(format!(
            "embedding value at index {index} is not a finite number"
        )));
    }

    Ok(values)
}

/// Shorten an error body for inclusion in a message.
pub(crate) fn snippet(body: &str) -> String {
    const MAX_CHARS: usize = 300;
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_CHARS).collect();
        format!("{cut}…")
    }
}
