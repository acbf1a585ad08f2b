use std::time::Duration;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn status_suffix(status_code: &Option<u16>) -> String {
    status_code.map(|c| format!(" ({c})")).unwrap_or_default()
}

#[derive(Error, Debug)]
pub enum LlmError {
    /// The provider identifier is unknown, or the provider cannot serve the
    /// requested operation. Callers match on the "Invalid LLM type" prefix.
    #[error("Invalid LLM type '{provider}': {reason}")]
    InvalidProvider {
        provider: String,
        reason: &'static str,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Provider error{}: {message}", status_suffix(.status_code))]
    Provider {
        message: String,
        status_code: Option<u16>,
        /// Delay the provider asked for before the next attempt.
        retry_after: Option<Duration>,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error(
        "Unsupported dimensionality: {provider} model '{model}' produces at most {max} dimensions, {requested} requested"
    )]
    UnsupportedDimensionality {
        provider: String,
        model: String,
        requested: u32,
        max: u32,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    pub(crate) fn invalid_provider(provider: &str, reason: &'static str) -> Self {
        LlmError::InvalidProvider {
            provider: provider.to_string(),
            reason,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        LlmError::MalformedResponse {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn malformed_json(message: impl Into<String>, source: serde_json::Error) -> Self {
        LlmError::MalformedResponse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether another attempt with the same request may succeed.
    ///
    /// Network failures, timeouts and server errors (5xx) are transient. A
    /// rate limit (429) is transient only when the provider sent a retry
    /// hint. Everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Transport { .. } => true,
            LlmError::Provider {
                status_code: Some(status),
                retry_after,
                ..
            } => (500..600).contains(status) || (*status == 429 && retry_after.is_some()),
            _ => false,
        }
    }

    /// Status code reported by the provider, if the failure came from one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::Provider { status_code, .. } => *status_code,
            _ => None,
        }
    }

    pub(crate) fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::Provider { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}
