//! Transport shared by every provider adapter.
//!
//! A [`ProviderClient`] owns the provider configuration, the resolved
//! credential and a pooled HTTP client. It performs single attempts and turns
//! non-2xx replies into [`LlmError::Provider`].

use std::fmt;

use serde::Serialize;

use crate::core::{HttpClient, HttpClientConfig, LlmError, RawResponse};

use super::{Provider, snippet};

/// Where a provider's API key comes from.
#[derive(Clone, Default)]
pub enum ApiKey {
    /// Read the provider's environment variable, e.g. `OPENAI_API_KEY`.
    #[default]
    Default,
    Custom(String),
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKey::Default => write!(f, "ApiKey::Default"),
            ApiKey::Custom(_) => write!(f, "ApiKey::Custom(<redacted>)"),
        }
    }
}

impl ApiKey {
    /// Blank keys count as missing.
    fn resolve(&self, env_var: &str) -> Option<String> {
        let key = match self {
            ApiKey::Default => std::env::var(env_var).ok(),
            ApiKey::Custom(key) => Some(key.clone()),
        };
        key.filter(|k| !k.trim().is_empty())
    }
}

/// Per-provider settings the shared transport needs.
pub trait ProviderConfig: Send + Sync {
    /// Model Provider
    fn provider(&self) -> Provider;

    /// Base URL for the API (e.g., `https://api.openai.com/v1`)
    fn base_url(&self) -> &str;

    fn api_key(&self) -> &ApiKey;

    /// Authentication header for a resolved key as (name, value)
    fn auth_header(&self, key: &str) -> (String, String);

    /// Additional headers to include with each request
    fn extra_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Extract the human-readable message from the provider's error payload.
    fn error_message(&self, body: &str) -> Option<String>;

    fn user_agent(&self) -> String {
        format!("llm-api-access/{}", env!("CARGO_PKG_VERSION"))
    }
}

pub struct ProviderClient<P: ProviderConfig> {
    pub config: P,
    api_key: Option<String>,
    http: HttpClient,
}

impl<P: ProviderConfig> fmt::Debug for ProviderClient<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &self.config.provider())
            .field("base_url", &self.config.base_url())
            .field("has_api_key", &self.has_api_key())
            .finish()
    }
}

impl<P: ProviderConfig> ProviderClient<P> {
    /// Resolve the credential and build the HTTP client. A missing key is not
    /// an error here; calls fail later with [`LlmError::Configuration`].
    pub fn new(config: P, http_config: &HttpClientConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key()
            .resolve(config.provider().default_api_key_env_var());
        let http = HttpClient::new(http_config, Some(&config.user_agent()))?;

        Ok(Self {
            config,
            api_key,
            http,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url().trim_end_matches('/'), endpoint)
    }

    fn headers(&self) -> Result<Vec<(String, String)>, LlmError> {
        let provider = self.config.provider();
        let key = self.api_key.as_deref().ok_or_else(|| {
            LlmError::Configuration(format!(
                "{provider} API key not set; export {} or configure ApiKey::Custom",
                provider.default_api_key_env_var()
            ))
        })?;

        let mut headers = vec![self.config.auth_header(key)];
        headers.extend(self.config.extra_headers());
        Ok(headers)
    }

    /// POST a JSON payload to `endpoint` once and return the success body.
    pub async fn post_json<Req>(&self, endpoint: &str, body: &Req) -> Result<String, LlmError>
    where
        Req: Serialize + Sync + ?Sized,
    {
        let headers = self.headers()?;
        let res = self.http.post_json(&self.url(endpoint), &headers, body).await?;
        self.success_body(res)
    }

    /// GET `endpoint` once and return the success body.
    pub async fn get(&self, endpoint: &str) -> Result<String, LlmError> {
        let headers = self.headers()?;
        let res = self.http.get(&self.url(endpoint), &headers).await?;
        self.success_body(res)
    }

    fn success_body(&self, res: RawResponse) -> Result<String, LlmError> {
        if res.is_success() {
            return Ok(res.body);
        }

        let provider = self.config.provider();
        let detail = self
            .config
            .error_message(&res.body)
            .unwrap_or_else(|| snippet(&res.body));

        Err(LlmError::Provider {
            message: format!("{provider} API returned {}: {detail}", res.status),
            status_code: Some(res.status.as_u16()),
            retry_after: res.retry_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AnthropicConfig, OpenAiConfig};

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::Custom("sk-very-secret".to_string());
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_custom_api_key_ignores_environment() {
        let key = ApiKey::Custom("explicit".to_string());
        assert_eq!(
            key.resolve("LLM_API_ACCESS_TEST_UNSET_VAR").as_deref(),
            Some("explicit")
        );
        assert_eq!(ApiKey::Default.resolve("LLM_API_ACCESS_TEST_UNSET_VAR"), None);
    }

    #[test]
    fn test_client_reports_key_presence_without_revealing_it() {
        let config = OpenAiConfig::new(ApiKey::Custom("sk-very-secret".to_string()));
        let client = ProviderClient::new(config, &HttpClientConfig::default()).unwrap();

        assert!(client.has_api_key());
        let rendered = format!("{client:?}");
        assert!(rendered.contains("has_api_key: true"));
        assert!(!rendered.contains("sk-very-secret"));
    }

    #[test]
    fn test_missing_key_fails_on_use_with_configuration_error() {
        let config = AnthropicConfig::new(ApiKey::Custom(String::new()));
        let client = ProviderClient::new(config, &HttpClientConfig::default()).unwrap();

        assert!(!client.has_api_key());
        match client.headers() {
            Err(LlmError::Configuration(message)) => {
                assert!(message.contains("ANTHROPIC_API_KEY"))
            }
            other => panic!("Expected Configuration error, got {:?}", other),
        }
    }
}
