//! Shared HTTP transport for all providers.
//!
//! A call here is exactly one attempt. Retrying is the caller's job, see
//! [`crate::core::retry`].

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Serialize;
use tracing::debug;

use super::error::LlmError;

/// Configuration for HTTP client resilience
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Upper bound for a single attempt, including reading the body
    pub timeout: Duration,
    pub max_retries: u32,
    /// Base duration for exponential backoff
    pub initial_retry_delay: Duration,
    /// Cap on the backoff duration
    pub max_retry_delay: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 3,
            initial_retry_delay: Duration::from_millis(500),
            max_retry_delay: Duration::from_secs(10),
        }
    }
}

/// Outcome of an attempt that reached the provider.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
    pub retry_after: Option<Duration>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Thin wrapper around a pooled `reqwest::Client`.
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: &HttpClientConfig, user_agent: Option<&str>) -> Result<Self, LlmError> {
        let default_ua = format!("llm-api-access/{}", env!("CARGO_PKG_VERSION"));
        let ua = user_agent.unwrap_or(&default_ua);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(ua)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to build reqwest client: {e}")))?;

        Ok(Self { client })
    }

    /// POST a JSON body once.
    #[tracing::instrument(
        name = "http_post_json",
        level = "debug",
        skip(self, headers, body),
        fields(url = %url),
        err
    )]
    pub async fn post_json<Req>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<RawResponse, LlmError>
    where
        Req: Serialize + ?Sized,
    {
        let mut req_builder = self.client.post(url).json(body);
        for (name, value) in headers {
            req_builder = req_builder.header(name, value);
        }
        self.execute(req_builder).await
    }

    /// GET once.
    #[tracing::instrument(
        name = "http_get",
        level = "debug",
        skip(self, headers),
        fields(url = %url),
        err
    )]
    pub async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<RawResponse, LlmError> {
        let mut req_builder = self.client.get(url);
        for (name, value) in headers {
            req_builder = req_builder.header(name, value);
        }
        self.execute(req_builder).await
    }

    async fn execute(&self, req_builder: reqwest::RequestBuilder) -> Result<RawResponse, LlmError> {
        let res = req_builder.send().await.map_err(transport_error)?;

        let status = res.status();
        let retry_after = parse_retry_after(res.headers());
        let body = res.text().await.map_err(transport_error)?;

        debug!(status = %status, bytes = body.len(), "HTTP response received");

        Ok(RawResponse {
            status,
            body,
            retry_after,
        })
    }
}

fn transport_error(e: reqwest::Error) -> LlmError {
    // reqwest includes the URL in its message; keys are never part of a URL here.
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "failed to connect".to_string()
    } else {
        "request failed".to_string()
    };

    LlmError::Transport {
        message,
        source: Some(Box::new(e)),
    }
}

/// Only the delta-seconds form of `Retry-After` is honored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
