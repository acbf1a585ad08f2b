use dotenv::dotenv;
use llm_api_access::{HttpClientConfig, LlmClient, Message};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // RUST_LOG=llm_api_access=debug shows every attempt and retry.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let messages = vec![Message::user(
        "Tell me a random interesting fact about space.",
    )];

    // A strict per-attempt timeout. Timeouts count as transient and are retried.
    let strict = LlmClient::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    match strict.call_llm("openai", messages.clone()).await {
        Ok(text) => println!("Success (Simple): {text}"),
        Err(e) => println!("Error (Simple): {e}"),
    }

    // Custom policy for flaky networks or rate-limited environments
    let resilient_config = HttpClientConfig {
        timeout: Duration::from_secs(10),
        // Retries on timeouts, connection errors, 5xx and rate limits that send Retry-After
        max_retries: 5,
        // 2s, then 4s, then 8s...
        initial_retry_delay: Duration::from_secs(2),
        // ...never more than 15s between attempts
        max_retry_delay: Duration::from_secs(15),
    };

    let resilient = LlmClient::builder().http_config(resilient_config).build()?;

    match resilient.call_llm("openai", messages).await {
        Ok(text) => println!("Success (Advanced): {text}"),
        Err(e) => println!("Error (Advanced): {e}"),
    }

    Ok(())
}
