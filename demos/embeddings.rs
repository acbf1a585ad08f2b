use dotenv::dotenv;
use llm_api_access::{LlmClient, get_embedding};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let text = "This is a test sentence.";

    let native = get_embedding(text, None).await?;
    println!("openai, native size: {} dimensions", native.len());

    let short = get_embedding(text, Some(256)).await?;
    println!("openai, shortened: {} dimensions", short.len());

    let client = LlmClient::from_env()?;
    let gemini = client.get_embedding_with("gemini", text, Some(768)).await?;
    let head: Vec<f32> = gemini.iter().take(4).copied().collect();
    println!("gemini: {} dimensions, head {:?}", gemini.len(), head);

    // Larger than the model can produce: rejected locally.
    match client.get_embedding(text, Some(10_000)).await {
        Ok(_) => println!("unexpected success"),
        Err(e) => println!("Expected error: {e}"),
    }

    Ok(())
}
