use dotenv::dotenv;
use llm_api_access::{GeminiConfig, GenerationConfig, LlmClient, Message};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let client = LlmClient::builder()
        .gemini(GeminiConfig::default().with_generation_config(
            GenerationConfig::new()
                .with_temperature(0.7)
                .with_max_tokens(200),
        ))
        .build()?;

    let mut messages = vec![
        Message::system("You are a storyteller. Keep every line under 30 words."),
        Message::user("Write the first line of a story about a magic backpack."),
    ];

    let first = client.call_llm("gemini", messages.clone()).await?;
    println!("Gemini: {first}");

    messages.push(Message::assistant(first));
    messages.push(Message::user("Now write the second line."));

    let second = client.call_llm("gemini", messages).await?;
    println!("Gemini: {second}");

    let joke = client
        .send_single_message("anthropic", "Tell me a one-line joke about compilers.")
        .await?;
    println!("Anthropic: {joke}");

    Ok(())
}
