use dotenv::dotenv;
use llm_api_access::{Message, call_llm};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let messages = vec![
        Message::system("You are a concise, upbeat assistant."),
        Message::user("Share a fun fact about Rust programming."),
    ];

    for provider in ["openai", "gemini", "anthropic"] {
        match call_llm(provider, messages.clone()).await {
            Ok(text) => println!("{provider}:\n{text}\n"),
            Err(e) => println!("{provider} failed: {e}\n"),
        }
    }

    // Unknown identifiers are rejected before anything is sent.
    if let Err(e) = call_llm("invalid_llm", messages).await {
        println!("Expected error: {e}");
    }

    Ok(())
}
