//! Send prompts to a local Ollama daemon on the default port.
//!
//! Run with:
//! ```sh
//! ollama pull llama3
//! cargo run --example ollama_completions -- llama3
//! ```

use judge_relay::api::SamplingOptions;
use judge_relay::provider::OllamaAdapter;
use judge_relay::traits::BackendAdapter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let model = std::env::args().nth(1).unwrap_or_else(|| "llama3".to_string());
    let adapter = OllamaAdapter::new(model);

    let prompts = vec![
        "What is the fable involving a fox and grapes?".to_string(),
        "What is the product of 9 and 8?".to_string(),
    ];
    let completions = adapter
        .completions(&prompts, &SamplingOptions::default())
        .await?;

    for (prompt, completion) in prompts.iter().zip(completions) {
        println!("> {prompt}\n{completion}\n");
    }
    Ok(())
}
