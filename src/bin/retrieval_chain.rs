use anyhow::Context;

use chatrag::llm::ChatMessage;
use chatrag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize()?;

    let url = state.config.loader.url.clone();
    let store = state
        .build_store(&url)
        .await
        .with_context(|| format!("Failed to index {}", url))?;
    let chain = state.last_message_chain(state.retriever(store));

    for question in [
        "LangChainのライセンス形式は？",
        "転生したらスライムだった件の作者は誰？",
    ] {
        let output = chain
            .invoke(vec![ChatMessage::user(question)])
            .await
            .with_context(|| format!("Chain failed for: {}", question))?;
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
