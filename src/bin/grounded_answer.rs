use anyhow::Context;

use chatrag::llm::ChatMessage;
use chatrag::rag::Retriever;
use chatrag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize()?;

    let url = state.config.loader.url.clone();
    let store = state
        .build_store(&url)
        .await
        .with_context(|| format!("Failed to index {}", url))?;
    let docs = state
        .retriever(store)
        .retrieve("ライセンス形式は？")
        .await
        .context("Retrieval failed")?;

    let answerer = state.answerer();
    let messages = vec![ChatMessage::user("LangChainのライセンス形式は？")];

    let grounded = answerer
        .answer(&messages, &docs)
        .await
        .context("Answer with context failed")?;
    println!("{}", grounded);

    // No context: the model should refuse.
    let ungrounded = answerer
        .answer(&messages, &[])
        .await
        .context("Answer without context failed")?;
    println!("{}", ungrounded);

    Ok(())
}
