use anyhow::Context;

use chatrag::rag::Retriever;
use chatrag::state::AppState;

const SOURCE_URL: &str = "https://docs.smith.langchain.com/user_guide";
const QUERY: &str = "how can langsmith help with testing?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize()?;

    let raw_docs = state
        .load(SOURCE_URL)
        .await
        .with_context(|| format!("Failed to load {}", SOURCE_URL))?;
    println!("{}", serde_json::to_string_pretty(&raw_docs)?);

    let splits = state.splitter()?.split_documents(&raw_docs);
    println!("{}", serde_json::to_string_pretty(&splits)?);

    let store = state.index(splits).await.context("Failed to embed chunks")?;
    let docs = state
        .retriever(store)
        .retrieve(QUERY)
        .await
        .context("Retrieval failed")?;
    println!("{}", serde_json::to_string_pretty(&docs)?);

    Ok(())
}
