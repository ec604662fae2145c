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
    let retriever = state.retriever(store);

    let question = ChatMessage::user("LangChainのライセンス形式は？");
    let previous_answer = ChatMessage::assistant("LangChainのライセンス形式はMITライセンスです。");
    let follow_up = ChatMessage::user("もっと教えて");

    // Searching with the bare follow-up finds nothing useful.
    let last_message = state.last_message_chain(retriever.clone());
    for messages in [vec![question.clone()], vec![follow_up.clone()]] {
        let output = last_message
            .invoke(messages)
            .await
            .context("Last-message chain failed")?;
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    let history = vec![question.clone(), previous_answer.clone(), follow_up.clone()];
    let query = state
        .query_rewriter()
        .rewrite(&history)
        .await
        .context("Query rewrite failed")?;
    println!("{}", query);

    let conversational = state.conversational_chain(retriever);
    let conversations = [
        vec![question.clone()],
        history.clone(),
        vec![
            question,
            previous_answer,
            follow_up,
            ChatMessage::user("転生したらスライムだった件の作者は誰？"),
        ],
    ];
    for messages in conversations {
        let output = conversational
            .invoke(messages)
            .await
            .context("Conversational chain failed")?;
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
