use crate::llm::ChatMessage;
use crate::rag::Document;

const CONTEXT_SLOT: &str = "{context}";
const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Retrieved chunk texts joined into one context block.
pub fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.page_content.as_str())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// Fill every `{context}` slot of the answer template.
pub fn render_system_prompt(template: &str, context: &str) -> String {
    template.replace(CONTEXT_SLOT, context)
}

/// `[system(template + context)] + history`
pub fn build_answer_messages(
    template: &str,
    documents: &[Document],
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let context = format_documents(documents);
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(render_system_prompt(template, &context)));
    messages.extend(history.iter().cloned());
    messages
}

/// `history + [user(instruction)]`
pub fn build_rewrite_messages(history: &[ChatMessage], instruction: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(instruction));
    messages
}
