//! Model input for a grounded answer.

use crate::llm::PromptMessage;
use crate::widget::Message;

/// Reply for a question the context cannot answer.
pub const UNKNOWN_ANSWER: &str = "I don't know based on the provided context.";

/// Instructions placed ahead of the retrieved context.
pub const SYSTEM_PROMPT: &str = concat!(
    "You are a friendly, conversational assistant that always considers the full chat history.\n",
    "\n",
    "1) If the user simply greets you (\"hi\", \"hello\", \"hey\"), reply exactly:\n",
    "   \"Hello! How can I assist you today?\"\n",
    "2) If the user asks a meta-question about our conversation\n",
    "   (e.g. \"what did I just ask?\", \"what questions have I asked?\"), answer from the prior turns.\n",
    "3) Otherwise, for any factual question, answer only from the context below.\n",
    "   If the answer cannot be found there, reply exactly:\n",
    "   \"I don't know based on the provided context.\"\n",
    "\n",
    "Always paraphrase and speak naturally; do not quote verbatim.\n",
);

/// System prompt, then the prior conversation, then the new question.
#[must_use]
pub fn build_prompt(history: &[Message], context: &[String], query: &str) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(system_prompt(context)));
    messages.extend(history.iter().map(PromptMessage::from));
    messages.push(PromptMessage::user(query));
    messages
}

fn system_prompt(context: &[String]) -> String {
    format!("{SYSTEM_PROMPT}\n---\nContext:\n{}", context.join("\n\n"))
}
