use robin_core::{Context, Message};

/// Shared persona, prepended to every strategy's instructions.
const PERSONA: &str = "You are ROBIN, a concise conversational assistant. \
Answer in plain text, without markdown headings.";

const DIRECT_INSTRUCTIONS: &str = "Answer the user's message directly. \
Do not ask follow-up questions; they are added separately.";

const CONTEXT_INSTRUCTIONS: &str = "The user's message refers to earlier conversation. \
Use the context below to answer. If the context does not contain the answer, say so plainly.";

const INVESTIGATION_INSTRUCTIONS: &str = "The user's message cannot be answered from what you know. \
Either ask exactly one short clarifying question, or, if the request needs a person \
(escalation, account changes, refunds), say that it is being flagged for a human and what \
information they should have ready. Never invent facts.";

/// Which reply strategy a prompt is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Direct,
    Contextual,
    Investigation,
}

/// Build the system prompt for a strategy. `context` is only used by
/// `PromptKind::Contextual`.
pub fn system_prompt(kind: PromptKind, context: Option<&Context>) -> String {
    let instructions = match kind {
        PromptKind::Direct => DIRECT_INSTRUCTIONS,
        PromptKind::Contextual => CONTEXT_INSTRUCTIONS,
        PromptKind::Investigation => INVESTIGATION_INSTRUCTIONS,
    };

    let mut out = format!("{PERSONA}\n\n{instructions}");
    if let (PromptKind::Contextual, Some(ctx)) = (kind, context) {
        let rendered = ctx.render();
        if !rendered.is_empty() {
            out.push_str("\n\n## Context\n");
            out.push_str(&rendered);
        }
    }
    out
}

/// User-side prompt: the message text, stamped with its timestamp when known.
pub fn user_prompt(message: &Message) -> String {
    match message.timestamp {
        Some(at) => format!("[{}] {}", at.format("%Y-%m-%d %H:%M UTC"), message.text),
        None => message.text.clone(),
    }
}
