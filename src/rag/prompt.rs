//! Prompt strategies and templates
//!
//! Two strategies exist. [`PromptStrategy::WeakContext`] is used when retrieval
//! produced too little text to ground an answer; the model answers as a
//! general advisor. [`PromptStrategy::Grounded`] puts the retrieved passages
//! first and lets the model supplement them.
//!
//! Templates use `{language}`, `{history}`, `{context}` and `{question}`
//! placeholders. Rendering is a single pass, so placeholder-like text inside
//! a question or passage is never expanded.

use serde::{Deserialize, Serialize};

use crate::session::Exchange;

/// Joined context shorter than this (in characters, trimmed) is weak
pub const WEAK_CONTEXT_THRESHOLD: usize = 30;

/// Shown in the history section when there is nothing to show
pub const EMPTY_HISTORY: &str = "(no previous messages)";

/// A named, versioned prompt body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub version: u32,
    pub body: &'static str,
}

pub const WEAK_CONTEXT_TEMPLATE: PromptTemplate = PromptTemplate {
    name: "weak-context",
    version: 1,
    body: "You are an experienced loan advisor. No reference material matched this \
question, so answer from your own general knowledge of loans and lending.\n\n\
Respond in {language} using 150 to 200 words. Organise the answer under short \
section headings, use bullet points for lists and **bold** for key terms.\n\n\
Recent chat:\n{history}\n\n\
Question: {question}\n\
Answer:",
};

pub const GROUNDED_TEMPLATE: PromptTemplate = PromptTemplate {
    name: "grounded",
    version: 1,
    body: "You are a helpful loan approval assistant. Base your answer on the context \
below first and use your own knowledge only to supplement it. If the answer is not \
in the context, say \"I don't know based on the provided information.\"\n\n\
Respond in {language} using 150 to 200 words. Organise the answer under short \
section headings, use bullet points for lists and **bold** for key terms.\n\n\
Context:\n{context}\n\n\
Recent chat:\n{history}\n\n\
Question: {question}\n\
Answer:",
};

/// Prompt strategy chosen from the strength of the retrieved context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStrategy {
    WeakContext,
    Grounded,
}

impl PromptStrategy {
    /// Pick the strategy for an already joined context string
    pub fn select(joined_context: &str) -> Self {
        if is_context_weak(joined_context) {
            PromptStrategy::WeakContext
        } else {
            PromptStrategy::Grounded
        }
    }

    pub fn template(&self) -> &'static PromptTemplate {
        match self {
            PromptStrategy::WeakContext => &WEAK_CONTEXT_TEMPLATE,
            PromptStrategy::Grounded => &GROUNDED_TEMPLATE,
        }
    }
}

/// A rendered prompt and the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub strategy: PromptStrategy,
    pub text: String,
}

pub fn join_context(passages: &[String]) -> String {
    passages.join("\n\n")
}

pub fn is_context_weak(joined: &str) -> bool {
    joined.trim().chars().count() < WEAK_CONTEXT_THRESHOLD
}

/// `User:` / `Bot:` lines for the last `limit` exchanges, oldest first
pub fn format_history(exchanges: &[Exchange], limit: usize) -> String {
    let start = exchanges.len().saturating_sub(limit);
    let recent = &exchanges[start..];
    if recent.is_empty() {
        return EMPTY_HISTORY.to_string();
    }
    recent
        .iter()
        .map(|e| format!("User: {}\nBot: {}", e.input, e.output))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the prompt for `question`
pub fn build_prompt(
    question: &str,
    context: &[String],
    history: &[Exchange],
    history_turns: usize,
    language: &str,
) -> ComposedPrompt {
    let joined = join_context(context);
    let strategy = PromptStrategy::select(&joined);
    let history = format_history(history, history_turns);

    let text = render(
        strategy.template().body,
        &[
            ("language", language),
            ("history", &history),
            ("context", &joined),
            ("question", question.trim()),
        ],
    );

    tracing::debug!(
        strategy = strategy.template().name,
        version = strategy.template().version,
        context_chars = joined.len(),
        "prompt composed"
    );
    ComposedPrompt { strategy, text }
}

/// Substitute `{name}` placeholders in one left-to-right pass
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchanges(n: usize) -> Vec<Exchange> {
        (1..=n)
            .map(|i| Exchange::new(format!("question {}", i), format!("answer {}", i)))
            .collect()
    }

    #[test]
    fn test_weak_context_detection() {
        assert_eq!(PromptStrategy::select(&join_context(&[])), PromptStrategy::WeakContext);
        assert_eq!(
            PromptStrategy::select(&join_context(&["".to_string()])),
            PromptStrategy::WeakContext
        );
        assert_eq!(
            PromptStrategy::select("A good credit history increases your chances."),
            PromptStrategy::Grounded
        );
        assert!(is_context_weak("   short   "));
        assert!(!is_context_weak(&"x".repeat(WEAK_CONTEXT_THRESHOLD)));
    }

    #[test]
    fn test_history_keeps_last_four_in_order() {
        let history = format_history(&exchanges(5), 4);
        assert!(!history.contains("question 1\n"));
        let lines: Vec<&str> = history.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "User: question 2");
        assert_eq!(lines[1], "Bot: answer 2");
        assert_eq!(lines[7], "Bot: answer 5");
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(format_history(&[], 4), EMPTY_HISTORY);
    }

    #[test]
    fn test_grounded_prompt_contains_context_and_question() {
        let context = vec!["A good credit history increases your chances of loan approval.".to_string()];
        let question = "What increases the chances of getting a home loan?";
        let prompt = build_prompt(question, &context, &[], 4, "English");

        assert_eq!(prompt.strategy, PromptStrategy::Grounded);
        assert!(prompt.text.contains(&context[0]));
        assert!(prompt.text.contains(question));
        assert!(prompt.text.contains("Respond in English"));
        assert!(prompt.text.contains("I don't know based on the provided information."));
        assert!(!prompt.text.contains("{context}"));
    }

    #[test]
    fn test_weak_prompt_uses_general_knowledge() {
        let prompt = build_prompt("What is EMI?", &[], &exchanges(1), 4, "Hindi");
        assert_eq!(prompt.strategy, PromptStrategy::WeakContext);
        assert!(prompt.text.contains("general knowledge"));
        assert!(prompt.text.contains("Respond in Hindi"));
        assert!(prompt.text.contains("User: question 1"));
        assert!(!prompt.text.contains("Context:"));
    }

    #[test]
    fn test_render_is_single_pass() {
        let rendered = render(
            "Q: {question} / C: {context} / {unknown}",
            &[("question", "what is {context}?"), ("context", "ctx")],
        );
        assert_eq!(rendered, "Q: what is {context}? / C: ctx / {unknown}");
    }
}
