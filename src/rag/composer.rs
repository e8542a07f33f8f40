// Answer composer: prompt -> generation client -> cleaned answer
use std::sync::Arc;

use crate::errors::{ErrorKind, Result};
use crate::generation::GenerationClient;
use crate::rag::prompt::{build_prompt, PromptStrategy};
use crate::session::Exchange;

/// Returned in place of an answer when generation fails transiently
pub const APOLOGY_MESSAGE: &str =
    "Sorry, I couldn't generate an answer right now. Please try again in a moment.";

/// How an answer was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Generated,
    /// Generation failed; the text is [`APOLOGY_MESSAGE`]
    Fallback { error_code: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub strategy: PromptStrategy,
    pub outcome: AnswerOutcome,
}

impl Answer {
    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, AnswerOutcome::Fallback { .. })
    }
}

pub struct AnswerComposer {
    client: Arc<dyn GenerationClient>,
    language: String,
    history_turns: usize,
}

impl AnswerComposer {
    pub fn new(client: Arc<dyn GenerationClient>, language: impl Into<String>, history_turns: usize) -> Self {
        Self {
            client,
            language: language.into(),
            history_turns,
        }
    }

    /// Compose an answer to `question` from `context` and recent `history`
    ///
    /// Configuration failures are returned as errors. Every other failure
    /// becomes an apology answer tagged [`AnswerOutcome::Fallback`].
    pub async fn compose(&self, question: &str, context: &[String], history: &[Exchange]) -> Result<Answer> {
        let prompt = build_prompt(question, context, history, self.history_turns, &self.language);

        match self.client.generate(&prompt.text).await {
            Ok(text) => Ok(Answer {
                text: text.trim().to_string(),
                strategy: prompt.strategy,
                outcome: AnswerOutcome::Generated,
            }),
            Err(e) if e.kind() == ErrorKind::Configuration => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, code = e.error_code(), "generation failed, answering with apology");
                Ok(Answer {
                    text: APOLOGY_MESSAGE.to_string(),
                    strategy: prompt.strategy,
                    outcome: AnswerOutcome::Fallback {
                        error_code: e.error_code(),
                    },
                })
            }
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// Exchanges of history included in each prompt
    pub fn history_turns(&self) -> usize {
        self.history_turns
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LoanQaError;
    use crate::generation::MockGenerationClient;

    fn context() -> Vec<String> {
        vec!["A good credit history increases your chances of loan approval.".to_string()]
    }

    #[tokio::test]
    async fn test_compose_trims_generated_text() {
        let mut client = MockGenerationClient::new();
        client
            .expect_generate()
            .withf(|prompt: &str| prompt.contains("credit history"))
            .times(1)
            .returning(|_| Ok("  **Credit** matters.\n".to_string()));

        let composer = AnswerComposer::new(Arc::new(client), "English", 4);
        let answer = composer.compose("Does credit matter?", &context(), &[]).await.unwrap();
        assert_eq!(answer.text, "**Credit** matters.");
        assert_eq!(answer.strategy, PromptStrategy::Grounded);
        assert_eq!(answer.outcome, AnswerOutcome::Generated);
    }

    #[tokio::test]
    async fn test_transient_failure_becomes_apology() {
        let mut client = MockGenerationClient::new();
        client
            .expect_generate()
            .returning(|_| Err(LoanQaError::Timeout { duration_ms: 30_000 }));

        let composer = AnswerComposer::new(Arc::new(client), "English", 4);
        let answer = composer.compose("What is EMI?", &[], &[]).await.unwrap();
        assert_eq!(answer.text, APOLOGY_MESSAGE);
        assert_eq!(answer.strategy, PromptStrategy::WeakContext);
        assert!(answer.is_fallback());
        assert_eq!(answer.outcome, AnswerOutcome::Fallback { error_code: "TIMEOUT" });
    }

    #[tokio::test]
    async fn test_empty_response_becomes_apology() {
        let mut client = MockGenerationClient::new();
        client.expect_generate().returning(|_| Err(LoanQaError::EmptyResponse));

        let composer = AnswerComposer::new(Arc::new(client), "English", 4);
        let answer = composer.compose("q", &context(), &[]).await.unwrap();
        assert!(answer.is_fallback());
    }

    #[tokio::test]
    async fn test_configuration_failure_propagates() {
        let mut client = MockGenerationClient::new();
        client.expect_generate().returning(|_| {
            Err(LoanQaError::CredentialRejected {
                status: 403,
                message: "API key not valid".to_string(),
            })
        });

        let composer = AnswerComposer::new(Arc::new(client), "English", 4);
        let err = composer.compose("q", &context(), &[]).await.unwrap_err();
        assert!(matches!(err, LoanQaError::CredentialRejected { .. }));
    }
}
