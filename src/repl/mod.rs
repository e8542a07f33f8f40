//! Interactive chat REPL
//!
//! Questions go through the [`LoanAssistant`] pipeline and are recorded on
//! a single [`ChatSession`]; lines starting with `/` are built-in commands.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use std::path::PathBuf;

use crate::errors::ErrorKind;
use crate::rag::{Answer, AnswerOutcome, LoanAssistant};
use crate::repl::commands::{is_command, CommandHandler};
pub use crate::repl::display::DisplayManager;
use crate::repl::input::{InputEvent, InputHandler};
use crate::session::ChatSession;

/// REPL session coordinator
pub struct ReplSession {
    assistant: LoanAssistant,
    session: ChatSession,
    input_handler: InputHandler,
    command_handler: CommandHandler,
    display_manager: DisplayManager,
    top_k: usize,
}

impl ReplSession {
    pub fn new(assistant: LoanAssistant, history_path: Option<PathBuf>) -> Result<Self> {
        let input_handler = match history_path {
            Some(path) => InputHandler::with_history(path)?,
            None => InputHandler::new()?,
        };
        let top_k = assistant.search_params().top_k;

        Ok(ReplSession {
            assistant,
            session: ChatSession::new(),
            input_handler,
            command_handler: CommandHandler::new(),
            display_manager: DisplayManager::new(),
            top_k,
        })
    }

    /// Override the number of passages retrieved per question
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn show_welcome(&self, version: &str) {
        self.display_manager.show_banner(
            version,
            self.assistant.composer().model(),
            self.assistant.base_index().len(),
        );
    }

    /// Read-eval-print until `/exit` or Ctrl-D
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let line = match self.input_handler.read_line()? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted => continue,
                InputEvent::Eof => break,
            };
            if !self.handle_input(&line).await? {
                break;
            }
        }
        self.save()
    }

    /// Handle one line; returns false when the REPL should exit
    pub async fn handle_input(&mut self, input: &str) -> Result<bool> {
        if input.trim().is_empty() {
            return Ok(true);
        }

        if is_command(input) {
            let command = self.command_handler.parse(input);
            return self.command_handler.execute(
                command,
                &mut self.assistant,
                &mut self.session,
                &self.display_manager,
            );
        }

        self.ask(input).await;
        Ok(true)
    }

    async fn ask(&mut self, question: &str) {
        let display = std::sync::Mutex::new(&mut self.display_manager);
        let result = self
            .assistant
            .ask_observed(&mut self.session, question, self.top_k, |stage| {
                if let Ok(mut d) = display.lock() {
                    d.start_stage(stage);
                }
            })
            .await;

        let display = match display.into_inner() {
            Ok(d) => d,
            Err(poisoned) => poisoned.into_inner(),
        };
        display.finish_current();

        match result {
            Ok(turn) => {
                if let Some(code) = fallback_code(&turn.answer) {
                    tracing::debug!(code, "answer served from fallback");
                }
                display.show_answer(&turn.answer);
            }
            Err(e) if e.kind() == ErrorKind::InvalidInput => display.show_warning(&e.to_string()),
            Err(e) => display.show_error(&e.to_string()),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn assistant(&self) -> &LoanAssistant {
        &self.assistant
    }

    /// Persist input history
    pub fn save(&mut self) -> Result<()> {
        self.input_handler.save_history()
    }
}

fn fallback_code(answer: &Answer) -> Option<&'static str> {
    match answer.outcome {
        AnswerOutcome::Fallback { error_code } => Some(error_code),
        AnswerOutcome::Generated => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::embedding::Embedder;
    use crate::index::VectorIndex;
    use crate::test_support::{KeywordEmbedder, ScriptedClient};
    use std::sync::Arc;

    fn repl() -> ReplSession {
        let embedder = Arc::new(KeywordEmbedder::new());
        let mut index = VectorIndex::new(embedder.model_id(), embedder.dimension());
        let text = "A good credit history increases your chances of loan approval.";
        index.add(text, embedder.embed(text).unwrap()).unwrap();
        let assistant = LoanAssistant::new(
            Arc::new(index),
            embedder,
            Arc::new(ScriptedClient::answering("Credit history matters.")),
            &Config::default(),
        )
        .unwrap();
        ReplSession::new(assistant, None).unwrap()
    }

    #[tokio::test]
    async fn test_question_is_recorded() {
        let mut repl = repl();
        assert!(repl.handle_input("Does credit history matter?").await.unwrap());
        assert_eq!(repl.session().turns().len(), 1);
        assert_eq!(repl.session().turns()[0].answer_text(), "Credit history matters.");
        assert_eq!(repl.session().contexts().len(), 1);
    }

    #[tokio::test]
    async fn test_commands_and_empty_input() {
        let mut repl = repl();
        assert!(repl.handle_input("   ").await.unwrap());
        assert!(repl.handle_input("/status").await.unwrap());
        repl.handle_input("What is a loan?").await.unwrap();
        assert!(repl.handle_input("/reset").await.unwrap());
        assert!(repl.session().turns().is_empty());
        assert!(!repl.handle_input("/exit").await.unwrap());
    }
}
