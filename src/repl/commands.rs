//! Built-in REPL commands
//!
//! Anything starting with `/` is a command; everything else is a question.

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::errors::ErrorKind;
use crate::rag::LoanAssistant;
use crate::repl::display::DisplayManager;
use crate::session::{export_session, ChatSession};

const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History { limit: Option<usize> },
    Context,
    Upload { path: Option<PathBuf> },
    Export { path: Option<PathBuf> },
    Reset,
    Status,
    Language { name: Option<String> },
    Clear,
    Exit,
    Unknown { input: String },
}

/// Parses and runs commands against the current session
#[derive(Debug, Default)]
pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        CommandHandler
    }

    pub fn parse(&self, input: &str) -> Command {
        let trimmed = input.trim();
        let Some(body) = trimmed.strip_prefix('/') else {
            return Command::Unknown { input: input.to_string() };
        };

        let (name, rest) = match body.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (body, ""),
        };
        let path_arg = || (!rest.is_empty()).then(|| PathBuf::from(rest));

        match name.to_lowercase().as_str() {
            "help" | "h" => Command::Help,
            "exit" | "quit" | "q" => Command::Exit,
            "history" => Command::History {
                limit: rest.parse().ok(),
            },
            "context" | "ctx" => Command::Context,
            "upload" => Command::Upload { path: path_arg() },
            "export" => Command::Export { path: path_arg() },
            "reset" => Command::Reset,
            "status" => Command::Status,
            "language" | "lang" => Command::Language {
                name: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "clear" | "cls" => Command::Clear,
            _ => Command::Unknown { input: input.to_string() },
        }
    }

    /// Run `command`; returns false when the REPL should exit
    pub fn execute(
        &self,
        command: Command,
        assistant: &mut LoanAssistant,
        session: &mut ChatSession,
        display: &DisplayManager,
    ) -> Result<bool> {
        match command {
            Command::Help => self.show_help(),
            Command::Exit => {
                println!("{}", "Goodbye!".green());
                return Ok(false);
            }
            Command::History { limit } => {
                display.show_history(session.turns(), limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
            }
            Command::Context => display.show_context(session.last_context().unwrap_or_default()),
            Command::Upload { path: None } => display.show_warning("Usage: /upload <path to .pdf or .txt>"),
            Command::Upload { path: Some(path) } => match assistant.ingest_document(session, &path) {
                Ok(report) => display.show_ingested(&report),
                Err(e) if e.kind() == ErrorKind::InvalidInput => display.show_warning(&e.to_string()),
                Err(e) => display.show_error(&e.to_string()),
            },
            Command::Export { path: None } => display.show_warning("Usage: /export <file path>"),
            Command::Export { path: Some(path) } => match export_session(session, &path) {
                Ok(written) => display.show_success(&format!("Chat exported to {}", written.display())),
                Err(e) => display.show_error(&e.to_string()),
            },
            Command::Reset => {
                session.reset();
                display.show_info("Conversation cleared. Uploaded documents remain available.");
            }
            Command::Status => display.show_status(&self.status_lines(assistant, session)),
            Command::Language { name: None } => display.show_info(&format!(
                "Answering in {}. Usage: /language <name>",
                assistant.language()
            )),
            Command::Language { name: Some(name) } => {
                assistant.set_language(name.as_str());
                display.show_success(&format!("Answers will now be in {}", name));
            }
            Command::Clear => display.clear_screen(),
            Command::Unknown { input } => {
                println!("{}", format!("Unknown command: {}", input).red());
                println!("Type {} for available commands", "/help".cyan());
            }
        }
        Ok(true)
    }

    fn status_lines(&self, assistant: &LoanAssistant, session: &ChatSession) -> Vec<(&'static str, String)> {
        let uploaded = session.uploaded_documents();
        vec![
            ("Session", session.id().to_string()),
            ("Started", session.started_at().format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            ("Questions", session.turns().len().to_string()),
            ("Memory", format!("{} exchanges", session.memory().len())),
            ("Model", assistant.composer().model().to_string()),
            ("Language", assistant.language().to_string()),
            ("Top k", assistant.search_params().top_k.to_string()),
            ("Indexed chunks", assistant.active_index(session).len().to_string()),
            (
                "Uploaded",
                if uploaded.is_empty() {
                    "none".to_string()
                } else {
                    uploaded.join(", ")
                },
            ),
        ]
    }

    fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(64).cyan());

        let commands = [
            ("/help, /h", "Show this help message"),
            ("/history [n]", "Show the last n questions (default: 10)"),
            ("/context, /ctx", "Show passages behind the last answer"),
            ("/upload <path>", "Add a PDF or text file to this session"),
            ("/export <path>", "Save the chat (.json for structured output)"),
            ("/reset", "Clear the conversation"),
            ("/status", "Show session details"),
            ("/language <name>", "Answer in another language"),
            ("/clear, /cls", "Clear screen"),
            ("/exit, /quit, /q", "Exit"),
        ];
        for (cmd, desc) in commands {
            println!("  {:<20} {}", cmd.green(), desc);
        }

        println!("\n{}", "Usage:".bold());
        println!("  - Type a question directly (no / prefix)");
        println!("  - Use {} for input history", "UP/DOWN arrows".cyan());
        println!("  - Press {} or {} to exit", "Ctrl-D".cyan(), "/exit".cyan());
        println!();
    }
}

/// True if `input` is a command rather than a question
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}
