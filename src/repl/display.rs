//! Display manager for the chat REPL
//!
//! Colored banners and answers, spinners for the slow stages.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::rag::{Answer, AskStage, IngestReport, PromptStrategy};
use crate::session::ConversationTurn;

const RULE_WIDTH: usize = 64;

pub struct DisplayManager {
    current_spinner: Option<ProgressBar>,
    tick: Duration,
}

impl DisplayManager {
    pub fn new() -> Self {
        DisplayManager {
            current_spinner: None,
            tick: Duration::from_millis(100),
        }
    }

    fn rule(&self) -> ColoredString {
        "=".repeat(RULE_WIDTH).cyan()
    }

    /// Welcome banner
    pub fn show_banner(&self, version: &str, model: &str, chunks: usize) {
        println!("\n{}", self.rule());
        println!("{}", format!("  Loan Q&A Assistant {}", version).bold().cyan());
        println!(
            "{}",
            format!("  Model: {} | Indexed chunks: {}", model, chunks).dimmed()
        );
        println!("{}\n", self.rule());
        println!(
            "Ask a question about loans (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Start a spinner for one pipeline stage, replacing any running one
    pub fn start_stage(&mut self, stage: AskStage) {
        let message = match stage {
            AskStage::Retrieving => "Retrieving relevant information...",
            AskStage::Generating => "Generating answer...",
        };
        self.start_spinner(message);
    }

    pub fn start_spinner(&mut self, message: &str) {
        self.finish_current();
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(self.tick);
        self.current_spinner = Some(pb);
    }

    /// Handle to the running spinner, for updates from callbacks
    pub fn spinner(&self) -> Option<&ProgressBar> {
        self.current_spinner.as_ref()
    }

    pub fn finish_current(&mut self) {
        if let Some(pb) = self.current_spinner.take() {
            pb.finish_and_clear();
        }
    }

    pub fn show_answer(&self, answer: &Answer) {
        println!();
        if answer.is_fallback() {
            println!("{} {}", "Bot:".yellow().bold(), answer.text.yellow());
        } else {
            println!("{}", "Bot:".green().bold());
            println!("{}", answer.text);
            if answer.strategy == PromptStrategy::WeakContext {
                println!(
                    "{}",
                    "(no closely matching reference material; answered from general knowledge)".dimmed()
                );
            }
        }
        println!();
    }

    pub fn show_context(&self, passages: &[String]) {
        if passages.is_empty() {
            println!("{}", "No context retrieved yet.".yellow());
            return;
        }
        println!("\n{}", format!("Context for last answer ({} passages):", passages.len()).bold().cyan());
        println!("{}", self.rule());
        for (i, passage) in passages.iter().enumerate() {
            println!("  {}. {}", (i + 1).to_string().cyan(), passage);
        }
        println!();
    }

    /// Most recent `limit` turns, oldest first
    pub fn show_history(&self, turns: &[ConversationTurn], limit: usize) {
        if turns.is_empty() {
            println!("{}", "No questions asked yet.".yellow());
            return;
        }
        let start = turns.len().saturating_sub(limit);
        println!("\n{}", format!("Chat History (last {}):", turns.len() - start).bold().cyan());
        println!("{}", self.rule());
        for (i, turn) in turns.iter().enumerate().skip(start) {
            println!("  {}. {} {}", (i + 1).to_string().cyan(), "You:".bold(), turn.question);
            println!("     {} {}", "Bot:".bold(), turn.answer_text().dimmed());
        }
        println!();
    }

    pub fn show_status(&self, lines: &[(&str, String)]) {
        println!("\n{}", "Session Status:".bold().cyan());
        println!("{}", self.rule());
        for (label, value) in lines {
            println!("  {:<18} {}", format!("{}:", label), value.green());
        }
        println!();
    }

    pub fn show_ingested(&self, report: &IngestReport) {
        println!(
            "{} Added {} ({} chunks). Session index now holds {} chunks.",
            "✓".green(),
            report.document.bold(),
            report.chunks,
            report.index_size
        );
    }

    pub fn show_success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn show_info(&self, message: &str) {
        println!("{}", message.cyan());
    }

    pub fn show_error(&self, error: &str) {
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    pub fn clear_screen(&self) {
        print!("\x1B[2J\x1B[1;1H");
        let _ = io::stdout().flush();
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}
