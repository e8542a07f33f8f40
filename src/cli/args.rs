//! clap-based CLI with subcommands and verbosity control

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// Loan Q&A assistant over your loan records and documents
#[derive(Parser, Debug)]
#[command(name = "loanqa")]
#[command(version)]
#[command(about = "Answer loan questions from indexed records and documents", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Answer language
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Verbosity level: -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Build the vector index from the loan CSV and documents folder
    Index {
        /// Loan records CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Folder of PDF and text documents
        #[arg(long)]
        docs: Option<PathBuf>,
        /// Index output directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Ask one question and print the answer
    Ask {
        question: String,
        /// Passages to retrieve
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Start the interactive chat (default)
    Chat {
        /// Passages to retrieve per question
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Display the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand to run; chat when none is given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Chat { k: None })
    }

    /// Apply flag overrides on top of a loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(language) = &self.language {
            config.generation.language = language.clone();
        }
        if let Some(Commands::Index { csv, docs, out }) = &self.command {
            if let Some(csv) = csv {
                config.corpus.csv_path = csv.clone();
            }
            if let Some(docs) = docs {
                config.corpus.docs_dir = docs.clone();
            }
            if let Some(out) = out {
                config.index.path = out.clone();
            }
        }
    }
}

impl Verbosity {
    /// Progress bars and spinners are hidden in quiet mode
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["loanqa"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["loanqa", "-q"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["loanqa", "-v"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["loanqa", "-vv", "chat"]).verbosity(), Verbosity::VeryVerbose);
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());
    }

    #[test]
    fn test_default_command_is_chat() {
        assert_eq!(parse(&["loanqa"]).command(), Commands::Chat { k: None });
    }

    #[test]
    fn test_ask_with_k() {
        let args = parse(&["loanqa", "ask", "Is credit history important?", "-k", "3"]);
        assert_eq!(
            args.command(),
            Commands::Ask {
                question: "Is credit history important?".to_string(),
                k: Some(3)
            }
        );
    }

    #[test]
    fn test_index_overrides_apply() {
        let args = parse(&[
            "loanqa",
            "--language",
            "Hindi",
            "index",
            "--csv",
            "records.csv",
            "--out",
            "idx",
        ]);
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.corpus.csv_path, PathBuf::from("records.csv"));
        assert_eq!(config.index.path, PathBuf::from("idx"));
        assert_eq!(config.corpus.docs_dir, Config::default().corpus.docs_dir);
        assert_eq!(config.generation.language, "Hindi");
    }

    #[test]
    fn test_missing_question_rejected() {
        assert!(Args::try_parse_from(["loanqa", "ask"]).is_err());
    }
}
