//! loanqa - CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use loanqa::cli::{Args, Commands, Verbosity};
use loanqa::embedding::MiniLmEmbedder;
use loanqa::index::build_corpus_index;
use loanqa::repl::{DisplayManager, ReplSession};
use loanqa::{telemetry, ChatSession, Config, ErrorKind, LoanAssistant, LoanQaError};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    telemetry::init(args.verbosity());

    if let Err(e) = run(&args).await {
        report_error(&e);
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_to(&mut config);

    match args.command() {
        Commands::Index { .. } => run_index(&config, args.verbosity()),
        Commands::Ask { question, k } => run_ask(&config, &question, k, args.verbosity()).await,
        Commands::Chat { k } => run_chat(&config, k, args.verbosity()).await,
        Commands::Config => show_config(&config),
    }
}

fn spinner(message: &str, verbosity: Verbosity) -> ProgressBar {
    if !verbosity.show_progress() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn run_index(config: &Config, verbosity: Verbosity) -> Result<()> {
    let pb = spinner("Loading embedding model...", verbosity);
    let embedder = MiniLmEmbedder::from_hub(&config.embedding.model_id);
    pb.finish_and_clear();
    let embedder = embedder.context("Failed to load embedding model")?;

    let summary = build_corpus_index(config, &embedder, verbosity.show_progress())?;

    println!(
        "{} Indexed {} chunks ({} dims) in {:.1}s",
        "✓".green(),
        summary.chunk_count.to_string().bold(),
        summary.dimension,
        summary.elapsed.as_secs_f64()
    );
    println!("  Saved to {}", summary.path.display().to_string().dimmed());
    Ok(())
}

async fn load_assistant(config: &Config, verbosity: Verbosity) -> Result<LoanAssistant> {
    let pb = spinner("Loading index and connecting to the model...", verbosity);
    let assistant = LoanAssistant::from_config(config).await;
    pb.finish_and_clear();
    Ok(assistant?)
}

async fn run_ask(config: &Config, question: &str, k: Option<usize>, verbosity: Verbosity) -> Result<()> {
    let assistant = load_assistant(config, verbosity).await?;
    let mut session = ChatSession::new();
    let k = k.unwrap_or(config.retrieval.top_k);

    let mut display = DisplayManager::new();
    if verbosity.show_progress() {
        display.start_spinner("Retrieving relevant information...");
    }
    let turn = assistant.ask_top_k(&mut session, question, k).await;
    display.finish_current();
    let turn = turn?;

    display.show_answer(&turn.answer);
    if matches!(verbosity, Verbosity::Verbose | Verbosity::VeryVerbose) {
        display.show_context(&turn.context);
    }
    Ok(())
}

async fn run_chat(config: &Config, k: Option<usize>, verbosity: Verbosity) -> Result<()> {
    let assistant = load_assistant(config, verbosity).await?;
    let top_k = k.unwrap_or(config.retrieval.top_k);

    let mut repl = ReplSession::new(assistant, Some(config.history_path()))?.with_top_k(top_k);
    repl.show_welcome(env!("CARGO_PKG_VERSION"));
    repl.run().await
}

fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", "Effective configuration:".bold().cyan());
    println!("{}", rendered);
    Ok(())
}

/// Print an error, with a hint for configuration problems
fn report_error(error: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), error);

    let Some(e) = error.downcast_ref::<LoanQaError>() else {
        return;
    };
    let hint = match e {
        LoanQaError::MissingCredential { var } => {
            Some(format!("Set {} in your environment or in a .env file.", var))
        }
        LoanQaError::IndexNotFound { .. } => Some("Build the index first with `loanqa index`.".to_string()),
        LoanQaError::IndexModelMismatch { .. } => {
            Some("Rebuild the index with `loanqa index` after changing the embedding model.".to_string())
        }
        LoanQaError::CorpusNotFound { .. } => {
            Some("Point corpus.csv_path at your loan records or pass --csv.".to_string())
        }
        LoanQaError::DocumentUnreadable { .. } => Some(
            "Fix or remove the document, or set corpus.skip_unreadable_documents = true.".to_string(),
        ),
        _ if e.kind() == ErrorKind::Configuration => Some("Check your configuration and API key.".to_string()),
        _ => None,
    };
    if let Some(hint) = hint {
        eprintln!("  {}", hint.yellow());
    }
}
