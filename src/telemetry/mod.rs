//! Log output setup
//!
//! Library code emits `tracing` events; the binary installs one fmt
//! subscriber. `RUST_LOG` wins over the verbosity flags when set.

use tracing_subscriber::EnvFilter;

use crate::cli::Verbosity;

/// Default filter directive for a verbosity level
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "loanqa=info,warn",
        Verbosity::VeryVerbose => "loanqa=debug,info",
    }
}

/// Install the global subscriber; later calls are no-ops
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
