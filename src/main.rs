//! Stackrun CLI: run fixture stacks against the random provider.

use clap::Parser;
use stackrun::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `stackrun=debug`).
const LOG_ENV: &str = "STACKRUN_LOG";

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = stackrun::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
