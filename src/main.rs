mod cli;
mod corrector;
mod metrics;
mod model;
mod storage;
mod text_summary;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_silent = args.silent;
    init_tracing(args.debug);

    match cli::run(args) {
        Ok(()) => Ok(()),
        Err(e) => {
            if is_silent {
                eprintln!("{:#}", e);
                std::process::exit(1);
            } else {
                Err(e)
            }
        }
    }
}
