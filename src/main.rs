//! `autobump` binary entry point

mod cli;

use clap::Parser;
use nix_autobump::error::Error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();
    if let Err(err) = cli::run(args).await {
        report(&err);
        std::process::exit(1);
    }
}

fn report(err: &Error) {
    eprintln!("{err}");
    for line in err.detail_lines() {
        eprintln!("{line}");
    }
}
