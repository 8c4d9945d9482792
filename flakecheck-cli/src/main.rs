//! flakecheck - Python source checker CLI
//!
//! Reports findings on stdout and failures on stderr, and exits with a
//! status derived from what was reported.

mod cli;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();

    // Initialize logging; RUST_LOG wins over --log-level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let status = cli::run(cli)?;
    Ok(status.into())
}
