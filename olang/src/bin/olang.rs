// src/bin/olang.rs

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use olang::cli::Cli;
use olang::commands::compile::compile_command;

fn main() -> ExitCode {
    // Tracing is opt-in through OLANG_LOG, e.g. OLANG_LOG=debug.
    if let Ok(filter) = EnvFilter::try_from_env("OLANG_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();
    compile_command(cli.input.as_deref(), cli.output.as_deref())
}
