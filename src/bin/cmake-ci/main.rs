//! cmake-ci CLI - version-aware CMake build driver for GitHub Actions

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use cmake_ci::util::diagnostic::emit;
use cmake_ci::AbortError;

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<AbortError>() {
            Some(abort) => emit(&abort.to_diagnostic(), std::io::stderr().is_terminal()),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging; CMAKE_CI_LOG overrides the verbosity flag
    let filter = EnvFilter::try_from_env("CMAKE_CI_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cmake_ci=debug")
        } else {
            EnvFilter::new("cmake_ci=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, config),
        Commands::Probe(args) => commands::probe::execute(args, config),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
