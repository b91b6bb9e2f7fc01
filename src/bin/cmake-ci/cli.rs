//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// cmake-ci - version-aware CMake build driver for GitHub Actions
#[derive(Parser)]
#[command(name = "cmake-ci")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ./cmake-ci.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe CMake and run the build pipeline
    Run(RunArgs),

    /// Show the detected CMake version and its capabilities
    Probe(ProbeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Flags override the matching action inputs.
#[derive(Args)]
pub struct RunArgs {
    /// Extra arguments for the configure step (whitespace separated)
    #[arg(long, allow_hyphen_values = true)]
    pub cmake_arguments: Option<String>,

    /// Suffix appended to build and install directory names
    #[arg(long)]
    pub suffix: Option<String>,

    /// Run ctest after building
    #[arg(long)]
    pub test: bool,

    /// Run cpack after building
    #[arg(long)]
    pub package: bool,

    /// Install each configuration into its install directory
    #[arg(long)]
    pub install: bool,

    /// Remove build (and install) directories at the end
    #[arg(long)]
    pub cleanup: bool,

    /// Use one multi-config build tree for all configurations
    #[arg(long)]
    pub multi_config: bool,

    /// Project source directory
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Working directory for build and install directories
    #[arg(long, env = "GITHUB_WORKSPACE")]
    pub root: Option<PathBuf>,
}

#[derive(Args)]
pub struct ProbeArgs {
    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
