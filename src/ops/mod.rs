//! High-level operations behind the CLI commands.

pub mod ci_build;

pub use ci_build::{probe_toolchain, report_failure, run, RunSettings, RunSummary};
