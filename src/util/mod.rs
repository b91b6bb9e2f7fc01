//! Shared utilities

pub mod action;
pub mod config;
pub mod diagnostic;
pub mod fs;
pub mod process;

pub use action::{ActionHost, ActionInputs, GithubActions};
pub use config::Config;
pub use diagnostic::Diagnostic;
pub use process::ProcessBuilder;
