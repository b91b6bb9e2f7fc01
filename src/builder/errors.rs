//! Error types for probing and running the CMake toolchain.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::builder::pipeline::Stage;
use crate::core::{BuildConfiguration, ParseError, Version};
use crate::util::diagnostic::Diagnostic;

/// Failure of a single subprocess or filesystem step.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum StepError {
    #[error("failed to spawn `{command}`")]
    #[diagnostic(
        code(cmake_ci::step::spawn),
        help("Check that the program is installed and on PATH")
    )]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` {}", describe_exit(.exit_code))]
    #[diagnostic(code(cmake_ci::step::non_zero_exit))]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
    },

    #[error("failed to remove directory `{}`", .path.display())]
    #[diagnostic(code(cmake_ci::step::filesystem))]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("failed with exit code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

impl StepError {
    /// Stable kind name reported to the action host.
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Spawn { .. } => "SpawnError",
            StepError::NonZeroExit { .. } => "NonZeroExitError",
            StepError::Filesystem { .. } => "FilesystemError",
        }
    }
}

/// A fatal error that stops the whole run.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum AbortError {
    #[error("could not determine the CMake version: {0}")]
    #[diagnostic(code(cmake_ci::probe::parse))]
    Parse(#[from] ParseError),

    #[error("CMake {detected} is older than the minimum supported version {minimum}")]
    #[diagnostic(
        code(cmake_ci::probe::unsupported_version),
        help("Install a newer CMake, or lower `minimum-version` in cmake-ci.toml")
    )]
    UnsupportedVersion { detected: Version, minimum: Version },

    #[error("CMake version probe failed: {0}")]
    #[diagnostic(code(cmake_ci::probe::failed))]
    Probe(#[source] StepError),

    #[error("{stage} step failed{}: {source}", for_configuration(.configuration))]
    #[diagnostic(code(cmake_ci::pipeline::step_failed))]
    Stage {
        stage: Stage,
        configuration: Option<BuildConfiguration>,
        #[source]
        source: StepError,
    },

    #[error("failed to publish action outputs: {source}")]
    #[diagnostic(code(cmake_ci::action::output))]
    Output {
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    #[diagnostic(code(cmake_ci::config::invalid))]
    Config(String),
}

fn for_configuration(config: &Option<BuildConfiguration>) -> String {
    match config {
        Some(config) => format!(" for {}", config),
        None => String::new(),
    }
}

impl AbortError {
    /// Stable kind name of the originating error.
    pub fn kind(&self) -> &'static str {
        match self {
            AbortError::Parse(_) => "ParseError",
            AbortError::UnsupportedVersion { .. } => "UnsupportedVersionError",
            AbortError::Probe(step) | AbortError::Stage { source: step, .. } => step.kind(),
            AbortError::Output { .. } => "OutputError",
            AbortError::Config(_) => "ConfigError",
        }
    }

    /// The single-line message reported as the run's failure.
    pub fn failure_message(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }

    /// Convert to a user-facing diagnostic with suggestions.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.failure_message());

        match self {
            AbortError::UnsupportedVersion { minimum, .. } => {
                diag = diag
                    .with_suggestion(format!("Install CMake {} or newer", minimum))
                    .with_suggestion("Lower `minimum-version` in cmake-ci.toml");
            }
            AbortError::Probe(StepError::Spawn { .. })
            | AbortError::Stage {
                source: StepError::Spawn { .. },
                ..
            } => {
                diag = diag.with_suggestion("Check that the program is installed and on PATH");
            }
            AbortError::Stage {
                source: StepError::NonZeroExit { .. },
                configuration: Some(config),
                ..
            } => {
                diag = diag.with_context(format!(
                    "remaining steps for {} and later configurations were skipped",
                    config
                ));
            }
            _ => {}
        }

        diag
    }
}
