//! Command execution seam.
//!
//! The pipeline and the prober only talk to a [`CommandRunner`], which lets
//! tests script toolchain behaviour without spawning anything.

use crate::builder::errors::StepError;
use crate::util::process::ProcessBuilder;

/// Runs one subprocess at a time.
pub trait CommandRunner {
    /// Run with inherited stdio; fail on spawn error or non-zero exit.
    fn run(&self, cmd: &ProcessBuilder) -> Result<(), StepError>;

    /// Run with stdout captured and return it.
    fn capture(&self, cmd: &ProcessBuilder) -> Result<String, StepError>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<(), StepError> {
        tracing::debug!("running `{}`", cmd.display_command());
        cmd.exec_inherited()
    }

    fn capture(&self, cmd: &ProcessBuilder) -> Result<String, StepError> {
        tracing::debug!("capturing `{}`", cmd.display_command());
        cmd.exec_capture()
    }
}
