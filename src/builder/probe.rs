//! CMake version probing.

use std::path::Path;

use serde::Serialize;

use crate::builder::capabilities::CapabilitySet;
use crate::builder::errors::AbortError;
use crate::builder::runner::CommandRunner;
use crate::core::{is_at_least, parse_version, ParseError, Version};
use crate::util::process::ProcessBuilder;

/// Result of a successful probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub version: Version,
    pub capabilities: CapabilitySet,
}

/// Parse `cmake --version` output into a version.
///
/// Only the first non-empty line is considered.
pub fn parse_version_output(stdout: &str) -> Result<Version, ParseError> {
    let first_line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    parse_version(first_line)
}

/// Run `<cmake> --version` once and derive capabilities.
///
/// Fails when the probe cannot run, its output carries no version, or the
/// version is older than `minimum`. Nothing is retried.
pub fn probe(
    runner: &dyn CommandRunner,
    cmake: &Path,
    minimum: Version,
) -> Result<Probe, AbortError> {
    let cmd = ProcessBuilder::new(cmake).arg("--version");
    let stdout = runner.capture(&cmd).map_err(AbortError::Probe)?;

    let version = parse_version_output(&stdout)?;
    tracing::info!("detected CMake {}", version);

    if !is_at_least(&version, &minimum) {
        return Err(AbortError::UnsupportedVersion {
            detected: version,
            minimum,
        });
    }

    let capabilities = CapabilitySet::from_version(&version);
    for (cap, supported) in capabilities.iter() {
        tracing::debug!("capability {}: {}", cap.as_str(), supported);
    }

    Ok(Probe {
        version,
        capabilities,
    })
}
