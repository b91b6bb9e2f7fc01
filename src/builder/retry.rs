//! Per-step retry policies.

use std::fmt;

use crate::builder::errors::StepError;

/// The operating system of the machine running the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl HostPlatform {
    /// Detect the current platform.
    ///
    /// `RUNNER_OS` (set on GitHub-hosted runners) wins over the compile
    /// target.
    pub fn current() -> Self {
        std::env::var("RUNNER_OS")
            .ok()
            .and_then(|os| Self::from_runner_os(&os))
            .unwrap_or_else(|| Self::from_target_os(std::env::consts::OS))
    }

    /// Map a `RUNNER_OS` value (`Linux`, `macOS`, `Windows`).
    pub fn from_runner_os(os: &str) -> Option<Self> {
        match os.to_lowercase().as_str() {
            "linux" => Some(HostPlatform::Linux),
            "macos" => Some(HostPlatform::MacOs),
            "windows" => Some(HostPlatform::Windows),
            _ => None,
        }
    }

    /// Map a `std::env::consts::OS` value.
    pub fn from_target_os(os: &str) -> Self {
        match os {
            "linux" => HostPlatform::Linux,
            "macos" => HostPlatform::MacOs,
            "windows" => HostPlatform::Windows,
            _ => HostPlatform::Other,
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostPlatform::Linux => "Linux",
            HostPlatform::MacOs => "macOS",
            HostPlatform::Windows => "Windows",
            HostPlatform::Other => "other",
        };
        f.write_str(name)
    }
}

/// Decides whether a failed attempt may run again.
pub type RetryPredicate = fn(HostPlatform, &StepError) -> bool;

/// How many times a step may run, and which failures justify another run.
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub predicate: RetryPredicate,
}

impl RetryPolicy {
    /// Run once; every failure propagates.
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            predicate: |_, _| false,
        }
    }

    /// Retry a failed `cpack` exactly once on macOS.
    ///
    /// The DragNDrop generator's `hdiutil` call intermittently fails with
    /// "Resource busy" on hosted macOS runners.
    pub fn macos_packaging() -> Self {
        RetryPolicy {
            max_attempts: 2,
            predicate: |platform, err| {
                platform == HostPlatform::MacOs && matches!(err, StepError::NonZeroExit { .. })
            },
        }
    }

    /// Whether `attempt` (1-based) failing with `err` may be followed by another.
    pub fn should_retry(&self, attempt: u32, platform: HostPlatform, err: &StepError) -> bool {
        attempt < self.max_attempts && (self.predicate)(platform, err)
    }

    /// Run `op` under this policy.
    pub fn run<T>(
        &self,
        platform: HostPlatform,
        mut op: impl FnMut() -> Result<T, StepError>,
    ) -> Result<T, StepError> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(attempt, platform, &err) => {
                    tracing::warn!(
                        "attempt {} of {} failed on {}: {}; retrying",
                        attempt,
                        self.max_attempts,
                        platform,
                        err
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
