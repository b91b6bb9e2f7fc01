//! cmake-ci - version-aware CMake build driver for GitHub Actions
//!
//! This crate probes the installed CMake, derives which command-line
//! features it supports, and drives `cmake`, `ctest` and `cpack` through
//! configure, build, test, package, install and cleanup for each build
//! configuration.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test doubles for the command runner and the action host.
#[cfg(test)]
pub mod test_support;

pub use builder::{AbortError, CapabilitySet, Pipeline, StepError};
pub use core::{BuildConfiguration, Layout, Version};
pub use util::action::{ActionHost, ActionInputs, GithubActions};
