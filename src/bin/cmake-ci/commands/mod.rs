//! Command implementations

pub mod completions;
pub mod probe;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::Result;
use cmake_ci::util::config::Config;

/// Load the config named on the command line, or `cmake-ci.toml` in `dir`.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<Config> {
    match explicit {
        Some(path) => Config::load(path),
        None => Config::load_from_dir(dir),
    }
}

/// The current working directory.
pub fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?)
}
