//! Configuration file support.
//!
//! Settings are read from `cmake-ci.toml` in the working directory (or a
//! path given with `--config`). Every field has a default, so the file is
//! optional. Action inputs and CLI flags are layered on top by
//! [`crate::ops::ci_build::RunSettings`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::capabilities::{MINIMUM_MULTI_CONFIG, MINIMUM_SINGLE_CONFIG};
use crate::core::{BuildConfiguration, Version};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "cmake-ci.toml";

/// cmake-ci configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cmake: CMakeConfig,
    pub package: PackageConfig,
}

/// Toolchain and generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CMakeConfig {
    /// `cmake` executable
    pub program: PathBuf,

    /// `ctest` executable
    pub ctest: PathBuf,

    /// `cpack` executable
    pub cpack: PathBuf,

    /// Generator name; defaults depend on `multi_config`
    pub generator: Option<String>,

    /// Use one build tree for all configurations
    pub multi_config: bool,

    /// Oldest CMake accepted; defaults depend on `multi_config`
    pub minimum_version: Option<Version>,

    /// Project source directory, relative to the working directory
    pub source_dir: PathBuf,

    /// Configurations to build, in order
    pub configurations: Vec<BuildConfiguration>,
}

impl Default for CMakeConfig {
    fn default() -> Self {
        CMakeConfig {
            program: PathBuf::from("cmake"),
            ctest: PathBuf::from("ctest"),
            cpack: PathBuf::from("cpack"),
            generator: None,
            multi_config: false,
            minimum_version: None,
            source_dir: PathBuf::from("."),
            configurations: BuildConfiguration::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl CMakeConfig {
    /// The generator passed to `-G`.
    pub fn generator(&self) -> &str {
        match self.generator {
            Some(ref g) => g,
            None if self.multi_config => "Ninja Multi-Config",
            None => "Ninja",
        }
    }

    /// The minimum CMake version for this setup.
    pub fn minimum_version(&self) -> Version {
        self.minimum_version.clone().unwrap_or(if self.multi_config {
            MINIMUM_MULTI_CONFIG
        } else {
            MINIMUM_SINGLE_CONFIG
        })
    }
}

/// Packaging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PackageConfig {
    /// Retry a failed `cpack` once on macOS runners
    pub retry_on_macos: bool,
}

impl Default for PackageConfig {
    fn default() -> Self {
        PackageConfig {
            retry_on_macos: true,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load `cmake-ci.toml` from `dir`, or defaults if it doesn't exist.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("no {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            Ok(Self::default())
        }
    }
}
