//! CMake build configurations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A CMake build type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildConfiguration {
    Debug,
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildConfiguration {
    /// Configurations built when nothing else is configured, in run order.
    pub const DEFAULT_ORDER: [BuildConfiguration; 2] =
        [BuildConfiguration::Debug, BuildConfiguration::Release];

    /// The CMake spelling (`CMAKE_BUILD_TYPE`, `--config`, `-C`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildConfiguration::Debug => "Debug",
            BuildConfiguration::Release => "Release",
            BuildConfiguration::RelWithDebInfo => "RelWithDebInfo",
            BuildConfiguration::MinSizeRel => "MinSizeRel",
        }
    }

    /// Lowercase form used in action output names.
    pub fn output_key(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildConfiguration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(BuildConfiguration::Debug),
            "release" => Ok(BuildConfiguration::Release),
            "relwithdebinfo" => Ok(BuildConfiguration::RelWithDebInfo),
            "minsizerel" => Ok(BuildConfiguration::MinSizeRel),
            _ => Err(format!(
                "invalid build configuration '{}'; expected Debug, Release, RelWithDebInfo, or MinSizeRel",
                s
            )),
        }
    }
}
