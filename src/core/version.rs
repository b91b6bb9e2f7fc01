//! Toolchain version numbers.
//!
//! CMake reports its version as free-form text (`cmake version 3.22.1`,
//! `cmake3 version 3.28.0-rc1`, ...). Only the numeric triple matters for
//! capability gating, so pre-release and build metadata are dropped and
//! every parsed [`Version`] orders purely by `(major, minor, patch)`.

use std::num::ParseIntError;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub use semver::Version;

// ASCII digits only; `\d` would also match other Unicode digit classes.
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)\.([0-9]+)\.([0-9]+)").expect("version regex is valid")
});

/// Error returned when no version can be extracted from text.
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
pub enum ParseError {
    #[error("no `major.minor.patch` version found in `{text}`")]
    #[diagnostic(code(cmake_ci::version::not_found))]
    NoVersion { text: String },

    #[error("version component `{component}` in `{text}` is not a valid number")]
    #[diagnostic(code(cmake_ci::version::invalid_component))]
    InvalidComponent {
        text: String,
        component: String,
        #[source]
        source: ParseIntError,
    },
}

/// Extract the first `major.minor.patch` occurrence from `text`.
pub fn parse_version(text: &str) -> Result<Version, ParseError> {
    let caps = VERSION_RE
        .captures(text)
        .ok_or_else(|| ParseError::NoVersion {
            text: text.to_string(),
        })?;

    let component = |idx: usize| -> Result<u64, ParseError> {
        let raw = &caps[idx];
        raw.parse().map_err(|source| ParseError::InvalidComponent {
            text: text.to_string(),
            component: raw.to_string(),
            source,
        })
    };

    Ok(Version::new(component(1)?, component(2)?, component(3)?))
}

/// True iff `version >= minimum`.
pub fn is_at_least(version: &Version, minimum: &Version) -> bool {
    version >= minimum
}
