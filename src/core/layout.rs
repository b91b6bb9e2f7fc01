//! Build and install directory layout.
//!
//! Every directory is a pure function of the working root, the optional
//! suffix, and the configuration, so the same inputs always produce the
//! same paths and two configurations never share a directory they write
//! configuration-specific output into. Multi-config runs use the fixed
//! names `build` and `install-<Config>`; the suffix only applies to
//! single-config runs.

use std::path::PathBuf;

use super::configuration::BuildConfiguration;

/// Directory layout for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    suffix: String,
    multi_config: bool,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>, multi_config: bool) -> Self {
        Layout {
            root: root.into(),
            suffix: suffix.into(),
            multi_config,
        }
    }

    /// Check that `suffix` stays a plain name fragment.
    ///
    /// Path separators or `..` would let two configurations resolve to the
    /// same directory, or escape the working root.
    pub fn check_suffix(suffix: &str) -> Result<(), String> {
        if suffix.contains(['/', '\\']) {
            return Err(format!(
                "output directories suffix `{}` must not contain path separators",
                suffix
            ));
        }
        if suffix.contains("..") {
            return Err(format!(
                "output directories suffix `{}` must not contain `..`",
                suffix
            ));
        }
        Ok(())
    }

    fn suffix(&self) -> &str {
        if self.multi_config {
            ""
        } else {
            &self.suffix
        }
    }

    /// Build directory for `config`.
    ///
    /// Multi-config generators share one build tree across configurations.
    pub fn build_dir(&self, config: BuildConfiguration) -> PathBuf {
        if self.multi_config {
            self.shared_build_dir()
        } else {
            self.root
                .join(format!("build-{}{}", config.as_str(), self.suffix()))
        }
    }

    /// The single build tree used by multi-config generators.
    pub fn shared_build_dir(&self) -> PathBuf {
        self.root.join(format!("build{}", self.suffix()))
    }

    /// Install prefix for `config`.
    pub fn install_dir(&self, config: BuildConfiguration) -> PathBuf {
        self.root
            .join(format!("install-{}{}", config.as_str(), self.suffix()))
    }

    /// Action outputs describing this layout, in publication order.
    pub fn outputs(
        &self,
        configs: &[BuildConfiguration],
        include_install: bool,
    ) -> Vec<(String, PathBuf)> {
        let mut outputs = Vec::new();

        if self.multi_config {
            outputs.push(("build-directory".to_string(), self.shared_build_dir()));
        } else {
            for config in configs {
                outputs.push((
                    format!("build-directory-{}", config.output_key()),
                    self.build_dir(*config),
                ));
            }
        }

        if include_install {
            for config in configs {
                outputs.push((
                    format!("install-directory-{}", config.output_key()),
                    self.install_dir(*config),
                ));
            }
        }

        outputs
    }
}
