//! Version-gated CMake capabilities.
//!
//! Capabilities are facts derived from the detected CMake version, not
//! configuration. Each one is granted by a single threshold, so derivation
//! is monotonic: a newer CMake never loses a capability.

use serde::{Deserialize, Serialize};

use crate::core::{is_at_least, Version};

/// Oldest CMake supported with a single-config generator.
pub const MINIMUM_SINGLE_CONFIG: Version = Version::new(3, 16, 0);

/// Oldest CMake supported with `Ninja Multi-Config`.
pub const MINIMUM_MULTI_CONFIG: Version = Version::new(3, 17, 0);

/// A version-gated CMake feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// `ctest --test-dir <dir>`
    TestDir,
    /// `cmake --install <dir>`
    NativeInstall,
    /// The `Ninja Multi-Config` generator
    MultiConfigNinja,
}

impl Capability {
    pub const ALL: [Capability; 3] = [
        Capability::TestDir,
        Capability::NativeInstall,
        Capability::MultiConfigNinja,
    ];

    /// First CMake release providing this capability.
    pub fn threshold(&self) -> Version {
        match self {
            Capability::TestDir => Version::new(3, 20, 0),
            Capability::NativeInstall => Version::new(3, 15, 0),
            Capability::MultiConfigNinja => Version::new(3, 17, 0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TestDir => "test-dir",
            Capability::NativeInstall => "native-install",
            Capability::MultiConfigNinja => "multi-config-ninja",
        }
    }
}

/// Capabilities of one detected CMake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CapabilitySet {
    pub test_dir: bool,
    pub native_install: bool,
    pub multi_config_ninja: bool,
}

impl CapabilitySet {
    /// Derive capabilities from a parsed version.
    pub fn from_version(version: &Version) -> Self {
        let has = |cap: Capability| is_at_least(version, &cap.threshold());
        CapabilitySet {
            test_dir: has(Capability::TestDir),
            native_install: has(Capability::NativeInstall),
            multi_config_ninja: has(Capability::MultiConfigNinja),
        }
    }

    pub fn supports(&self, cap: Capability) -> bool {
        match cap {
            Capability::TestDir => self.test_dir,
            Capability::NativeInstall => self.native_install,
            Capability::MultiConfigNinja => self.multi_config_ninja,
        }
    }

    /// `(capability, supported)` pairs in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (Capability, bool)> + '_ {
        Capability::ALL.into_iter().map(move |cap| (cap, self.supports(cap)))
    }
}

/// Everything that selects the shape of the pipeline.
///
/// The first two flags come from the probed [`CapabilitySet`], the rest
/// from configuration and action inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VariantFlags {
    pub supports_test_dir: bool,
    pub supports_native_install: bool,
    pub multi_config_generator: bool,
    pub has_test_step: bool,
    pub has_package_step: bool,
    pub has_install_step: bool,
    pub has_cleanup_step: bool,
}

impl VariantFlags {
    /// Flags with capability bits taken from `caps` and every step off.
    pub fn from_capabilities(caps: &CapabilitySet) -> Self {
        VariantFlags {
            supports_test_dir: caps.test_dir,
            supports_native_install: caps.native_install,
            ..Default::default()
        }
    }
}
