//! Core data types: versions, build configurations, and directory layout.

pub mod configuration;
pub mod layout;
pub mod version;

pub use configuration::BuildConfiguration;
pub use layout::Layout;
pub use version::{is_at_least, parse_version, ParseError, Version};
