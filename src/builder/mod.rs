//! Probing the CMake toolchain and driving it through the build pipeline.

pub mod capabilities;
pub mod errors;
pub mod pipeline;
pub mod probe;
pub mod retry;
pub mod runner;

pub use capabilities::{Capability, CapabilitySet, VariantFlags};
pub use errors::{AbortError, StepError};
pub use pipeline::{Pipeline, PipelineOptions, Stage, Step, StepAction};
pub use probe::{probe, Probe};
pub use retry::{HostPlatform, RetryPolicy};
pub use runner::{CommandRunner, SystemRunner};
