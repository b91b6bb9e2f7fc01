//! The `cmake-ci run` operation.
//!
//! Probes CMake, plans the pipeline for the configured variant, executes
//! it, and publishes the output directories once every configuration has
//! finished.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::builder::capabilities::VariantFlags;
use crate::builder::errors::AbortError;
use crate::builder::pipeline::{Pipeline, PipelineOptions};
use crate::builder::probe::{probe, Probe};
use crate::builder::retry::{HostPlatform, RetryPolicy};
use crate::builder::runner::CommandRunner;
use crate::core::{Layout, Version};
use crate::util::action::{ActionHost, ActionInputs};
use crate::util::config::Config;

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Working directory; build and install directories are created here.
    pub root: PathBuf,
    pub config: Config,
    pub inputs: ActionInputs,
    pub platform: HostPlatform,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub version: Version,
    pub outputs: Vec<(String, PathBuf)>,
}

impl RunSettings {
    pub fn new(root: impl Into<PathBuf>, config: Config, inputs: ActionInputs) -> Self {
        RunSettings {
            root: root.into(),
            config,
            inputs,
            platform: HostPlatform::current(),
        }
    }

    fn validate(&self) -> Result<(), AbortError> {
        let configs = &self.config.cmake.configurations;
        if configs.is_empty() {
            return Err(AbortError::Config(
                "at least one build configuration is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for config in configs {
            if !seen.insert(config) {
                return Err(AbortError::Config(format!(
                    "build configuration `{}` is listed more than once",
                    config
                )));
            }
        }

        Layout::check_suffix(&self.inputs.output_directories_suffix).map_err(AbortError::Config)
    }

    fn is_multi_config(&self) -> bool {
        self.config.cmake.multi_config
    }

    /// Directory layout for this run.
    pub fn layout(&self) -> Layout {
        Layout::new(
            &self.root,
            &self.inputs.output_directories_suffix,
            self.is_multi_config(),
        )
    }

    fn pipeline_options(&self) -> PipelineOptions {
        let cmake = &self.config.cmake;
        PipelineOptions {
            cmake: cmake.program.clone(),
            ctest: cmake.ctest.clone(),
            cpack: cmake.cpack.clone(),
            generator: cmake.generator().to_string(),
            source_dir: if cmake.source_dir == Path::new(".") {
                self.root.clone()
            } else {
                self.root.join(&cmake.source_dir)
            },
            configurations: cmake.configurations.clone(),
            cmake_arguments: self.inputs.cmake_arguments.clone(),
            package_retry: if self.config.package.retry_on_macos {
                RetryPolicy::macos_packaging()
            } else {
                RetryPolicy::none()
            },
        }
    }

    fn flags(&self, probe: &Probe) -> VariantFlags {
        VariantFlags {
            multi_config_generator: self.is_multi_config(),
            has_test_step: self.inputs.test,
            has_package_step: self.inputs.package,
            has_install_step: self.inputs.install,
            has_cleanup_step: self.inputs.perform_cleanup,
            ..VariantFlags::from_capabilities(&probe.capabilities)
        }
    }
}

/// Probe CMake with the configured program and minimum version.
pub fn probe_toolchain(runner: &dyn CommandRunner, config: &Config) -> Result<Probe, AbortError> {
    probe(
        runner,
        &config.cmake.program,
        config.cmake.minimum_version(),
    )
}

/// Run the whole pipeline.
pub fn run(
    host: &mut dyn ActionHost,
    runner: &dyn CommandRunner,
    settings: &RunSettings,
) -> Result<RunSummary, AbortError> {
    settings.validate()?;

    let probe = probe_toolchain(runner, &settings.config)?;

    if settings.is_multi_config()
        && settings.config.cmake.generator() == "Ninja Multi-Config"
        && !probe.capabilities.multi_config_ninja
    {
        return Err(AbortError::Config(format!(
            "the Ninja Multi-Config generator needs CMake 3.17.0 or newer, found {}",
            probe.version
        )));
    }

    let layout = settings.layout();
    let pipeline = Pipeline::new(settings.pipeline_options(), settings.flags(&probe), layout);

    tracing::info!(
        "building {} configuration(s) with {}",
        pipeline.configurations().len(),
        settings.config.cmake.generator()
    );
    pipeline.execute(runner, host, settings.platform)?;

    let outputs = pipeline
        .layout()
        .outputs(pipeline.configurations(), settings.inputs.install);
    publish_outputs(host, &outputs)?;

    Ok(RunSummary {
        version: probe.version,
        outputs,
    })
}

fn publish_outputs(host: &mut dyn ActionHost, outputs: &[(String, PathBuf)]) -> Result<(), AbortError> {
    let values: Vec<(String, String)> = outputs
        .iter()
        .map(|(name, path)| {
            tracing::info!("{} = {}", name, path.display());
            (name.clone(), path_value(path))
        })
        .collect();

    host.set_outputs(&values)
        .map_err(|source| AbortError::Output { source })
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Report `err` as the run's single failure message.
pub fn report_failure(host: &mut dyn ActionHost, err: &AbortError) {
    let message = err.failure_message();
    tracing::error!("{}", message);
    host.set_failed(&message);
}
