//! `cmake-ci run` command

use std::path::Path;

use anyhow::Result;

use crate::cli::RunArgs;
use crate::commands::{current_dir, load_config};
use cmake_ci::builder::SystemRunner;
use cmake_ci::ops::{report_failure, run, RunSettings};
use cmake_ci::util::action::{split_arguments, ActionHost, ActionInputs, GithubActions};
use cmake_ci::util::Config;

pub fn execute(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let mut host = GithubActions::from_env();

    let settings = match resolve_settings(args, config_path, &host) {
        Ok(settings) => settings,
        Err(e) => {
            host.set_failed(&format!("ConfigError: {:#}", e));
            return Err(e);
        }
    };

    match run(&mut host, &SystemRunner, &settings) {
        Ok(summary) => {
            eprintln!(
                "    Finished {} configuration(s) with CMake {}",
                settings.config.cmake.configurations.len(),
                summary.version
            );
            Ok(())
        }
        Err(err) => {
            report_failure(&mut host, &err);
            Err(err.into())
        }
    }
}

/// Merge config file, action inputs and CLI flags (later wins).
fn resolve_settings(args: RunArgs, config_path: Option<&Path>, host: &dyn ActionHost) -> Result<RunSettings> {
    let root = match args.root {
        Some(root) => root,
        None => current_dir()?,
    };

    let mut config: Config = load_config(config_path, &root)?;
    if args.multi_config {
        config.cmake.multi_config = true;
    }
    if let Some(dir) = args.source_dir {
        config.cmake.source_dir = dir;
    }

    let mut inputs = ActionInputs::from_host(host);
    if let Some(raw) = args.cmake_arguments {
        inputs.cmake_arguments = split_arguments(&raw);
    }
    if let Some(suffix) = args.suffix {
        inputs.output_directories_suffix = suffix;
    }
    inputs.test |= args.test;
    inputs.package |= args.package;
    inputs.install |= args.install;
    inputs.perform_cleanup |= args.cleanup;

    Ok(RunSettings::new(root, config, inputs))
}
