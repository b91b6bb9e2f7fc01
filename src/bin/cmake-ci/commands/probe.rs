//! `cmake-ci probe` command

use std::path::Path;

use anyhow::Result;

use crate::cli::ProbeArgs;
use crate::commands::{current_dir, load_config};
use cmake_ci::builder::SystemRunner;
use cmake_ci::ops::probe_toolchain;
use cmake_ci::util::process::find_executable;

pub fn execute(args: ProbeArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path, &current_dir()?)?;
    let probe = probe_toolchain(&SystemRunner, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&probe)?);
        return Ok(());
    }

    let program = &config.cmake.program;
    match find_executable(program) {
        Some(path) => println!("CMake:    {}", path.display()),
        None => println!("CMake:    {}", program.display()),
    }
    println!("Version:  {}", probe.version);
    println!("Minimum:  {}", config.cmake.minimum_version());
    println!();
    println!("Capabilities:");
    for (cap, supported) in probe.capabilities.iter() {
        let mark = if supported { "yes" } else { "no" };
        println!("  {:<20} {:<4} (>= {})", cap.as_str(), mark, cap.threshold());
    }

    Ok(())
}
