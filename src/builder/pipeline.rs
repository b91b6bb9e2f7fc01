//! The configure → build → test → package/install → cleanup pipeline.
//!
//! The whole run is planned up front as an ordered list of [`Step`]s, then
//! executed strictly in order. The first failing step aborts everything
//! after it; directories written by earlier steps are left in place.

use std::fmt;
use std::path::PathBuf;

use crate::builder::capabilities::VariantFlags;
use crate::builder::errors::{AbortError, StepError};
use crate::builder::retry::{HostPlatform, RetryPolicy};
use crate::builder::runner::CommandRunner;
use crate::core::{BuildConfiguration, Layout};
use crate::util::action::ActionHost;
use crate::util::fs::remove_dirs_concurrently;
use crate::util::process::ProcessBuilder;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Configure,
    Build,
    Test,
    Package,
    Install,
    Cleanup,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::Build => "build",
            Stage::Test => "test",
            Stage::Package => "package",
            Stage::Install => "install",
            Stage::Cleanup => "cleanup",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Stage::Configure => "Configure",
            Stage::Build => "Build",
            Stage::Test => "Test",
            Stage::Package => "Package",
            Stage::Install => "Install",
            Stage::Cleanup => "Cleanup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed inputs of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub cmake: PathBuf,
    pub ctest: PathBuf,
    pub cpack: PathBuf,
    pub generator: String,
    pub source_dir: PathBuf,
    pub configurations: Vec<BuildConfiguration>,
    /// Appended verbatim to the configure invocation.
    pub cmake_arguments: Vec<String>,
    pub package_retry: RetryPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            cmake: PathBuf::from("cmake"),
            ctest: PathBuf::from("ctest"),
            cpack: PathBuf::from("cpack"),
            generator: "Ninja".to_string(),
            source_dir: PathBuf::from("."),
            configurations: BuildConfiguration::DEFAULT_ORDER.to_vec(),
            cmake_arguments: Vec::new(),
            package_retry: RetryPolicy::macos_packaging(),
        }
    }
}

/// What a step does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Run(ProcessBuilder),
    /// Removed concurrently; the step waits for all of them.
    RemoveDirs(Vec<PathBuf>),
}

/// One planned unit of work.
#[derive(Debug, Clone)]
pub struct Step {
    pub stage: Stage,
    /// `None` for steps shared by all configurations.
    pub configuration: Option<BuildConfiguration>,
    pub action: StepAction,
    pub retry: RetryPolicy,
}

impl Step {
    fn new(stage: Stage, configuration: Option<BuildConfiguration>, action: StepAction) -> Self {
        Step {
            stage,
            configuration,
            action,
            retry: RetryPolicy::none(),
        }
    }

    fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Log group title, e.g. `Build Release`.
    pub fn title(&self) -> String {
        match self.configuration {
            Some(config) => format!("{} {}", self.stage.title(), config),
            None => self.stage.title().to_string(),
        }
    }

    /// The command this step runs, if it runs one.
    pub fn command(&self) -> Option<&ProcessBuilder> {
        match self.action {
            StepAction::Run(ref cmd) => Some(cmd),
            StepAction::RemoveDirs(_) => None,
        }
    }
}

/// A planned pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PipelineOptions,
    flags: VariantFlags,
    layout: Layout,
}

impl Pipeline {
    pub fn new(options: PipelineOptions, flags: VariantFlags, layout: Layout) -> Self {
        Pipeline {
            options,
            flags,
            layout,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn configurations(&self) -> &[BuildConfiguration] {
        &self.options.configurations
    }

    /// Every step of the run, in execution order.
    pub fn plan(&self) -> Vec<Step> {
        let mut steps = Vec::new();
        let multi = self.flags.multi_config_generator;

        if multi {
            steps.push(Step::new(
                Stage::Configure,
                None,
                StepAction::Run(self.configure_multi()),
            ));
        }

        for &config in &self.options.configurations {
            if !multi {
                steps.push(Step::new(
                    Stage::Configure,
                    Some(config),
                    StepAction::Run(self.configure_single(config)),
                ));
            }

            steps.push(Step::new(
                Stage::Build,
                Some(config),
                StepAction::Run(self.build(config)),
            ));

            if self.flags.has_test_step {
                steps.push(Step::new(
                    Stage::Test,
                    Some(config),
                    StepAction::Run(self.test(config)),
                ));
            }

            if self.flags.has_package_step {
                steps.push(
                    Step::new(
                        Stage::Package,
                        Some(config),
                        StepAction::Run(self.package(config)),
                    )
                    .with_retry(self.options.package_retry),
                );
            }

            if self.flags.has_install_step {
                steps.push(Step::new(
                    Stage::Install,
                    Some(config),
                    StepAction::Run(self.install(config)),
                ));
            }

            if self.flags.has_cleanup_step && !multi {
                let mut dirs = vec![self.layout.build_dir(config)];
                if self.flags.has_install_step {
                    dirs.push(self.layout.install_dir(config));
                }
                steps.push(Step::new(
                    Stage::Cleanup,
                    Some(config),
                    StepAction::RemoveDirs(dirs),
                ));
            }
        }

        if self.flags.has_cleanup_step && multi {
            let mut dirs = vec![self.layout.shared_build_dir()];
            if self.flags.has_install_step {
                dirs.extend(
                    self.options
                        .configurations
                        .iter()
                        .map(|c| self.layout.install_dir(*c)),
                );
            }
            steps.push(Step::new(Stage::Cleanup, None, StepAction::RemoveDirs(dirs)));
        }

        steps
    }

    fn cmake(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.options.cmake)
    }

    fn configure_single(&self, config: BuildConfiguration) -> ProcessBuilder {
        let mut cmd = self
            .cmake()
            .arg("-S")
            .arg(&self.options.source_dir)
            .arg("-B")
            .arg(self.layout.build_dir(config))
            .arg("-G")
            .arg(&self.options.generator)
            .arg(format!("-DCMAKE_BUILD_TYPE={}", config));

        if self.flags.has_install_step {
            cmd = cmd.arg(format!(
                "-DCMAKE_INSTALL_PREFIX={}",
                self.layout.install_dir(config).display()
            ));
        }

        cmd.args(&self.options.cmake_arguments)
    }

    fn configure_multi(&self) -> ProcessBuilder {
        let types: Vec<&str> = self
            .options
            .configurations
            .iter()
            .map(|c| c.as_str())
            .collect();

        self.cmake()
            .arg("-S")
            .arg(&self.options.source_dir)
            .arg("-B")
            .arg(self.layout.shared_build_dir())
            .arg("-G")
            .arg(&self.options.generator)
            .arg(format!("-DCMAKE_CONFIGURATION_TYPES={}", types.join(";")))
            .args(&self.options.cmake_arguments)
    }

    fn build(&self, config: BuildConfiguration) -> ProcessBuilder {
        self.cmake()
            .arg("--build")
            .arg(self.layout.build_dir(config))
            .args(["--config", config.as_str()])
    }

    fn test(&self, config: BuildConfiguration) -> ProcessBuilder {
        let build_dir = self.layout.build_dir(config);
        let cmd = ProcessBuilder::new(&self.options.ctest);

        let cmd = if self.flags.supports_test_dir {
            cmd.arg("--test-dir").arg(&build_dir)
        } else {
            // Older ctest only looks in the current directory.
            cmd.cwd(&build_dir)
        };

        cmd.arg("--output-on-failure").args(["-C", config.as_str()])
    }

    fn package(&self, config: BuildConfiguration) -> ProcessBuilder {
        ProcessBuilder::new(&self.options.cpack)
            .args(["-C", config.as_str()])
            .cwd(self.layout.build_dir(config))
    }

    fn install(&self, config: BuildConfiguration) -> ProcessBuilder {
        let build_dir = self.layout.build_dir(config);
        let prefix = self.layout.install_dir(config);

        if self.flags.supports_native_install {
            self.cmake()
                .arg("--install")
                .arg(&build_dir)
                .args(["--config", config.as_str()])
                .arg("--prefix")
                .arg(&prefix)
        } else {
            self.cmake()
                .arg(format!("-DCMAKE_INSTALL_CONFIG_NAME={}", config))
                .arg(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()))
                .arg("-P")
                .arg(build_dir.join("cmake_install.cmake"))
        }
    }

    /// Execute the plan, stopping at the first failure.
    pub fn execute(
        &self,
        runner: &dyn CommandRunner,
        host: &mut dyn ActionHost,
        platform: HostPlatform,
    ) -> Result<(), AbortError> {
        for step in self.plan() {
            host.start_group(&step.title());
            tracing::info!("{}", step.title());

            let result = step
                .retry
                .run(platform, || perform(runner, &step.action));

            host.end_group();

            result.map_err(|source| AbortError::Stage {
                stage: step.stage,
                configuration: step.configuration,
                source,
            })?;
        }

        Ok(())
    }
}

fn perform(runner: &dyn CommandRunner, action: &StepAction) -> Result<(), StepError> {
    match action {
        StepAction::Run(cmd) => runner.run(cmd),
        StepAction::RemoveDirs(dirs) => {
            for dir in dirs {
                tracing::debug!("removing {}", dir.display());
            }
            remove_dirs_concurrently(dirs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::capabilities::CapabilitySet;
    use crate::core::Version;
    use crate::test_support::{MockOutcome, RecordingHost, RecordingRunner};

    fn flags_for(version: Version) -> VariantFlags {
        VariantFlags::from_capabilities(&CapabilitySet::from_version(&version))
    }

    fn options() -> PipelineOptions {
        PipelineOptions {
            source_dir: PathBuf::from("/w"),
            ..Default::default()
        }
    }

    fn commands(pipeline: &Pipeline) -> Vec<String> {
        pipeline
            .plan()
            .iter()
            .filter_map(|s| s.command().map(|c| c.display_command()))
            .collect()
    }

    #[test]
    fn test_minimal_single_config_plan() {
        let pipeline = Pipeline::new(
            options(),
            flags_for(Version::new(3, 25, 2)),
            Layout::new("/w", "", false),
        );

        assert_eq!(
            commands(&pipeline),
            [
                "cmake -S /w -B /w/build-Debug -G Ninja -DCMAKE_BUILD_TYPE=Debug",
                "cmake --build /w/build-Debug --config Debug",
                "cmake -S /w -B /w/build-Release -G Ninja -DCMAKE_BUILD_TYPE=Release",
                "cmake --build /w/build-Release --config Release",
            ]
        );
    }

    #[test]
    fn test_extra_arguments_only_on_configure() {
        let opts = PipelineOptions {
            cmake_arguments: vec!["-DWITH_X=ON".to_string(), "--warn-uninitialized".to_string()],
            ..options()
        };
        let pipeline = Pipeline::new(opts, flags_for(Version::new(3, 25, 2)), Layout::new("/w", "", false));
        let plan = pipeline.plan();

        let configure = plan[0].command().unwrap();
        assert!(configure
            .get_args()
            .ends_with(&["-DWITH_X=ON".to_string(), "--warn-uninitialized".to_string()]));
        let build = plan[1].command().unwrap();
        assert!(!build.get_args().contains(&"-DWITH_X=ON".to_string()));
    }

    #[test]
    fn test_test_dir_when_supported() {
        let mut flags = flags_for(Version::new(3, 25, 2));
        flags.has_test_step = true;
        let pipeline = Pipeline::new(options(), flags, Layout::new("/w", "", false));

        let plan = pipeline.plan();
        let test = plan.iter().find(|s| s.stage == Stage::Test).unwrap();
        let cmd = test.command().unwrap();
        assert_eq!(
            cmd.display_command(),
            "ctest --test-dir /w/build-Debug --output-on-failure -C Debug"
        );
        assert_eq!(cmd.get_cwd(), None);
    }

    #[test]
    fn test_cwd_fallback_without_test_dir() {
        let mut flags = flags_for(Version::new(3, 19, 0));
        flags.has_test_step = true;
        let pipeline = Pipeline::new(options(), flags, Layout::new("/w", "", false));

        let plan = pipeline.plan();
        let test = plan.iter().find(|s| s.stage == Stage::Test).unwrap();
        let cmd = test.command().unwrap();
        assert!(!cmd.get_args().contains(&"--test-dir".to_string()));
        assert_eq!(cmd.get_cwd(), Some(PathBuf::from("/w/build-Debug").as_path()));
    }

    #[test]
    fn test_install_sets_prefix_and_uses_native_install() {
        let mut flags = flags_for(Version::new(3, 16, 0));
        flags.has_install_step = true;
        let pipeline = Pipeline::new(options(), flags, Layout::new("/w", "-ci", false));

        let cmds = commands(&pipeline);
        assert!(cmds[0].ends_with("-DCMAKE_INSTALL_PREFIX=/w/install-Debug-ci"));
        assert_eq!(
            cmds[2],
            "cmake --install /w/build-Debug-ci --config Debug --prefix /w/install-Debug-ci"
        );
    }

    #[test]
    fn test_legacy_install_runs_install_script() {
        let mut flags = flags_for(Version::new(3, 14, 0));
        flags.has_install_step = true;
        let pipeline = Pipeline::new(options(), flags, Layout::new("/w", "", false));

        let plan = pipeline.plan();
        let install = plan.iter().find(|s| s.stage == Stage::Install).unwrap();
        assert_eq!(
            install.command().unwrap().display_command(),
            "cmake -DCMAKE_INSTALL_CONFIG_NAME=Debug -DCMAKE_INSTALL_PREFIX=/w/install-Debug -P /w/build-Debug/cmake_install.cmake"
        );
    }

    #[test]
    fn test_full_single_config_stage_order() {
        let mut flags = flags_for(Version::new(3, 25, 2));
        flags.has_test_step = true;
        flags.has_package_step = true;
        flags.has_install_step = true;
        flags.has_cleanup_step = true;
        let pipeline = Pipeline::new(options(), flags, Layout::new("/w", "", false));

        let stages: Vec<_> = pipeline
            .plan()
            .iter()
            .map(|s| (s.stage, s.configuration))
            .collect();
        let per_config = |c| {
            [
                (Stage::Configure, Some(c)),
                (Stage::Build, Some(c)),
                (Stage::Test, Some(c)),
                (Stage::Package, Some(c)),
                (Stage::Install, Some(c)),
                (Stage::Cleanup, Some(c)),
            ]
        };
        let expected: Vec<_> = per_config(BuildConfiguration::Debug)
            .into_iter()
            .chain(per_config(BuildConfiguration::Release))
            .collect();
        assert_eq!(stages, expected);
    }

    #[test]
    fn test_package_runs_in_build_dir_with_retry() {
        let mut flags = flags_for(Version::new(3, 25, 2));
        flags.has_package_step = true;
        let pipeline = Pipeline::new(options(), flags, Layout::new("/w", "", false));

        let plan = pipeline.plan();
        let package = plan.iter().find(|s| s.stage == Stage::Package).unwrap();
        assert_eq!(package.retry.max_attempts, 2);
        let cmd = package.command().unwrap();
        assert_eq!(cmd.display_command(), "cpack -C Debug");
        assert_eq!(cmd.get_cwd(), Some(PathBuf::from("/w/build-Debug").as_path()));
    }

    #[test]
    fn test_cleanup_removes_build_and_install_dirs() {
        let mut flags = flags_for(Version::new(3, 25, 2));
        flags.has_install_step = true;
        flags.has_cleanup_step = true;
        let pipeline = Pipeline::new(options(), flags, Layout::new("/w", "", false));

        let plan = pipeline.plan();
        let cleanup = plan.iter().find(|s| s.stage == Stage::Cleanup).unwrap();
        assert_eq!(
            cleanup.action,
            StepAction::RemoveDirs(vec![
                PathBuf::from("/w/build-Debug"),
                PathBuf::from("/w/install-Debug"),
            ])
        );
    }

    #[test]
    fn test_multi_config_plan() {
        let mut flags = flags_for(Version::new(3, 25, 2));
        flags.multi_config_generator = true;
        flags.has_test_step = true;
        flags.has_install_step = true;
        flags.has_cleanup_step = true;
        let opts = PipelineOptions {
            generator: "Ninja Multi-Config".to_string(),
            ..options()
        };
        let pipeline = Pipeline::new(opts, flags, Layout::new("/w", "", true));

        let plan = pipeline.plan();
        assert_eq!(
            plan[0].command().unwrap().display_command(),
            "cmake -S /w -B /w/build -G \"Ninja Multi-Config\" -DCMAKE_CONFIGURATION_TYPES=Debug;Release"
        );
        assert_eq!(plan.iter().filter(|s| s.stage == Stage::Configure).count(), 1);
        assert_eq!(
            plan[1].command().unwrap().display_command(),
            "cmake --build /w/build --config Debug"
        );

        let last = plan.last().unwrap();
        assert_eq!(last.stage, Stage::Cleanup);
        assert_eq!(last.configuration, None);
        assert_eq!(
            last.action,
            StepAction::RemoveDirs(vec![
                PathBuf::from("/w/build"),
                PathBuf::from("/w/install-Debug"),
                PathBuf::from("/w/install-Release"),
            ])
        );
    }

    #[test]
    fn test_configure_failure_stops_everything() {
        let runner = RecordingRunner::new();
        runner.expect_prefix("cmake -S /w -B /w/build-Debug", MockOutcome::exit(1));
        let mut host = RecordingHost::new();

        let pipeline = Pipeline::new(
            options(),
            flags_for(Version::new(3, 25, 2)),
            Layout::new("/w", "", false),
        );
        let err = pipeline
            .execute(&runner, &mut host, HostPlatform::Linux)
            .unwrap_err();

        assert!(matches!(
            err,
            AbortError::Stage {
                stage: Stage::Configure,
                configuration: Some(BuildConfiguration::Debug),
                ..
            }
        ));
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(host.groups(), ["Configure Debug"]);
        assert!(host.groups_balanced());
    }

    #[test]
    fn test_package_retried_once_on_macos() {
        let runner = RecordingRunner::new();
        runner.expect_prefix_times("cpack", MockOutcome::exit(1), 1);
        let mut host = RecordingHost::new();

        let mut flags = flags_for(Version::new(3, 25, 2));
        flags.has_package_step = true;
        let opts = PipelineOptions {
            configurations: vec![BuildConfiguration::Release],
            ..options()
        };
        let pipeline = Pipeline::new(opts, flags, Layout::new("/w", "", false));
        pipeline
            .execute(&runner, &mut host, HostPlatform::MacOs)
            .unwrap();

        let cpack_calls = runner.calls().iter().filter(|c| c.starts_with("cpack")).count();
        assert_eq!(cpack_calls, 2);
    }

    #[test]
    fn test_package_failure_not_retried_on_linux() {
        let runner = RecordingRunner::new();
        runner.expect_prefix("cpack", MockOutcome::exit(1));
        let mut host = RecordingHost::new();

        let mut flags = flags_for(Version::new(3, 25, 2));
        flags.has_package_step = true;
        let pipeline = Pipeline::new(options(), flags, Layout::new("/w", "", false));
        let err = pipeline
            .execute(&runner, &mut host, HostPlatform::Linux)
            .unwrap_err();

        assert_eq!(err.kind(), "NonZeroExitError");
        let cpack_calls = runner.calls().iter().filter(|c| c.starts_with("cpack")).count();
        assert_eq!(cpack_calls, 1);
        // Release never starts.
        assert!(!runner.calls().iter().any(|c| c.contains("Release")));
    }

    #[test]
    fn test_cleanup_removes_real_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let layout = Layout::new(tmp.path(), "", false);
        std::fs::create_dir_all(layout.build_dir(BuildConfiguration::Debug)).unwrap();

        let runner = RecordingRunner::new();
        let mut host = RecordingHost::new();
        let mut flags = flags_for(Version::new(3, 25, 2));
        flags.has_cleanup_step = true;
        let opts = PipelineOptions {
            configurations: vec![BuildConfiguration::Debug],
            ..options()
        };

        Pipeline::new(opts, flags, layout.clone())
            .execute(&runner, &mut host, HostPlatform::Linux)
            .unwrap();

        assert!(!layout.build_dir(BuildConfiguration::Debug).exists());
        assert_eq!(host.groups().last().map(String::as_str), Some("Cleanup Debug"));
    }
}
