//! Test doubles for the command runner and the action host.
//!
//! # Example
//!
//! ```rust,ignore
//! let runner = RecordingRunner::new();
//! runner.expect_prefix("cmake --version", MockOutcome::stdout("cmake version 3.25.2\n"));
//! runner.expect_prefix("cmake -S", MockOutcome::exit(1));
//!
//! let mut host = RecordingHost::new().with_input("test", "true");
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;

use crate::builder::errors::StepError;
use crate::builder::runner::CommandRunner;
use crate::util::action::ActionHost;
use crate::util::process::ProcessBuilder;

/// Scripted result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Exit 0 with the given stdout.
    Success(String),
    /// Exit with a non-zero code.
    Exit(i32),
    /// The program could not be started.
    SpawnFailure,
}

impl MockOutcome {
    pub fn stdout(stdout: impl Into<String>) -> Self {
        MockOutcome::Success(stdout.into())
    }

    pub fn exit(code: i32) -> Self {
        MockOutcome::Exit(code)
    }

    pub fn spawn_failure() -> Self {
        MockOutcome::SpawnFailure
    }

    fn into_result(self, command: String) -> Result<String, StepError> {
        match self {
            MockOutcome::Success(stdout) => Ok(stdout),
            MockOutcome::Exit(code) => Err(StepError::NonZeroExit {
                command,
                exit_code: Some(code),
            }),
            MockOutcome::SpawnFailure => Err(StepError::Spawn {
                command,
                source: io::Error::new(io::ErrorKind::NotFound, "program not found"),
            }),
        }
    }
}

/// Pattern for matching rendered command lines.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    Exact(String),
    StartsWith(String),
    Contains(String),
}

impl CommandPattern {
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

#[derive(Debug, Clone)]
struct Expectation {
    pattern: CommandPattern,
    outcome: MockOutcome,
    /// Number of times this expectation can be used (None = unlimited).
    times: Option<usize>,
    used: usize,
}

impl Expectation {
    fn available(&self) -> bool {
        match self.times {
            Some(n) => self.used < n,
            None => true,
        }
    }
}

/// A [`CommandRunner`] that records every command and replays scripted
/// outcomes. Unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    expectations: RefCell<Vec<Expectation>>,
    calls: RefCell<Vec<String>>,
    cwds: RefCell<Vec<Option<std::path::PathBuf>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, pattern: CommandPattern, outcome: MockOutcome, times: Option<usize>) -> &Self {
        self.expectations.borrow_mut().push(Expectation {
            pattern,
            outcome,
            times,
            used: 0,
        });
        self
    }

    pub fn expect(&self, cmd: &str, outcome: MockOutcome) -> &Self {
        self.push(CommandPattern::Exact(cmd.to_string()), outcome, None)
    }

    pub fn expect_prefix(&self, prefix: &str, outcome: MockOutcome) -> &Self {
        self.push(CommandPattern::StartsWith(prefix.to_string()), outcome, None)
    }

    /// Like [`expect_prefix`](Self::expect_prefix), but only for the first `times` matches.
    pub fn expect_prefix_times(&self, prefix: &str, outcome: MockOutcome, times: usize) -> &Self {
        self.push(
            CommandPattern::StartsWith(prefix.to_string()),
            outcome,
            Some(times),
        )
    }

    pub fn expect_contains(&self, substring: &str, outcome: MockOutcome) -> &Self {
        self.push(CommandPattern::Contains(substring.to_string()), outcome, None)
    }

    /// Every command line seen so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Working directory of every command seen so far.
    pub fn cwds(&self) -> Vec<Option<std::path::PathBuf>> {
        self.cwds.borrow().clone()
    }

    fn dispatch(&self, cmd: &ProcessBuilder) -> Result<String, StepError> {
        let line = cmd.display_command();
        self.calls.borrow_mut().push(line.clone());
        self.cwds
            .borrow_mut()
            .push(cmd.get_cwd().map(|p| p.to_path_buf()));

        let mut expectations = self.expectations.borrow_mut();
        for exp in expectations.iter_mut() {
            if exp.pattern.matches(&line) && exp.available() {
                exp.used += 1;
                return exp.outcome.clone().into_result(line);
            }
        }

        Ok(String::new())
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<(), StepError> {
        self.dispatch(cmd).map(|_| ())
    }

    fn capture(&self, cmd: &ProcessBuilder) -> Result<String, StepError> {
        self.dispatch(cmd)
    }
}

/// An in-memory [`ActionHost`].
#[derive(Debug, Default)]
pub struct RecordingHost {
    inputs: HashMap<String, String>,
    outputs: Vec<(String, String)>,
    groups: Vec<String>,
    depth: usize,
    balanced: bool,
    failure: Option<String>,
    failing_output: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        RecordingHost {
            balanced: true,
            ..Default::default()
        }
    }

    pub fn with_input(mut self, name: &str, value: &str) -> Self {
        self.inputs.insert(name.to_string(), value.to_string());
        self
    }

    /// Make publishing fail whenever output `name` is part of the batch.
    pub fn with_failing_output(mut self, name: &str) -> Self {
        self.failing_output = Some(name.to_string());
        self
    }

    pub fn outputs(&self) -> &[(String, String)] {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Titles of every group opened so far.
    pub fn groups(&self) -> Vec<String> {
        self.groups.clone()
    }

    /// True when every group was closed and none was closed twice.
    pub fn groups_balanced(&self) -> bool {
        self.balanced && self.depth == 0
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

impl ActionHost for RecordingHost {
    fn input(&self, name: &str) -> Option<String> {
        self.inputs.get(name).cloned().filter(|v| !v.is_empty())
    }

    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.set_outputs(&[(name.to_string(), value.to_string())])
    }

    fn set_outputs(&mut self, outputs: &[(String, String)]) -> io::Result<()> {
        if let Some(ref failing) = self.failing_output {
            if outputs.iter().any(|(name, _)| name == failing) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
        }
        self.outputs.extend_from_slice(outputs);
        Ok(())
    }

    fn start_group(&mut self, title: &str) {
        if self.depth > 0 {
            self.balanced = false;
        }
        self.depth += 1;
        self.groups.push(title.to_string());
    }

    fn end_group(&mut self) {
        if self.depth == 0 {
            self.balanced = false;
        } else {
            self.depth -= 1;
        }
    }

    fn set_failed(&mut self, message: &str) {
        self.failure = Some(message.to_string());
    }
}
