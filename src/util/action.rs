//! GitHub Actions host integration.
//!
//! Inputs arrive as `INPUT_<NAME>` environment variables, outputs are
//! appended to the file named by `GITHUB_OUTPUT`, and log grouping and
//! failure reporting use workflow commands written to stdout.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use sha2::{Digest, Sha256};

/// The hosting action's input/output mechanism.
pub trait ActionHost {
    /// Read an input; empty values are treated as absent.
    fn input(&self, name: &str) -> Option<String>;

    /// Publish an output for downstream steps.
    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()>;

    /// Publish several outputs at once. Either every output is published
    /// or none is.
    fn set_outputs(&mut self, outputs: &[(String, String)]) -> io::Result<()>;

    /// Open a collapsible log group.
    fn start_group(&mut self, title: &str);

    /// Close the current log group.
    fn end_group(&mut self);

    /// Report the run as failed with a single message.
    fn set_failed(&mut self, message: &str);
}

/// Inputs recognised by the action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInputs {
    /// Extra arguments for the configure step.
    pub cmake_arguments: Vec<String>,
    /// Appended to generated directory names.
    pub output_directories_suffix: String,
    pub test: bool,
    pub package: bool,
    pub install: bool,
    pub perform_cleanup: bool,
}

impl ActionInputs {
    pub fn from_host(host: &dyn ActionHost) -> Self {
        let flag = |name: &str| host.input(name).as_deref() == Some("true");

        ActionInputs {
            cmake_arguments: split_arguments(&host.input("cmake-arguments").unwrap_or_default()),
            output_directories_suffix: host
                .input("output-directories-suffix")
                .unwrap_or_default(),
            test: flag("test"),
            package: flag("package"),
            install: flag("install"),
            perform_cleanup: flag("perform-cleanup"),
        }
    }
}

/// Split a whitespace-separated argument string, discarding empty tokens.
pub fn split_arguments(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// The real GitHub Actions runner environment.
#[derive(Debug, Default)]
pub struct GithubActions {
    output_file: Option<PathBuf>,
}

impl GithubActions {
    pub fn from_env() -> Self {
        GithubActions {
            output_file: std::env::var_os("GITHUB_OUTPUT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Environment variable holding the input `name`.
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Escape data for a workflow command.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property value.
fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Heredoc entry for the `GITHUB_OUTPUT` file. The delimiter is a digest
/// of the name and value.
fn file_command_entry(name: &str, value: &str) -> String {
    let digest = Sha256::new()
        .chain_update(name.as_bytes())
        .chain_update([0u8])
        .chain_update(value.as_bytes())
        .finalize();
    let delimiter = format!("ghadelimiter_{}", &hex::encode(digest)[..32]);
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

impl ActionHost for GithubActions {
    fn input(&self, name: &str) -> Option<String> {
        std::env::var(input_env_name(name))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
        self.set_outputs(&[(name.to_string(), value.to_string())])
    }

    fn set_outputs(&mut self, outputs: &[(String, String)]) -> io::Result<()> {
        // Everything is rendered first and written with one call.
        match self.output_file {
            Some(ref path) => {
                let entries: String = outputs
                    .iter()
                    .map(|(name, value)| file_command_entry(name, value))
                    .collect();
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(entries.as_bytes())
            }
            None => {
                let commands: String = outputs
                    .iter()
                    .map(|(name, value)| {
                        format!(
                            "::set-output name={}::{}\n",
                            escape_property(name),
                            escape_data(value)
                        )
                    })
                    .collect();
                let mut stdout = io::stdout().lock();
                stdout.write_all(commands.as_bytes())?;
                stdout.flush()
            }
        }
    }

    fn start_group(&mut self, title: &str) {
        println!("::group::{}", escape_data(title));
    }

    fn end_group(&mut self) {
        println!("::endgroup::");
    }

    fn set_failed(&mut self, message: &str) {
        println!("::error::{}", escape_data(message));
    }
}
