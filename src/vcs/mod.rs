use mockall::automock;
use std::{path::Path, time::Duration};
use thiserror::Error;

/// A runner which spawns the command as a child process.
pub mod process;

/// The captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Standard output, trimmed of trailing whitespace.
    pub stdout: String,
    /// Standard error, trimmed of trailing whitespace.
    pub stderr: String,
}

impl CapturedOutput {
    pub fn new(stdout: &str, stderr: &str) -> Self {
        CapturedOutput {
            stdout: stdout.trim_end().to_string(),
            stderr: stderr.trim_end().to_string(),
        }
    }
}

/// A custom error describing the error cases for running version-control commands.
#[derive(Debug, Error)]
pub enum VcsError {
    /// The process could not be started (for example the binary is missing
    /// or the directory doesn't exist). The parameter contains the error.
    #[error("the command cannot run: {0}")]
    SpawnFailed(#[from] std::io::Error),
    /// The command returned a non-zero exit code. The parameters are the exit code
    /// (-1 if it was terminated by a signal) and the captured standard error.
    #[error("the command returned non-zero exit code {0} with message: {1}")]
    NonZeroExitcode(i32, String),
    /// The command output contains non-UTF8 characters.
    #[error("the command returned invalid characters")]
    NonUtf8Return,
    /// The command didn't finish in time and has been killed.
    #[error("the command timed out after {0:?}")]
    Timeout(Duration),
}

/// Runs a version-control command against a repository.
///
/// This is the only place where the service touches the process boundary, every
/// git semantic lives in the callers as a command template ([crate::repository::git]).
#[automock]
pub trait VcsRunner: Send + Sync {
    /// Run `command` with `args` in `directory`, capturing its output.
    fn run<'a>(
        &self,
        directory: &Path,
        command: &str,
        args: &[&'a str],
    ) -> Result<CapturedOutput, VcsError>;
}
