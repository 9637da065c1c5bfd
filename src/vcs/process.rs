use super::{CapturedOutput, VcsError, VcsRunner};
use duct::{cmd, Handle};
use log::trace;
use std::{
    path::Path,
    process::Output,
    thread::sleep,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A runner that starts the command as a child process in the repository directory.
///
/// The arguments are passed as a list to the process, they never go through a shell,
/// so paths and names coming from the configuration cannot inject commands.
/// Git is never allowed to prompt for credentials, a command that would ask
/// fails instead of hanging forever.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Creates a runner that waits for commands until they finish.
    pub fn new() -> Self {
        ProcessRunner { timeout: None }
    }

    /// Creates a runner that kills commands running longer than `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        ProcessRunner {
            timeout: Some(timeout),
        }
    }

    fn wait_with_timeout(handle: Handle, timeout: Duration) -> Result<Output, VcsError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(output) = handle.try_wait()? {
                return Ok(output.clone());
            }
            if Instant::now() >= deadline {
                handle.kill()?;
                return Err(VcsError::Timeout(timeout));
            }
            sleep(POLL_INTERVAL);
        }
    }
}

impl VcsRunner for ProcessRunner {
    fn run(
        &self,
        directory: &Path,
        command: &str,
        args: &[&str],
    ) -> Result<CapturedOutput, VcsError> {
        trace!("Running {command} {args:?} in {}.", directory.display());

        let expression = cmd(command, args.iter().copied())
            .dir(directory)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin_null()
            .stdout_capture()
            .stderr_capture()
            .unchecked();

        let output = match self.timeout {
            Some(timeout) => Self::wait_with_timeout(expression.start()?, timeout)?,
            None => expression.run()?,
        };

        let stdout =
            std::str::from_utf8(&output.stdout).map_err(|_| VcsError::NonUtf8Return)?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            Ok(CapturedOutput::new(stdout, &stderr))
        } else {
            // Some git failures (e.g. merge conflicts) only report on stdout.
            let message = if stderr.trim().is_empty() {
                stdout.trim_end()
            } else {
                stderr.trim_end()
            };
            Err(VcsError::NonZeroExitcode(
                output.status.code().unwrap_or(-1),
                message.to_string(),
            ))
        }
    }
}
