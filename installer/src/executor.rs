//! Subprocess execution with a timeout.
//!
//! Install steps shell out to `hdiutil`, `dpkg`, `tar`, and friends through
//! [`CommandExecutor`] so tests can script the exchange with a stub.

use crate::error::{InstallerError, Result};
use log::debug;
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default limit for one external command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Trait for executing external commands.
pub trait CommandExecutor {
    /// Executes a command with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started or does not finish
    /// within the executor's timeout. A non-zero exit is not an error here;
    /// use [`run_checked`] for that.
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host, killing them after a timeout.
#[derive(Debug, Clone, Copy)]
pub struct SystemCommandExecutor {
    timeout: Duration,
}

impl SystemCommandExecutor {
    /// An executor using `timeout` for every command.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::with_timeout(COMMAND_TIMEOUT)
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        debug!(target: "anyinstall::executor", "running {}", command_line(cmd, args));
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes while waiting so a chatty child cannot fill them.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        match child.wait_timeout(self.timeout)? {
            Some(status) => Ok(Output {
                status,
                stdout: collect(stdout),
                stderr: collect(stderr),
            }),
            None => {
                child.kill()?;
                child.wait()?;
                Err(InstallerError::CommandTimedOut {
                    command: command_line(cmd, args),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if pipe.read_to_end(&mut buffer).is_err() {
            // Keep whatever arrived before the pipe broke.
        }
        buffer
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default()
}

/// Runs a command and turns a non-zero exit into an error.
///
/// # Errors
///
/// Returns [`InstallerError::CommandFailed`] with the captured stderr when
/// the command exits unsuccessfully, or whatever the executor returned.
pub fn run_checked(executor: &dyn CommandExecutor, cmd: &str, args: &[&str]) -> Result<Output> {
    let output = executor.run(cmd, args)?;
    if output.status.success() {
        return Ok(output);
    }
    Err(InstallerError::CommandFailed {
        command: command_line(cmd, args),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    })
}

/// Renders a command and its arguments for messages.
#[must_use]
pub fn command_line(cmd: &str, args: &[&str]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};

    #[test]
    fn run_checked_passes_successful_output_through() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "dpkg",
            args: vec!["--version".to_owned()],
            result: Ok(success_output()),
        }]);

        assert!(run_checked(&executor, "dpkg", &["--version"]).is_ok());
        executor.assert_finished();
    }

    #[test]
    fn run_checked_reports_stderr_on_failure() {
        let executor = StubExecutor::new(vec![ExpectedCall {
            cmd: "hdiutil",
            args: vec!["attach".to_owned(), "x.dmg".to_owned()],
            result: Ok(failure_output("image not recognized\n")),
        }]);

        let err = run_checked(&executor, "hdiutil", &["attach", "x.dmg"])
            .expect_err("non-zero exit should fail");
        match err {
            InstallerError::CommandFailed {
                command, stderr, ..
            } => {
                assert_eq!(command, "hdiutil attach x.dmg");
                assert_eq!(stderr, "image not recognized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn system_executor_captures_stdout() {
        let output = SystemCommandExecutor::default()
            .run("sh", &["-c", "echo hello"])
            .expect("sh runs");
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn system_executor_kills_commands_that_overrun() {
        let executor = SystemCommandExecutor::with_timeout(Duration::from_millis(100));
        let err = executor
            .run("sh", &["-c", "sleep 5"])
            .expect_err("sleep should time out");
        assert!(matches!(err, InstallerError::CommandTimedOut { .. }));
    }
}
