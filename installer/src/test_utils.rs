//! Shared test utilities for the installer crate.

use crate::confirm::Confirmer;
use crate::download::{ArtefactDownloader, DownloadError};
use crate::error::{InstallerError, Result};
use crate::executor::{CommandExecutor, command_line};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::process::{ExitStatus, Output};
use url::Url;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "hdiutil").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// An expected call of `cmd` with `args` answering `result`.
    #[must_use]
    pub fn new(cmd: &'static str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd,
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects. An
/// unexpected invocation yields [`InstallerError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        let remaining = self.expected.borrow();
        assert!(
            remaining.is_empty(),
            "expected no further command invocations, {} remain: {:?}",
            remaining.len(),
            remaining.iter().map(|call| call.cmd).collect::<Vec<_>>()
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(InstallerError::StubMismatch {
                message: format!("unexpected invocation: {}", command_line(cmd, args)),
            });
        };
        if call.cmd != cmd || call.args != args {
            return Err(InstallerError::StubMismatch {
                message: format!(
                    "expected `{}`, got `{}`",
                    command_line(call.cmd, &call.args.iter().map(String::as_str).collect::<Vec<_>>()),
                    command_line(cmd, args)
                ),
            });
        }
        call.result
    }
}

/// Downloader that writes fixed bytes for known URLs.
#[derive(Debug, Clone, Default)]
pub struct StubDownloader {
    files: HashMap<String, Vec<u8>>,
}

impl StubDownloader {
    /// Serves `bytes` for `url`.
    #[must_use]
    pub fn with_file(mut self, url: &str, bytes: &[u8]) -> Self {
        self.files.insert(url.to_owned(), bytes.to_vec());
        self
    }
}

impl ArtefactDownloader for StubDownloader {
    fn download(&self, url: &Url, dest: &Path) -> std::result::Result<u64, DownloadError> {
        let bytes = self
            .files
            .get(url.as_str())
            .ok_or_else(|| DownloadError::NotFound {
                url: url.to_string(),
            })?;
        std::fs::write(dest, bytes)?;
        Ok(u64::try_from(bytes.len()).unwrap_or(u64::MAX))
    }
}

/// Confirmer answering from a fixed queue and recording every prompt.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: RefCell<VecDeque<bool>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedConfirmer {
    /// Answers `answers` in order, then declines.
    #[must_use]
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            prompts: RefCell::default(),
        }
    }

    /// Prompts shown so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.borrow_mut().push(prompt.to_owned());
        self.answers.borrow_mut().pop_front().unwrap_or(false)
    }
}
