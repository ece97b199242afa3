//! Error types for the anyinstall command-line installer.
//!
//! Each variant carries enough context to tell the user what failed, and
//! [`InstallerError::hint`] adds a recovery suggestion where one exists.

use crate::download::DownloadError;
use crate::extract::ExtractionError;
use crate::store::RecordStoreError;
use anyinstall::ResolveError;
use anyinstall_common::PlatformError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or installing.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The resolution pipeline failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The configuration file could not be read or parsed.
    #[error("invalid configuration at {path}: {reason}")]
    Config {
        /// Location of the configuration file.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The host or an `--os`/`--arch` override is not supported.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// No source argument was given.
    #[error("no source given")]
    MissingSource,

    /// `update` was asked for a source that was never installed.
    #[error("no recorded install for {requested}")]
    NoRecord {
        /// The source the user asked to update.
        requested: String,
    },

    /// The install record store failed.
    #[error(transparent)]
    RecordStore(#[from] RecordStoreError),

    /// An HTTP download failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// An archive could not be unpacked.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// An external command exited unsuccessfully.
    #[error("{command} failed ({status}): {stderr}")]
    CommandFailed {
        /// Command line that ran.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// An external command did not finish in time and was killed.
    #[error("{command} timed out after {seconds}s")]
    CommandTimedOut {
        /// Command line that ran.
        command: String,
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// A platform directory could not be determined.
    #[error("could not determine the {what} directory")]
    MissingDirectory {
        /// Which directory was needed.
        what: &'static str,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to write output.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying error that caused the write to fail.
        #[source]
        source: std::io::Error,
    },

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl InstallerError {
    /// A suggestion for recovering from this error, if one exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyinstall_installer::error::InstallerError;
    ///
    /// let err = InstallerError::NoRecord { requested: "junegunn/fzf".to_owned() };
    /// assert!(err.hint().is_some_and(|hint| hint.contains("anyinstall install")));
    /// ```
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Resolve(ResolveError::NoCompatibleAsset { .. }) => Some(
                "run `anyinstall resolve <source> -v` to see why each candidate was excluded"
                    .to_owned(),
            ),
            Self::Resolve(ResolveError::SourceUnavailable { .. }) => {
                Some("set GITHUB_TOKEN to raise the API rate limit".to_owned())
            }
            Self::Resolve(ResolveError::InvalidSource { .. }) | Self::MissingSource => Some(
                "pass owner/repo, a repository or download URL, or a local file path".to_owned(),
            ),
            Self::NoRecord { requested } => Some(format!("run `anyinstall install {requested}` first")),
            Self::Platform(_) => {
                Some("supported values: --os darwin|linux|windows|freebsd".to_owned())
            }
            Self::MissingDirectory { what: "bin" } => {
                Some("pass --bin-dir or set ANYINSTALL_BIN_DIR".to_owned())
            }
            _ => None,
        }
    }
}

/// A specialized `Result` type for installer operations.
pub type Result<T> = std::result::Result<T, InstallerError>;
