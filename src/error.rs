//! Error types for the resolution pipeline.
//!
//! Every variant of [`ResolveError`] is terminal for the current run. The
//! pipeline never retries; cleanup still runs for every unit that executed.

use std::fmt;
use thiserror::Error;

/// Why a candidate was excluded from selection.
///
/// The declaration order doubles as the tie-break order when the selector
/// reports the dominant cause of an empty candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IncompatibilityCause {
    /// The name targets a different operating system.
    Platform,
    /// The name targets a different CPU architecture.
    Architecture,
    /// The host lacks the helper needed to install the format.
    Capability,
    /// The file is not an installable format.
    Extension,
    /// A stable alternative outranked this prerelease.
    Prerelease,
}

impl IncompatibilityCause {
    /// Human-readable description used in error messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Platform => "no platform match",
            Self::Architecture => "no architecture match",
            Self::Capability => "no local capability to install the available formats",
            Self::Extension => "only non-installable files",
            Self::Prerelease => "only prereleases",
        }
    }
}

impl fmt::Display for IncompatibilityCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Misconfiguration detected while building a unit registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two units share an identifier.
    #[error("unit \"{id}\" is registered more than once")]
    DuplicateUnit {
        /// The repeated identifier.
        id: &'static str,
    },

    /// A unit depends on an identifier nobody registered.
    #[error("unit \"{unit}\" depends on \"{dependency}\", which is not registered")]
    MissingDependency {
        /// The dependent unit.
        unit: &'static str,
        /// The absent dependency.
        dependency: &'static str,
    },
}

/// Terminal failures of a resolution run.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The input matches no known source shape.
    #[error("cannot interpret \"{input}\" as a repository, URL, or local path")]
    InvalidSource {
        /// The raw input.
        input: String,
    },

    /// The repository publishes no release and no install script was found.
    #[error("no release found for {repository}")]
    NoReleaseFound {
        /// `owner/repo` of the repository.
        repository: String,
    },

    /// Candidates were found but none survived filtering.
    #[error(
        "no compatible asset among {considered} candidate(s): {}",
        .cause.map_or("nothing installable was published", IncompatibilityCause::describe)
    )]
    NoCompatibleAsset {
        /// Dominant exclusion cause, absent when no candidate existed at all.
        cause: Option<IncompatibilityCause>,
        /// Number of candidates examined.
        considered: usize,
    },

    /// The user declined a confirmation prompt.
    #[error("aborted: {step} was declined")]
    UserAborted {
        /// The step that needed confirmation.
        step: String,
    },

    /// Fetching the selected artefact failed.
    #[error("download of {url} failed: {reason}")]
    DownloadFailed {
        /// Location that was fetched.
        url: String,
        /// Description of the failure.
        reason: String,
    },

    /// The install procedure failed.
    #[error("{method} install failed: {reason}")]
    InstallFailed {
        /// Install method that was attempted.
        method: String,
        /// Description of the failure.
        reason: String,
    },

    /// Release metadata or page content could not be fetched.
    #[error("{source_name} is unavailable: {reason}")]
    SourceUnavailable {
        /// Description of the source.
        source_name: String,
        /// Description of the failure.
        reason: String,
    },

    /// The run was interrupted.
    #[error("interrupted")]
    Cancelled,

    /// The unit registry is misconfigured.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A local I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::platform(Some(IncompatibilityCause::Platform), "no platform match")]
    #[case::arch(Some(IncompatibilityCause::Architecture), "no architecture match")]
    #[case::capability(Some(IncompatibilityCause::Capability), "no local capability")]
    #[case::empty(None, "nothing installable")]
    fn no_compatible_asset_names_the_cause(
        #[case] cause: Option<IncompatibilityCause>,
        #[case] fragment: &str,
    ) {
        let err = ResolveError::NoCompatibleAsset {
            cause,
            considered: 3,
        };
        let message = err.to_string();
        assert!(message.contains(fragment), "{message}");
    }

    #[test]
    fn cause_order_prefers_platform_over_architecture() {
        assert!(IncompatibilityCause::Platform < IncompatibilityCause::Architecture);
        assert!(IncompatibilityCause::Capability < IncompatibilityCause::Extension);
    }
}
