//! Candidate records: the possible things a run could install.
//!
//! A candidate is never deleted once discovered. Filters exclude it by
//! driving its priority below zero and recording why, so the full set stays
//! available for diagnostics after selection.

use crate::error::IncompatibilityCause;
use anyinstall_common::{InstallFormat, get_extension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Document an install script was mined from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptDocument {
    /// The body of a release.
    ReleaseNotes,
    /// The repository README.
    Readme,
    /// Preformatted text on a scraped web page.
    Webpage,
}

impl fmt::Display for ScriptDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReleaseNotes => "release notes",
            Self::Readme => "README",
            Self::Webpage => "web page",
        })
    }
}

/// Whether a candidate is a downloadable asset or an embedded script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    /// A file fetched from a URL or found on disk.
    Asset,
    /// Shell text to run.
    Script,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asset => "asset",
            Self::Script => "script",
        })
    }
}

/// Where a candidate's payload comes from.
///
/// Exactly one of a location or embedded script text exists for every
/// candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateOrigin {
    /// A remote file.
    Url(Url),
    /// A file already on disk.
    LocalPath(PathBuf),
    /// Script text mined from a document.
    Script {
        /// The literal code.
        code: String,
        /// The document it came from.
        document: ScriptDocument,
    },
}

impl fmt::Display for CandidateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::LocalPath(path) => write!(f, "{}", path.display()),
            Self::Script { document, .. } => write!(f, "script from {document}"),
        }
    }
}

/// The filter verdict that excluded a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// The constraint the candidate failed.
    pub cause: IncompatibilityCause,
    /// Free-text detail for diagnostics.
    pub detail: String,
}

/// One possible install target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    origin: CandidateOrigin,
    name: String,
    extension: String,
    size: Option<u64>,
    priority: i64,
    confidence: u8,
    provider: &'static str,
    prerelease: bool,
    platform_qualified: bool,
    rejection: Option<Rejection>,
}

impl Candidate {
    /// Creates an asset candidate; the extension is derived from `name`.
    #[must_use]
    pub fn asset(
        name: impl Into<String>,
        origin: CandidateOrigin,
        provider: &'static str,
        priority: i64,
    ) -> Self {
        let file_name = name.into();
        let extension = get_extension(&file_name);
        Self {
            origin,
            name: file_name,
            extension,
            size: None,
            priority,
            confidence: 0,
            provider,
            prerelease: false,
            platform_qualified: false,
            rejection: None,
        }
    }

    /// Creates a script candidate from mined code.
    #[must_use]
    pub fn script(
        code: impl Into<String>,
        document: ScriptDocument,
        provider: &'static str,
        score: i64,
    ) -> Self {
        let text = code.into();
        let name = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
            .unwrap_or_default()
            .to_owned();
        let confidence = u8::try_from(score.clamp(0, 100)).unwrap_or(100);
        Self {
            origin: CandidateOrigin::Script { code: text, document },
            name,
            extension: "sh".to_owned(),
            size: None,
            priority: score,
            confidence,
            provider,
            prerelease: false,
            platform_qualified: false,
            rejection: None,
        }
    }

    /// Sets the byte size.
    #[must_use]
    pub const fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    /// Marks the candidate as coming from a prerelease.
    #[must_use]
    pub const fn with_prerelease(mut self, prerelease: bool) -> Self {
        self.prerelease = prerelease;
        self
    }

    /// Sets the informational confidence, clamped to 100.
    #[must_use]
    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence.min(100);
        self
    }

    /// Payload origin.
    #[must_use]
    pub const fn origin(&self) -> &CandidateOrigin {
        &self.origin
    }

    /// Asset or script.
    #[must_use]
    pub const fn kind(&self) -> CandidateKind {
        match self.origin {
            CandidateOrigin::Script { .. } => CandidateKind::Script,
            CandidateOrigin::Url(_) | CandidateOrigin::LocalPath(_) => CandidateKind::Asset,
        }
    }

    /// Reports whether this is an asset candidate.
    #[must_use]
    pub const fn is_asset(&self) -> bool {
        matches!(self.kind(), CandidateKind::Asset)
    }

    /// Display name: the file name for assets, the first command for scripts.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized extension.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Install format implied by the extension, if known.
    #[must_use]
    pub fn format(&self) -> Option<InstallFormat> {
        InstallFormat::from_extension(&self.extension)
    }

    /// Byte size, when the provider knew it.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        self.size
    }

    /// Current priority; negative means excluded.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.priority
    }

    /// Informational confidence in `0..=100`.
    #[must_use]
    pub const fn confidence(&self) -> u8 {
        self.confidence
    }

    /// Identifier of the provider that discovered the candidate.
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Reports whether the candidate comes from a prerelease.
    #[must_use]
    pub const fn is_prerelease(&self) -> bool {
        self.prerelease
    }

    /// Reports whether the name explicitly targets the host platform.
    #[must_use]
    pub const fn is_platform_qualified(&self) -> bool {
        self.platform_qualified
    }

    /// Records that the name explicitly targets the host platform.
    pub const fn mark_platform_qualified(&mut self) {
        self.platform_qualified = true;
    }

    /// Reports whether a filter has excluded the candidate.
    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        self.priority < 0
    }

    /// Why the candidate was excluded, if it was.
    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    /// Remote URL, for URL-backed assets.
    #[must_use]
    pub const fn url(&self) -> Option<&Url> {
        match &self.origin {
            CandidateOrigin::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Local path, for on-disk assets.
    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        match &self.origin {
            CandidateOrigin::LocalPath(path) => Some(path),
            _ => None,
        }
    }

    /// Script text, for script candidates.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match &self.origin {
            CandidateOrigin::Script { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Raises the priority by `amount`.
    pub const fn boost(&mut self, amount: i64) {
        self.priority = self.priority.saturating_add(amount);
    }

    /// Lowers the priority by `amount`, recording `cause` if that excludes it.
    pub fn demote(&mut self, amount: i64, cause: IncompatibilityCause, detail: impl Into<String>) {
        self.priority = self.priority.saturating_sub(amount);
        if self.is_excluded() && self.rejection.is_none() {
            self.rejection = Some(Rejection {
                cause,
                detail: detail.into(),
            });
        }
    }

    /// Excludes the candidate outright.
    ///
    /// The first rejection recorded wins; later filters do not overwrite it.
    pub fn exclude(&mut self, cause: IncompatibilityCause, detail: impl Into<String>) {
        if self.priority >= 0 {
            self.priority = -1;
        }
        if self.rejection.is_none() {
            self.rejection = Some(Rejection {
                cause,
                detail: detail.into(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tarball() -> Candidate {
        let url = Url::parse("https://example.com/tool-linux-amd64.tar.gz").expect("valid url");
        Candidate::asset("tool-linux-amd64.tar.gz", CandidateOrigin::Url(url), "test", 60)
    }

    #[rstest]
    fn assets_derive_their_extension(tarball: Candidate) {
        assert_eq!(tarball.extension(), "tar.gz");
        assert_eq!(tarball.format(), Some(InstallFormat::TarGz));
        assert_eq!(tarball.kind(), CandidateKind::Asset);
        assert!(tarball.url().is_some());
        assert!(tarball.code().is_none());
    }

    #[rstest]
    fn exclusion_keeps_the_first_rejection(mut tarball: Candidate) {
        tarball.exclude(IncompatibilityCause::Platform, "linux");
        tarball.exclude(IncompatibilityCause::Architecture, "amd64");

        assert!(tarball.is_excluded());
        let rejection = tarball.rejection().expect("rejection recorded");
        assert_eq!(rejection.cause, IncompatibilityCause::Platform);
    }

    #[rstest]
    fn demotion_records_a_cause_only_when_it_excludes(mut tarball: Candidate) {
        tarball.demote(10, IncompatibilityCause::Prerelease, "minor");
        assert!(tarball.rejection().is_none());
        assert_eq!(tarball.priority(), 50);

        tarball.demote(1000, IncompatibilityCause::Prerelease, "stable exists");
        assert!(tarball.is_excluded());
        assert_eq!(
            tarball.rejection().map(|r| r.cause),
            Some(IncompatibilityCause::Prerelease)
        );
    }

    #[test]
    fn scripts_are_named_by_their_first_command() {
        let script = Candidate::script(
            "# install\nbrew install fzf\n",
            ScriptDocument::Readme,
            "test",
            140,
        );

        assert_eq!(script.kind(), CandidateKind::Script);
        assert_eq!(script.name(), "brew install fzf");
        assert_eq!(script.confidence(), 100);
        assert_eq!(script.priority(), 140);
        assert!(script.url().is_none());
    }
}
