//! The resolution context threaded through every pipeline phase.
//!
//! One [`ResolutionContext`] exists per run. Units receive it by reference and
//! each documents the fields it reads and writes; nothing else holds it.

use crate::candidate::{Candidate, ScriptDocument};
use crate::record::{InstallMethod, InstallOutcome, InstallRecord};
use crate::source::Release;
use anyinstall_common::{CapabilitySet, PlatformProfile};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Classified shape of the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// A hosted repository with releases.
    Repository {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
        /// Release tag to pin, if the input named one.
        tag: Option<String>,
    },
    /// A URL pointing straight at an installable file.
    DirectUrl(Url),
    /// A web page that may link to downloads.
    Website(Url),
    /// A file on the local disk.
    LocalPath(PathBuf),
}

impl SourceKind {
    /// Short label used in records and logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Repository { .. } => "repository",
            Self::DirectUrl(_) => "direct-url",
            Self::Website(_) => "website",
            Self::LocalPath(_) => "local-path",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository {
                owner,
                repo,
                tag: Some(tag),
            } => write!(f, "{owner}/{repo}@{tag}"),
            Self::Repository { owner, repo, .. } => write!(f, "{owner}/{repo}"),
            Self::DirectUrl(url) | Self::Website(url) => write!(f, "{url}"),
            Self::LocalPath(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Free text fetched during the source phase that may hold install scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Which document this is.
    pub kind: ScriptDocument,
    /// Markdown or extracted text.
    pub text: String,
}

/// A selected artefact on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    /// File location.
    pub path: PathBuf,
    /// Hex SHA-256 of the file, when it was computed.
    pub sha256: Option<String>,
}

/// Mutable state of one resolution run.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    input: String,
    /// Host the candidates are judged against.
    pub platform: PlatformProfile,
    /// Helper tools available on the host.
    pub capabilities: CapabilitySet,
    /// Shape of the input, set by the detect phase.
    pub source: Option<SourceKind>,
    /// Every candidate discovered so far, excluded ones included.
    pub candidates: Vec<Candidate>,
    /// The chosen candidate, set by the select phase.
    pub selected: Option<Candidate>,
    /// Runner-up candidates kept for diagnostics only.
    pub alternatives: Vec<Candidate>,
    /// Local copy of the selected artefact, set by the download phase.
    pub download: Option<Downloaded>,
    /// Install result, set by the install phase.
    pub outcome: Option<InstallOutcome>,
    /// Release the asset candidates came from.
    pub release: Option<Release>,
    /// Documents to mine for install scripts.
    pub documents: Vec<SourceDocument>,
    /// Set when a repository publishes no release at all.
    pub release_missing: bool,
    /// Method preferred by a previous install of the same source.
    pub method_hint: Option<InstallMethod>,
    /// Record emitted after a successful install.
    pub record: Option<InstallRecord>,
}

impl ResolutionContext {
    /// Creates a fresh context for `input`.
    #[must_use]
    pub fn new(
        input: impl Into<String>,
        platform: PlatformProfile,
        capabilities: CapabilitySet,
    ) -> Self {
        Self {
            input: input.into(),
            platform,
            capabilities,
            source: None,
            candidates: Vec::new(),
            selected: None,
            alternatives: Vec::new(),
            download: None,
            outcome: None,
            release: None,
            documents: Vec::new(),
            release_missing: false,
            method_hint: None,
            record: None,
        }
    }

    /// Adds a previous install method as a scoring hint.
    #[must_use]
    pub const fn with_method_hint(mut self, hint: Option<InstallMethod>) -> Self {
        self.method_hint = hint;
        self
    }

    /// The raw input, trimmed.
    #[must_use]
    pub fn input(&self) -> &str {
        self.input.trim()
    }

    /// Candidates not yet excluded, in discovery order.
    pub fn viable(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| !c.is_excluded())
    }

    /// Mutable access to viable asset candidates; scripts are judged elsewhere.
    pub fn viable_assets_mut(&mut self) -> impl Iterator<Item = &mut Candidate> {
        self.candidates
            .iter_mut()
            .filter(|c| c.is_asset() && !c.is_excluded())
    }
}
