//! Source-phase providers and the collaborators they consume.
//!
//! Providers turn a classified input into candidate records. Network access
//! happens only through [`ReleaseSource`] and [`PageFetcher`], whose
//! production implementations live in the installer crate.

mod direct;
mod release;
mod script;
mod website;

pub use direct::{DirectLinkProvider, LocalFileProvider};
pub use release::{ReleaseAssetProvider, RequireCandidates};
pub use script::ScriptProvider;
pub use website::{WebsiteProvider, extract_links, extract_preformatted};

use thiserror::Error;

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    /// File name.
    pub name: String,
    /// Size in bytes, when known.
    pub size: Option<u64>,
    /// Download URL.
    pub download_url: String,
}

/// Release metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Release {
    /// Tag name.
    pub tag: String,
    /// Free-text body, usually markdown.
    pub body: String,
    /// Whether the release is marked as a prerelease.
    pub prerelease: bool,
    /// Attached files.
    pub assets: Vec<ReleaseAsset>,
}

/// A repository and optional release tag to query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Release tag to pin.
    pub tag: Option<String>,
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Failures reported by source collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The resource does not exist.
    #[error("not found: {resource}")]
    NotFound {
        /// What was requested.
        resource: String,
    },

    /// The resource could not be fetched.
    #[error("{resource} is unavailable: {reason}")]
    Unavailable {
        /// What was requested.
        resource: String,
        /// Description of the failure.
        reason: String,
    },
}

/// Release metadata backend.
#[cfg_attr(test, mockall::automock)]
pub trait ReleaseSource: Send + Sync {
    /// Releases of `repository`, newest first.
    ///
    /// With a tag, returns just that release. Returns an empty list when
    /// the repository has none.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] for unknown repositories or tags and
    /// [`SourceError::Unavailable`] for transport failures.
    fn fetch_releases(&self, repository: &RepositoryRef) -> Result<Vec<Release>, SourceError>;

    /// README text of `repository` on `branch`, if present.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] for transport failures.
    fn fetch_readme(
        &self,
        repository: &RepositoryRef,
        branch: &str,
    ) -> Result<Option<String>, SourceError>;
}

/// Web page backend.
#[cfg_attr(test, mockall::automock)]
pub trait PageFetcher {
    /// Body of the page at `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the page cannot be fetched.
    fn fetch_page(&self, url: &str) -> Result<String, SourceError>;
}
