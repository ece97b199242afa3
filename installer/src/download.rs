//! The download phase: fetching the selected artefact into a scratch
//! directory and fingerprinting it.

use crate::cleanup::WorkDir;
use anyinstall::context::Downloaded;
use anyinstall::pipeline::Unit;
use anyinstall::{CandidateOrigin, ResolutionContext, ResolveError};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::path::Path;
use url::Url;

/// Trait for downloading artefacts, so tests can avoid the network.
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Downloads `url` into the file at `dest`, returning the byte count.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn download(&self, url: &Url, dest: &Path) -> Result<u64, DownloadError>;
}

/// Errors arising from artefact download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested artefact was not found (HTTP 404).
    #[error("artefact not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// Hex SHA-256 of the file at `path`.
///
/// # Errors
///
/// Returns an I/O error when the file cannot be read.
pub fn compute_sha256(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Download-phase unit.
///
/// Reads `selected`; writes `download`. Remote assets land in a scratch
/// directory released during cleanup. Local files are used in place.
/// Scripts have nothing to download.
pub struct DownloadArtefact {
    downloader: Box<dyn ArtefactDownloader>,
    work: WorkDir,
}

impl DownloadArtefact {
    /// Identifier of this unit.
    pub const ID: &'static str = "download-artefact";

    /// Creates the unit around `downloader`.
    #[must_use]
    pub fn new(downloader: Box<dyn ArtefactDownloader>) -> Self {
        Self {
            downloader,
            work: WorkDir::default(),
        }
    }

    fn fetch(&mut self, url: &Url, name: &str) -> Result<Downloaded, ResolveError> {
        let file_name = Path::new(name)
            .file_name()
            .map_or_else(|| "artefact".into(), ToOwned::to_owned);
        let dest = self.work.path()?.join(file_name);
        info!(target: "anyinstall::download", "downloading {url}");
        let bytes = self
            .downloader
            .download(url, &dest)
            .map_err(|err| ResolveError::DownloadFailed {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        debug!(target: "anyinstall::download", "wrote {bytes} bytes to {}", dest.display());
        let sha256 = compute_sha256(&dest)?;
        Ok(Downloaded {
            path: dest,
            sha256: Some(sha256),
        })
    }
}

impl Unit for DownloadArtefact {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        ctx.download.is_none() && ctx.selected.as_ref().is_some_and(|c| c.is_asset())
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> anyinstall::Result<()> {
        let Some(selected) = ctx.selected.clone() else {
            return Ok(());
        };
        let downloaded = match selected.origin() {
            CandidateOrigin::Url(url) => self.fetch(url, selected.name())?,
            CandidateOrigin::LocalPath(path) => Downloaded {
                path: path.clone(),
                sha256: Some(compute_sha256(path)?),
            },
            CandidateOrigin::Script { .. } => return Ok(()),
        };
        ctx.download = Some(downloaded);
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &mut ResolutionContext) -> anyinstall::Result<()> {
        self.work.release()?;
        Ok(())
    }
}
