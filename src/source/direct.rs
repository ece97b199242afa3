//! Single-candidate providers for direct links and local files.

use crate::candidate::{Candidate, CandidateOrigin};
use crate::context::{ResolutionContext, SourceKind};
use crate::error::{ResolveError, Result};
use crate::pipeline::Unit;
use log::debug;
use url::Url;

/// File name a URL points at: its last non-empty path segment.
fn file_name_of(url: &Url) -> Option<String> {
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
}

/// Offers the file behind a direct download URL.
///
/// Reads `source`; writes `candidates`.
#[derive(Debug, Clone, Copy)]
pub struct DirectLinkProvider {
    base: i64,
}

impl DirectLinkProvider {
    /// Identifier of this unit.
    pub const ID: &'static str = "direct-link";

    /// Creates the provider; the candidate starts at `base` priority.
    #[must_use]
    pub const fn new(base: i64) -> Self {
        Self { base }
    }
}

impl Unit for DirectLinkProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        matches!(ctx.source, Some(SourceKind::DirectUrl(_))) && ctx.candidates.is_empty()
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let Some(SourceKind::DirectUrl(url)) = ctx.source.clone() else {
            return Ok(());
        };
        let name = file_name_of(&url).ok_or_else(|| ResolveError::InvalidSource {
            input: url.to_string(),
        })?;
        debug!(target: "anyinstall::source", "direct link to {name}");
        ctx.candidates
            .push(Candidate::asset(name, CandidateOrigin::Url(url), Self::ID, self.base));
        Ok(())
    }
}

/// Offers a file already on disk.
///
/// Reads `source`; writes `candidates`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFileProvider {
    base: i64,
}

impl LocalFileProvider {
    /// Identifier of this unit.
    pub const ID: &'static str = "local-file";

    /// Creates the provider; the candidate starts at `base` priority.
    #[must_use]
    pub const fn new(base: i64) -> Self {
        Self { base }
    }
}

impl Unit for LocalFileProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        matches!(ctx.source, Some(SourceKind::LocalPath(_))) && ctx.candidates.is_empty()
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let Some(SourceKind::LocalPath(path)) = ctx.source.clone() else {
            return Ok(());
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ResolveError::InvalidSource {
                input: path.display().to_string(),
            })?;
        let size = std::fs::metadata(&path).ok().map(|meta| meta.len());
        ctx.candidates.push(
            Candidate::asset(name, CandidateOrigin::LocalPath(path), Self::ID, self.base)
                .with_size(size),
        );
        Ok(())
    }
}
