//! Release-asset discovery for repository sources.

use super::{Release, ReleaseSource, RepositoryRef, SourceError};
use crate::candidate::{Candidate, CandidateOrigin, ScriptDocument};
use crate::config::ResolverConfig;
use crate::context::{ResolutionContext, SourceDocument, SourceKind};
use crate::error::{ResolveError, Result};
use crate::pipeline::Unit;
use log::{debug, info, warn};
use url::Url;

/// Turns the assets of a repository's releases into candidates.
///
/// Reads `source`; writes `candidates`, `release`, `documents`, and
/// `release_missing`. Candidates come from the newest stable release plus
/// any newer prereleases, flagged as such. The README is fetched from the
/// configured branches in order, concurrently with the release list when
/// enabled; results are joined before any candidate is produced.
pub struct ReleaseAssetProvider {
    source: Box<dyn ReleaseSource>,
    asset_base: i64,
    readme_branches: Vec<String>,
    concurrent: bool,
}

impl ReleaseAssetProvider {
    /// Identifier of this unit.
    pub const ID: &'static str = "release-assets";

    /// Creates the provider around `source`.
    #[must_use]
    pub fn new(source: Box<dyn ReleaseSource>, config: &ResolverConfig) -> Self {
        Self {
            source,
            asset_base: config.weights.asset_base,
            readme_branches: config.readme_branches.clone(),
            concurrent: config.concurrent_fetch,
        }
    }

    fn fetch_readme(&self, repository: &RepositoryRef) -> Option<String> {
        self.readme_branches.iter().find_map(|branch| {
            match self.source.fetch_readme(repository, branch) {
                Ok(readme) => readme,
                Err(err) => {
                    debug!(target: "anyinstall::source", "README on {branch} unavailable: {err}");
                    None
                }
            }
        })
    }

    fn fetch(
        &self,
        repository: &RepositoryRef,
    ) -> (std::result::Result<Vec<Release>, SourceError>, Option<String>) {
        if !self.concurrent {
            return (
                self.source.fetch_releases(repository),
                self.fetch_readme(repository),
            );
        }
        std::thread::scope(|scope| {
            let readme_thread = scope.spawn(|| self.fetch_readme(repository));
            let releases = self.source.fetch_releases(repository);
            let readme = readme_thread.join().unwrap_or_else(|_| {
                warn!(target: "anyinstall::source", "README fetch thread panicked");
                None
            });
            (releases, readme)
        })
    }

    fn candidates_of(&self, release: &Release, prerelease: bool) -> Vec<Candidate> {
        release
            .assets
            .iter()
            .filter_map(|asset| match Url::parse(&asset.download_url) {
                Ok(url) => Some(
                    Candidate::asset(&asset.name, CandidateOrigin::Url(url), Self::ID, self.asset_base)
                        .with_size(asset.size)
                        .with_prerelease(prerelease),
                ),
                Err(err) => {
                    warn!(target: "anyinstall::source", "skipping {}: bad URL ({err})", asset.name);
                    None
                }
            })
            .collect()
    }
}

/// Splits newest-first `releases` into the release to describe the run and
/// the releases whose assets become candidates.
fn partition(releases: &[Release]) -> Option<(&Release, Vec<(&Release, bool)>)> {
    match releases.iter().position(|release| !release.prerelease) {
        Some(stable_index) => {
            let stable = releases.get(stable_index)?;
            let mut sources: Vec<(&Release, bool)> = vec![(stable, false)];
            sources.extend(releases.iter().take(stable_index).map(|r| (r, true)));
            Some((stable, sources))
        }
        None => releases.first().map(|newest| (newest, vec![(newest, true)])),
    }
}

impl Unit for ReleaseAssetProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        matches!(ctx.source, Some(SourceKind::Repository { .. }))
            && ctx.release.is_none()
            && !ctx.release_missing
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let Some(SourceKind::Repository { owner, repo, tag }) = ctx.source.clone() else {
            return Ok(());
        };
        let repository = RepositoryRef { owner, repo, tag };
        let (fetched, readme) = self.fetch(&repository);
        let releases = match fetched {
            Ok(listed) => listed,
            Err(SourceError::NotFound { resource }) => {
                debug!(target: "anyinstall::source", "no releases: {resource} not found");
                Vec::new()
            }
            Err(err) => {
                return Err(ResolveError::SourceUnavailable {
                    source_name: repository.to_string(),
                    reason: err.to_string(),
                });
            }
        };

        match partition(&releases) {
            Some((primary, sources)) => {
                info!(
                    target: "anyinstall::source",
                    "using release {} of {repository}",
                    primary.tag
                );
                for (release, prerelease) in sources {
                    let found = self.candidates_of(release, prerelease);
                    ctx.candidates.extend(found);
                }
                if !primary.body.trim().is_empty() {
                    ctx.documents.push(SourceDocument {
                        kind: ScriptDocument::ReleaseNotes,
                        text: primary.body.clone(),
                    });
                }
                ctx.release = Some(primary.clone());
            }
            None => {
                info!(target: "anyinstall::source", "{repository} publishes no release");
                ctx.release_missing = true;
            }
        }
        if let Some(text) = readme {
            ctx.documents.push(SourceDocument {
                kind: ScriptDocument::Readme,
                text,
            });
        }
        Ok(())
    }
}

/// Fails a repository run that found neither a release nor a script.
///
/// A repository that ships only an install script is not an error; this
/// unit runs last in the source phase, after the script provider.
#[derive(Debug, Default)]
pub struct RequireCandidates;

impl RequireCandidates {
    /// Identifier of this unit.
    pub const ID: &'static str = "require-candidates";
}

impl Unit for RequireCandidates {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        ctx.release_missing && ctx.candidates.is_empty()
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let repository = ctx
            .source
            .as_ref()
            .map_or_else(|| ctx.input().to_owned(), ToString::to_string);
        Err(ResolveError::NoReleaseFound { repository })
    }
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
