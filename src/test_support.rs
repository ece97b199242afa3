//! Stub collaborators for tests in this and downstream crates.

use crate::record::{InstallRecord, RecordSink};
use crate::source::{PageFetcher, Release, ReleaseAsset, ReleaseSource, RepositoryRef, SourceError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Builds a release whose assets download from `https://example.com/<tag>/`.
#[must_use]
pub fn release_with_assets(tag: &str, prerelease: bool, assets: &[&str]) -> Release {
    Release {
        tag: tag.to_owned(),
        body: String::new(),
        prerelease,
        assets: assets
            .iter()
            .map(|name| ReleaseAsset {
                name: (*name).to_owned(),
                size: None,
                download_url: format!("https://example.com/{tag}/{name}"),
            })
            .collect(),
    }
}

/// Release source answering from fixed data.
#[derive(Debug, Clone, Default)]
pub struct StubReleaseSource {
    releases: Vec<Release>,
    readmes: HashMap<String, String>,
    failure: Option<SourceError>,
}

impl StubReleaseSource {
    /// A source with the given releases, newest first.
    #[must_use]
    pub fn with_releases(releases: Vec<Release>) -> Self {
        Self {
            releases,
            ..Self::default()
        }
    }

    /// Adds README text served from `branch`.
    #[must_use]
    pub fn with_readme(mut self, branch: &str, text: &str) -> Self {
        self.readmes.insert(branch.to_owned(), text.to_owned());
        self
    }

    /// Makes every release query fail with `error`.
    #[must_use]
    pub fn failing(error: SourceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }
}

impl ReleaseSource for StubReleaseSource {
    fn fetch_releases(&self, repository: &RepositoryRef) -> Result<Vec<Release>, SourceError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        match &repository.tag {
            Some(tag) => self
                .releases
                .iter()
                .find(|release| &release.tag == tag)
                .map(|release| vec![release.clone()])
                .ok_or_else(|| SourceError::NotFound {
                    resource: format!("{repository}@{tag}"),
                }),
            None => Ok(self.releases.clone()),
        }
    }

    fn fetch_readme(
        &self,
        _repository: &RepositoryRef,
        branch: &str,
    ) -> Result<Option<String>, SourceError> {
        Ok(self.readmes.get(branch).cloned())
    }
}

/// Page fetcher serving fixed HTML per URL.
#[derive(Debug, Clone, Default)]
pub struct StubPageFetcher {
    pages: HashMap<String, String>,
}

impl StubPageFetcher {
    /// Adds `html` served at `url`.
    #[must_use]
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_owned(), html.to_owned());
        self
    }
}

impl PageFetcher for StubPageFetcher {
    fn fetch_page(&self, url: &str) -> Result<String, SourceError> {
        self.pages.get(url).cloned().ok_or_else(|| SourceError::NotFound {
            resource: url.to_owned(),
        })
    }
}

/// Record sink that keeps records in memory, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<InstallRecord>>>,
}

impl RecordingSink {
    /// Records persisted so far.
    #[must_use]
    pub fn records(&self) -> Vec<InstallRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RecordSink for RecordingSink {
    fn persist(&mut self, record: &InstallRecord) -> std::io::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
