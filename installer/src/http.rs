//! HTTP collaborators backed by `ureq`.
//!
//! [`GitHubReleases`] answers release and README queries from the GitHub REST
//! API and raw content host, [`HttpPageFetcher`] fetches opaque web pages,
//! and [`HttpDownloader`] streams artefacts to disk. All share one agent with
//! a global timeout.

use crate::download::{ArtefactDownloader, DownloadError};
use anyinstall::source::{PageFetcher, Release, ReleaseAsset, ReleaseSource, RepositoryRef, SourceError};
use log::debug;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Network timeout for metadata and downloads.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Releases requested per page; the newest page is enough for selection.
const RELEASES_PER_PAGE: u8 = 30;

const USER_AGENT: &str = concat!("anyinstall/", env!("CARGO_PKG_VERSION"));

/// Environment variables consulted for an API token, in order.
pub const TOKEN_VARIABLES: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(HTTP_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Outcome of a GET that distinguishes "absent" from transport failure.
enum Fetched {
    Body(String),
    Missing,
}

fn get_text(url: &str, token: Option<&str>) -> Result<Fetched, SourceError> {
    let mut request = http_agent()
        .get(url)
        .header("User-Agent", USER_AGENT)
        .header("Accept", "application/vnd.github+json");
    if let Some(secret) = token {
        request = request.header("Authorization", &format!("Bearer {secret}"));
    }
    match request.call() {
        Ok(response) => response
            .into_body()
            .read_to_string()
            .map(Fetched::Body)
            .map_err(|err| unavailable(url, &err)),
        Err(ureq::Error::StatusCode(404)) => Ok(Fetched::Missing),
        Err(err) => Err(unavailable(url, &err)),
    }
}

fn unavailable(url: &str, err: &ureq::Error) -> SourceError {
    SourceError::Unavailable {
        resource: url.to_owned(),
        reason: err.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    tag_name: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    assets: Vec<ApiAsset>,
}

#[derive(Debug, Deserialize)]
struct ApiAsset {
    name: String,
    size: Option<u64>,
    browser_download_url: String,
}

impl From<ApiRelease> for Release {
    fn from(api: ApiRelease) -> Self {
        Self {
            tag: api.tag_name,
            body: api.body.unwrap_or_default(),
            prerelease: api.prerelease,
            assets: api
                .assets
                .into_iter()
                .map(|asset| ReleaseAsset {
                    name: asset.name,
                    size: asset.size,
                    download_url: asset.browser_download_url,
                })
                .collect(),
        }
    }
}

/// Parses a release list response, dropping drafts.
///
/// # Errors
///
/// Returns the JSON error for malformed responses.
pub fn parse_release_list(json: &str) -> Result<Vec<Release>, serde_json::Error> {
    let releases: Vec<ApiRelease> = serde_json::from_str(json)?;
    Ok(releases
        .into_iter()
        .filter(|release| !release.draft)
        .map(Release::from)
        .collect())
}

/// Parses a single-release response.
///
/// # Errors
///
/// Returns the JSON error for malformed responses.
pub fn parse_release(json: &str) -> Result<Release, serde_json::Error> {
    serde_json::from_str::<ApiRelease>(json).map(Release::from)
}

/// Release metadata from the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubReleases {
    api_base: String,
    raw_base: String,
    token: Option<String>,
}

impl GitHubReleases {
    /// A client for `api.github.com`, authenticated when a token variable is
    /// set.
    #[must_use]
    pub fn from_env() -> Self {
        let token = TOKEN_VARIABLES
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|value| !value.is_empty()));
        Self {
            api_base: "https://api.github.com".to_owned(),
            raw_base: "https://raw.githubusercontent.com".to_owned(),
            token,
        }
    }

    /// Whether requests carry a token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// API URL listing releases, or the one pinned by `repository.tag`.
    #[must_use]
    pub fn releases_url(&self, repository: &RepositoryRef) -> String {
        let RepositoryRef { owner, repo, tag } = repository;
        match tag {
            Some(tag) => format!("{}/repos/{owner}/{repo}/releases/tags/{tag}", self.api_base),
            None => format!(
                "{}/repos/{owner}/{repo}/releases?per_page={RELEASES_PER_PAGE}",
                self.api_base
            ),
        }
    }

    /// Raw URL of the README on `branch`.
    #[must_use]
    pub fn readme_url(&self, repository: &RepositoryRef, branch: &str) -> String {
        format!(
            "{}/{}/{}/{branch}/README.md",
            self.raw_base, repository.owner, repository.repo
        )
    }
}

impl ReleaseSource for GitHubReleases {
    fn fetch_releases(&self, repository: &RepositoryRef) -> Result<Vec<Release>, SourceError> {
        let url = self.releases_url(repository);
        debug!(target: "anyinstall::http", "GET {url}");
        let body = match get_text(&url, self.token.as_deref())? {
            Fetched::Body(body) => body,
            Fetched::Missing => {
                return Err(SourceError::NotFound {
                    resource: match &repository.tag {
                        Some(tag) => format!("{repository}@{tag}"),
                        None => repository.to_string(),
                    },
                });
            }
        };
        let parsed = if repository.tag.is_some() {
            parse_release(&body).map(|release| vec![release])
        } else {
            parse_release_list(&body)
        };
        parsed.map_err(|err| SourceError::Unavailable {
            resource: url,
            reason: format!("malformed release metadata: {err}"),
        })
    }

    fn fetch_readme(
        &self,
        repository: &RepositoryRef,
        branch: &str,
    ) -> Result<Option<String>, SourceError> {
        let url = self.readme_url(repository, branch);
        debug!(target: "anyinstall::http", "GET {url}");
        match get_text(&url, None)? {
            Fetched::Body(body) => Ok(Some(body)),
            Fetched::Missing => Ok(None),
        }
    }
}

/// Fetches web pages for link scraping.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpPageFetcher;

impl PageFetcher for HttpPageFetcher {
    fn fetch_page(&self, url: &str) -> Result<String, SourceError> {
        debug!(target: "anyinstall::http", "GET {url}");
        match get_text(url, None)? {
            Fetched::Body(body) => Ok(body),
            Fetched::Missing => Err(SourceError::NotFound {
                resource: url.to_owned(),
            }),
        }
    }
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDownloader;

impl ArtefactDownloader for HttpDownloader {
    fn download(&self, url: &Url, dest: &Path) -> Result<u64, DownloadError> {
        let response = http_agent()
            .get(url.as_str())
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| map_ureq_error(url.as_str(), &e))?;
        let mut file = std::fs::File::create(dest)?;
        let written = std::io::copy(&mut response.into_body().as_reader(), &mut file)
            .map_err(DownloadError::Io)?;
        Ok(written)
    }
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
