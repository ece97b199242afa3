//! Source detectors: classify the raw input into a [`SourceKind`].
//!
//! Each detector is a detect-phase unit that runs only while no source has
//! been classified and its own pattern matches the input. Priorities order
//! them from most to least specific, so the first match wins.

use crate::context::{ResolutionContext, SourceKind};
use crate::error::{ResolveError, Result};
use crate::pattern::literal;
use crate::pipeline::{Phase, RegistryBuilder, Unit, UnitSpec};
use anyinstall_common::{InstallFormat, get_extension};
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use url::Url;

static SHORTHAND: LazyLock<Regex> = LazyLock::new(|| {
    literal(r"^(?P<owner>[A-Za-z0-9][A-Za-z0-9-]*)/(?P<repo>[A-Za-z0-9._-]+)(?:@(?P<tag>\S+))?$")
});

const REPOSITORY_HOSTS: &[&str] = &["github.com", "www.github.com"];

fn strip_git_suffix(repo: &str) -> &str {
    repo.strip_suffix(".git").unwrap_or(repo)
}

fn web_url(input: &str) -> Option<Url> {
    Url::parse(input)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
}

/// Classifies filesystem paths and `file://` URLs.
///
/// Inputs that look like paths (`/`, `./`, `../`, `~/`) are classified even
/// when missing, so the install step reports the missing file; anything else
/// must exist on disk.
#[must_use]
pub fn local_path(input: &str) -> Option<SourceKind> {
    if input.starts_with("file://") {
        return Url::parse(input)
            .ok()
            .and_then(|url| url.to_file_path().ok())
            .map(SourceKind::LocalPath);
    }
    if let Some(rest) = input.strip_prefix("~/") {
        let home = std::env::var_os("HOME")?;
        return Some(SourceKind::LocalPath(PathBuf::from(home).join(rest)));
    }
    let looks_like_path = ["/", "./", "../"].iter().any(|prefix| input.starts_with(prefix));
    (looks_like_path || Path::new(input).exists())
        .then(|| SourceKind::LocalPath(PathBuf::from(input)))
}

/// Classifies repository and release-page URLs on the hosting service.
///
/// `/releases/tag/<tag>` pins the tag; asset download URLs are left to
/// [`direct_download`].
#[must_use]
pub fn repository_url(input: &str) -> Option<SourceKind> {
    let url = web_url(input)?;
    if !REPOSITORY_HOSTS.contains(&url.host_str()?) {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let (owner, repo, rest) = match segments.as_slice() {
        [owner, repo, rest @ ..] => (*owner, strip_git_suffix(repo), rest),
        _ => return None,
    };
    let tag = match rest {
        [] | ["releases"] | ["releases", "latest"] => None,
        ["releases", "tag", tag] => Some((*tag).to_owned()),
        ["releases", "download", ..] => return None,
        _ => None,
    };
    Some(SourceKind::Repository {
        owner: owner.to_owned(),
        repo: repo.to_owned(),
        tag,
    })
}

/// Classifies `owner/repo` and `owner/repo@tag` shorthands.
///
/// # Examples
///
/// ```
/// use anyinstall::context::SourceKind;
/// use anyinstall::detect::shorthand;
///
/// assert_eq!(
///     shorthand("junegunn/fzf@v0.54.0"),
///     Some(SourceKind::Repository {
///         owner: "junegunn".into(),
///         repo: "fzf".into(),
///         tag: Some("v0.54.0".into()),
///     })
/// );
/// assert_eq!(shorthand("not a repo"), None);
/// ```
#[must_use]
pub fn shorthand(input: &str) -> Option<SourceKind> {
    let caps = SHORTHAND.captures(input)?;
    let repo = strip_git_suffix(caps.name("repo")?.as_str());
    if repo.is_empty() || repo.starts_with('.') {
        return None;
    }
    Some(SourceKind::Repository {
        owner: caps.name("owner")?.as_str().to_owned(),
        repo: repo.to_owned(),
        tag: caps.name("tag").map(|tag| tag.as_str().to_owned()),
    })
}

/// Classifies web URLs whose file name has an installable extension.
#[must_use]
pub fn direct_download(input: &str) -> Option<SourceKind> {
    let url = web_url(input)?;
    let name = url.path_segments()?.next_back()?;
    InstallFormat::from_extension(&get_extension(name))
        .filter(|format| *format != InstallFormat::Binary)
        .map(|_| SourceKind::DirectUrl(url))
}

/// Classifies any other web URL as a page to scrape.
#[must_use]
pub fn website(input: &str) -> Option<SourceKind> {
    web_url(input).map(SourceKind::Website)
}

/// A detect-phase unit wrapping one classification function.
#[derive(Debug, Clone, Copy)]
pub struct Detector {
    id: &'static str,
    classify: fn(&str) -> Option<SourceKind>,
}

impl Detector {
    /// Creates a detector named `id`.
    #[must_use]
    pub const fn new(id: &'static str, classify: fn(&str) -> Option<SourceKind>) -> Self {
        Self { id, classify }
    }
}

impl Unit for Detector {
    fn id(&self) -> &'static str {
        self.id
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        ctx.source.is_none() && (self.classify)(ctx.input()).is_some()
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let source = (self.classify)(ctx.input());
        if let Some(kind) = &source {
            debug!(
                target: "anyinstall::detect",
                "{} classified {:?} as {}",
                self.id,
                ctx.input(),
                kind.label()
            );
        }
        ctx.source = source;
        Ok(())
    }
}

/// Fails the run when no detector recognised the input.
#[derive(Debug, Default)]
pub struct RequireSource;

impl RequireSource {
    /// Identifier of this unit.
    pub const ID: &'static str = "require-source";
}

impl Unit for RequireSource {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        ctx.source.is_none()
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        Err(ResolveError::InvalidSource {
            input: ctx.input().to_owned(),
        })
    }
}

/// The built-in detectors and their priorities, most specific first.
pub const DETECTORS: [(Detector, i32); 5] = [
    (Detector::new("local-path", local_path), 120),
    (Detector::new("repository-url", repository_url), 100),
    (Detector::new("repository-shorthand", shorthand), 90),
    (Detector::new("direct-download", direct_download), 80),
    (Detector::new("website", website), 10),
];

/// Registers every detector plus the terminal [`RequireSource`] check.
pub fn register_detectors(builder: &mut RegistryBuilder) {
    for (detector, priority) in DETECTORS {
        builder.register(detector, UnitSpec::new(Phase::Detect, priority));
    }
    builder.register(RequireSource, UnitSpec::new(Phase::Detect, i32::MIN));
}
