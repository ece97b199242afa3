//! Unit tests for release-asset discovery.

use super::*;
use crate::source::{MockReleaseSource, ReleaseAsset};
use anyinstall_common::{Arch, CapabilitySet, Os, PlatformProfile};
use rstest::{fixture, rstest};

fn release(tag: &str, prerelease: bool, assets: &[&str]) -> Release {
    Release {
        tag: tag.to_owned(),
        body: format!("Release {tag}"),
        prerelease,
        assets: assets
            .iter()
            .map(|name| ReleaseAsset {
                name: (*name).to_owned(),
                size: Some(1024),
                download_url: format!("https://example.com/{tag}/{name}"),
            })
            .collect(),
    }
}

#[fixture]
fn context() -> ResolutionContext {
    let mut ctx = ResolutionContext::new(
        "junegunn/fzf",
        PlatformProfile::new(Os::Darwin, Arch::Arm64),
        CapabilitySet::default(),
    );
    ctx.source = Some(SourceKind::Repository {
        owner: "junegunn".to_owned(),
        repo: "fzf".to_owned(),
        tag: None,
    });
    ctx
}

fn provider(source: MockReleaseSource, concurrent: bool) -> ReleaseAssetProvider {
    let config = ResolverConfig {
        concurrent_fetch: concurrent,
        ..ResolverConfig::default()
    };
    ReleaseAssetProvider::new(Box::new(source), &config)
}

type ReadmeResult = std::result::Result<Option<String>, SourceError>;

fn readme_on(
    branch: &'static str,
    text: &'static str,
) -> impl Fn(&RepositoryRef, &str) -> ReadmeResult + Send + 'static {
    move |_, requested| Ok((requested == branch).then(|| text.to_owned()))
}

#[rstest]
#[case::concurrent(true)]
#[case::sequential(false)]
fn stable_release_and_newer_prereleases_become_candidates(
    mut context: ResolutionContext,
    #[case] concurrent: bool,
) {
    let mut source = MockReleaseSource::new();
    source.expect_fetch_releases().times(1).returning(|_| {
        Ok(vec![
            release("v2.0.0-rc1", true, &["fzf-2.0.0-rc1-darwin_arm64.tar.gz"]),
            release("v1.9.0", false, &["fzf-1.9.0-darwin_arm64.tar.gz"]),
            release("v1.8.0", false, &["fzf-1.8.0-darwin_arm64.tar.gz"]),
        ])
    });
    source
        .expect_fetch_readme()
        .returning(readme_on("main", "brew install fzf"));
    let mut unit = provider(source, concurrent);

    unit.execute(&mut context).expect("release fetch succeeds");

    let names: Vec<_> = context
        .candidates
        .iter()
        .map(|c| (c.name(), c.is_prerelease()))
        .collect();
    assert_eq!(
        names,
        [
            ("fzf-1.9.0-darwin_arm64.tar.gz", false),
            ("fzf-2.0.0-rc1-darwin_arm64.tar.gz", true),
        ]
    );
    assert_eq!(context.release.as_ref().map(|r| r.tag.as_str()), Some("v1.9.0"));
    let kinds: Vec<_> = context.documents.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, [ScriptDocument::ReleaseNotes, ScriptDocument::Readme]);
    assert!(!unit.should_run(&context));
}

#[rstest]
fn readme_falls_back_to_master(mut context: ResolutionContext) {
    let mut source = MockReleaseSource::new();
    source
        .expect_fetch_releases()
        .returning(|_| Ok(vec![release("v1", false, &["tool.tar.gz"])]));
    source
        .expect_fetch_readme()
        .times(2)
        .returning(readme_on("master", "curl -fsSL https://x/install.sh | sh"));
    let mut unit = provider(source, false);

    unit.execute(&mut context).expect("release fetch succeeds");

    assert!(
        context
            .documents
            .iter()
            .any(|d| d.kind == ScriptDocument::Readme && d.text.contains("install.sh"))
    );
}

#[rstest]
#[case::empty_list(Ok(Vec::new()))]
#[case::not_found(Err(SourceError::NotFound { resource: "releases".to_owned() }))]
fn missing_releases_are_recorded_not_fatal(
    mut context: ResolutionContext,
    #[case] response: std::result::Result<Vec<Release>, SourceError>,
) {
    let mut source = MockReleaseSource::new();
    source
        .expect_fetch_releases()
        .return_once(move |_| response);
    source.expect_fetch_readme().returning(|_, _| Ok(None));
    let mut unit = provider(source, true);

    unit.execute(&mut context).expect("missing releases are not fatal");

    assert!(context.release_missing);
    assert!(context.candidates.is_empty());

    let mut require = RequireCandidates;
    assert!(require.should_run(&context));
    let err = require.execute(&mut context).expect_err("nothing to install");
    assert!(matches!(err, ResolveError::NoReleaseFound { repository } if repository == "junegunn/fzf"));
}

#[rstest]
fn transport_failures_are_terminal(mut context: ResolutionContext) {
    let mut source = MockReleaseSource::new();
    source.expect_fetch_releases().returning(|_| {
        Err(SourceError::Unavailable {
            resource: "api".to_owned(),
            reason: "timeout".to_owned(),
        })
    });
    source.expect_fetch_readme().returning(|_, _| Ok(None));
    let mut unit = provider(source, true);

    let err = unit.execute(&mut context).expect_err("transport failure");

    assert!(matches!(err, ResolveError::SourceUnavailable { .. }));
}

#[rstest]
fn only_prereleases_are_offered_unpenalized(mut context: ResolutionContext) {
    let mut source = MockReleaseSource::new();
    source.expect_fetch_releases().returning(|_| {
        Ok(vec![
            release("v0.2.0-beta", true, &["tool-beta.tar.gz"]),
            release("v0.1.0-alpha", true, &["tool-alpha.tar.gz"]),
        ])
    });
    source.expect_fetch_readme().returning(|_, _| Ok(None));
    let mut unit = provider(source, false);

    unit.execute(&mut context).expect("prerelease-only repositories resolve");

    let names: Vec<_> = context.candidates.iter().map(Candidate::name).collect();
    assert_eq!(names, ["tool-beta.tar.gz"]);
    assert!(context.candidates.iter().all(Candidate::is_prerelease));
}
