//! Behaviour-driven tests for end-to-end candidate resolution.

use anyinstall::config::ResolverConfig;
use anyinstall::context::ResolutionContext;
use anyinstall::error::ResolveError;
use anyinstall::resolver::Resolver;
use anyinstall::source::Release;
use anyinstall::test_support::{StubPageFetcher, StubReleaseSource, release_with_assets};
use anyinstall::CandidateKind;
use anyinstall_common::{Arch, CapabilitySet, Os, PlatformProfile};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

#[derive(Default)]
struct ResolutionWorld {
    platform: RefCell<Option<PlatformProfile>>,
    releases: RefCell<Vec<Release>>,
    readmes: RefCell<Vec<(String, String)>>,
    context: RefCell<Option<ResolutionContext>>,
    error: RefCell<Option<ResolveError>>,
}

#[fixture]
fn world() -> ResolutionWorld {
    ResolutionWorld::default()
}

fn asset_list(assets: &str) -> Vec<&str> {
    assets.split(',').map(str::trim).collect()
}

#[given("a {os} {arch} host")]
fn given_host(world: &ResolutionWorld, os: String, arch: String) {
    let host_os: Os = os.parse().expect("known OS in feature file");
    let host_arch: Arch = arch.parse().expect("known architecture in feature file");
    world.platform.replace(Some(PlatformProfile::new(host_os, host_arch)));
}

#[given("the repository publishes release {tag} with assets {assets}")]
fn given_release(world: &ResolutionWorld, tag: String, assets: String) {
    world
        .releases
        .borrow_mut()
        .push(release_with_assets(&tag, false, &asset_list(&assets)));
}

#[given("the repository publishes prerelease {tag} with assets {assets}")]
fn given_prerelease(world: &ResolutionWorld, tag: String, assets: String) {
    world
        .releases
        .borrow_mut()
        .push(release_with_assets(&tag, true, &asset_list(&assets)));
}

#[given("the repository publishes no release")]
fn given_no_release(world: &ResolutionWorld) {
    world.releases.borrow_mut().clear();
}

#[given("its README on {branch} contains the command {command}")]
fn given_readme(world: &ResolutionWorld, branch: String, command: String) {
    world.readmes.borrow_mut().push((branch, command));
}

#[when("the input {input} is resolved")]
fn when_resolved(world: &ResolutionWorld, input: String) {
    let mut source = StubReleaseSource::with_releases(world.releases.borrow().clone());
    for (branch, text) in world.readmes.borrow().iter() {
        source = source.with_readme(branch, text);
    }
    let platform = world.platform.borrow().clone().expect("host configured");
    let resolver = Resolver::new(
        ResolverConfig::default(),
        Box::new(source),
        Box::new(StubPageFetcher::default()),
    );
    let mut ctx = ResolutionContext::new(input, platform, CapabilitySet::default());
    if let Err(err) = resolver.resolve(&mut ctx, None) {
        world.error.replace(Some(err));
    }
    world.context.replace(Some(ctx));
}

#[then("the selected candidate is {name}")]
fn then_selected(world: &ResolutionWorld, name: String) {
    if let Some(err) = world.error.borrow().as_ref() {
        panic!("resolution failed: {err}");
    }
    let context = world.context.borrow();
    let selected = context
        .as_ref()
        .and_then(|ctx| ctx.selected.as_ref())
        .expect("a candidate is selected");
    assert_eq!(selected.name(), name);
}

#[then("an install script is selected")]
fn then_script_selected(world: &ResolutionWorld) {
    let context = world.context.borrow();
    let selected = context
        .as_ref()
        .and_then(|ctx| ctx.selected.as_ref())
        .expect("a candidate is selected");
    assert_eq!(selected.kind(), CandidateKind::Script);
}

#[then("resolution fails with {kind}")]
fn then_fails(world: &ResolutionWorld, kind: String) {
    let error = world.error.borrow();
    let err = error.as_ref().expect("resolution should fail");
    let matched = match kind.as_str() {
        "no-compatible-asset" => matches!(err, ResolveError::NoCompatibleAsset { .. }),
        "no-release" => matches!(err, ResolveError::NoReleaseFound { .. }),
        "invalid-source" => matches!(err, ResolveError::InvalidSource { .. }),
        other => panic!("unknown failure kind {other}"),
    };
    assert!(matched, "expected {kind}, got {err:?}");
}

#[then("the error mentions {text}")]
fn then_error_mentions(world: &ResolutionWorld, text: String) {
    let error = world.error.borrow();
    let message = error.as_ref().expect("resolution should fail").to_string();
    assert!(message.contains(&text), "{message:?} should mention {text:?}");
}

#[scenario(path = "tests/features/resolution.feature", index = 0)]
fn scenario_fzf_on_apple_silicon(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/resolution.feature", index = 1)]
fn scenario_ripgrep_aarch64(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/resolution.feature", index = 2)]
fn scenario_only_foreign_builds(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/resolution.feature", index = 3)]
fn scenario_readme_script_fallback(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/resolution.feature", index = 4)]
fn scenario_nothing_to_offer(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/resolution.feature", index = 5)]
fn scenario_stable_beats_prerelease(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/resolution.feature", index = 6)]
fn scenario_lone_prerelease(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/resolution.feature", index = 7)]
fn scenario_invalid_input(world: ResolutionWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/resolution.feature", index = 8)]
fn scenario_windows_gnu_builds(world: ResolutionWorld) {
    let _ = world;
}
