//! Orchestration of resolve, install, and update runs.
//!
//! The host collaborators are gathered in [`Backends`] so the same flow runs
//! against GitHub and the local system in production and against stubs in
//! tests. Every run builds one registry: the resolver's units, then
//! [`DownloadArtefact`], the install units, and [`RecordInstall`] last.

use crate::cli::InstallArgs;
use crate::confirm::{Confirmer, confirmer_for};
use crate::dirs::BaseDirs;
use crate::download::{ArtefactDownloader, DownloadArtefact};
use crate::error::{InstallerError, Result};
use crate::executor::{CommandExecutor, SystemCommandExecutor};
use crate::extract::StandardExtractor;
use crate::http::{GitHubReleases, HttpDownloader, HttpPageFetcher};
use crate::install::{InstallTarget, InstallTools, register_installers};
use crate::output::{success_message, write_stderr_line};
use crate::store::{JsonRecordStore, unpinned};
use anyinstall::pipeline::{CleanupWarning, Phase, Pipeline, UnitSpec};
use anyinstall::record::{InstallMethod, RecordInstall};
use anyinstall::source::{PageFetcher, ReleaseSource};
use anyinstall::{ResolutionContext, Resolver, ResolverConfig};
use anyinstall_common::{CapabilityProbe, CapabilitySet, PlatformProfile, WhichProbe};
use log::{debug, info};
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Host collaborators for one run.
pub struct Backends {
    /// Release metadata and READMEs.
    pub releases: Box<dyn ReleaseSource>,
    /// Opaque web pages.
    pub pages: Box<dyn PageFetcher>,
    /// Artefact downloads.
    pub downloader: Box<dyn ArtefactDownloader>,
    /// External commands.
    pub executor: Rc<dyn CommandExecutor>,
    /// Confirmation prompts.
    pub confirmer: Rc<dyn Confirmer>,
    /// Tool availability checks.
    pub probe: Box<dyn CapabilityProbe>,
}

impl Backends {
    /// Production collaborators.
    #[must_use]
    pub fn system(assume_yes: bool) -> Self {
        Self {
            releases: Box::new(GitHubReleases::from_env()),
            pages: Box::new(HttpPageFetcher),
            downloader: Box::new(HttpDownloader),
            executor: Rc::new(SystemCommandExecutor::default()),
            confirmer: confirmer_for(assume_yes),
            probe: Box::new(WhichProbe),
        }
    }
}

/// Per-run settings that are not collaborators.
pub struct RunOptions<'a> {
    /// Resolver tuning.
    pub config: ResolverConfig,
    /// Raised by the Ctrl-C handler.
    pub cancel: Arc<AtomicBool>,
    /// Progress and warning output.
    pub stderr: &'a mut dyn Write,
    /// Suppress progress lines.
    pub quiet: bool,
}

impl RunOptions<'_> {
    fn progress(&mut self, message: impl std::fmt::Display) {
        if !self.quiet {
            write_stderr_line(self.stderr, message);
        }
    }

    fn report_cleanup(&mut self, warnings: &[CleanupWarning]) {
        for warning in warnings {
            write_stderr_line(
                self.stderr,
                format!("warning: cleanup of {} failed: {}", warning.unit, warning.error),
            );
        }
    }
}

/// Where installs go, from `--bin-dir` or the platform directories.
///
/// # Errors
///
/// Returns [`InstallerError::MissingDirectory`] when no bin or applications
/// directory can be determined.
pub fn install_target(args: &InstallArgs, dirs: &dyn BaseDirs) -> Result<InstallTarget> {
    let bin_dir = match &args.bin_dir {
        Some(dir) => dir.clone().into_std_path_buf(),
        None => dirs
            .bin_dir()
            .ok_or(InstallerError::MissingDirectory { what: "bin" })?,
    };
    let applications_dir = dirs
        .applications_dir()
        .ok_or(InstallerError::MissingDirectory {
            what: "applications",
        })?;
    Ok(InstallTarget {
        bin_dir,
        applications_dir,
    })
}

/// The platform to resolve for: the host with any `--os`/`--arch` applied.
///
/// # Errors
///
/// Returns [`InstallerError::Platform`] when the host is unsupported and the
/// overrides do not name both values.
pub fn platform_for(args: &InstallArgs) -> Result<PlatformProfile> {
    if let (Some(os), Some(arch)) = (args.os, args.arch) {
        return Ok(PlatformProfile::new(os, arch));
    }
    Ok(PlatformProfile::detect()?.with_overrides(args.os, args.arch))
}

/// A fresh context for `source`.
///
/// # Errors
///
/// Returns [`InstallerError::Platform`] when the platform cannot be
/// determined.
pub fn new_context(
    source: &str,
    args: &InstallArgs,
    probe: &dyn CapabilityProbe,
    hint: Option<InstallMethod>,
) -> Result<ResolutionContext> {
    let platform = platform_for(args)?;
    let capabilities = CapabilitySet::detect(probe);
    debug!(
        target: "anyinstall::flow",
        "resolving {source} for {platform} with {} tools available",
        capabilities.iter().count()
    );
    Ok(ResolutionContext::new(source, platform, capabilities).with_method_hint(hint))
}

/// Resolves without downloading or installing.
///
/// # Errors
///
/// Returns the pipeline error or a missing-source error.
pub fn run_resolve(
    args: &InstallArgs,
    backends: Backends,
    options: &mut RunOptions<'_>,
) -> Result<ResolutionContext> {
    let source = args.effective_source().ok_or(InstallerError::MissingSource)?;
    let mut ctx = new_context(&source, args, backends.probe.as_ref(), None)?;
    let resolver = Resolver::new(options.config.clone(), backends.releases, backends.pages);
    let warnings = resolver.resolve(&mut ctx, Some(Arc::clone(&options.cancel)))?;
    options.report_cleanup(&warnings);
    Ok(ctx)
}

/// Resolves, downloads, installs, and records `source`.
///
/// # Errors
///
/// Returns the first failure; cleanup has already run when it does.
pub fn run_install(
    args: &InstallArgs,
    backends: Backends,
    target: &InstallTarget,
    store: JsonRecordStore,
    options: &mut RunOptions<'_>,
) -> Result<ResolutionContext> {
    let source = args.effective_source().ok_or(InstallerError::MissingSource)?;
    let request = Request {
        source: &source,
        args,
        hint: None,
    };
    install_source(&request, backends, target, store, options)
}

/// Reinstalls a recorded source, preferring its previous install method.
///
/// # Errors
///
/// Returns [`InstallerError::NoRecord`] when `source` was never installed,
/// and otherwise the same errors as [`run_install`].
pub fn run_update(
    args: &InstallArgs,
    backends: Backends,
    target: &InstallTarget,
    store: JsonRecordStore,
    options: &mut RunOptions<'_>,
) -> Result<ResolutionContext> {
    let requested = args.source.as_deref().ok_or(InstallerError::MissingSource)?;
    let record = store
        .latest_for(requested)?
        .ok_or_else(|| InstallerError::NoRecord {
            requested: requested.to_owned(),
        })?;
    // Without a new pin, update to the newest release of the recorded source.
    let pinned = args.tag.is_some() || unpinned(requested) != requested;
    let source = match args.effective_source() {
        Some(pin) if pinned => pin,
        _ => unpinned(&record.source).to_owned(),
    };
    info!(
        target: "anyinstall::flow",
        "updating {source}; previously installed {} via {}",
        record.candidate,
        record.method
    );
    options.progress(format!(
        "Updating {source} (installed {} via {})",
        record.version.as_deref().unwrap_or(&record.candidate),
        record.method
    ));
    let request = Request {
        source: &source,
        args,
        hint: Some(record.method),
    };
    install_source(&request, backends, target, store, options)
}

struct Request<'a> {
    source: &'a str,
    args: &'a InstallArgs,
    hint: Option<InstallMethod>,
}

fn install_source(
    request: &Request<'_>,
    backends: Backends,
    target: &InstallTarget,
    store: JsonRecordStore,
    options: &mut RunOptions<'_>,
) -> Result<ResolutionContext> {
    let source = request.source;
    let Backends {
        releases,
        pages,
        downloader,
        executor,
        confirmer,
        probe,
    } = backends;
    let mut ctx = new_context(source, request.args, probe.as_ref(), request.hint)?;

    let mut builder = Resolver::new(options.config.clone(), releases, pages).into_builder();
    builder.register(
        DownloadArtefact::new(downloader),
        UnitSpec::new(Phase::Download, 100),
    );
    let extractor = StandardExtractor::new(Rc::clone(&executor));
    let tools = InstallTools {
        executor,
        confirmer,
    };
    register_installers(&mut builder, target, &tools, Box::new(extractor));
    builder.register(
        RecordInstall::new(Box::new(store)),
        UnitSpec::new(Phase::Install, -100),
    );

    options.progress(format!("Resolving {source}..."));
    let mut pipeline =
        Pipeline::new(builder.build().map_err(anyinstall::ResolveError::from)?)
            .with_cancellation(Arc::clone(&options.cancel));
    let report = pipeline.run(&mut ctx);
    options.report_cleanup(&report.cleanup_warnings);
    report.outcome?;
    if let (Some(selected), Some(outcome)) = (ctx.selected.as_ref(), ctx.outcome.as_ref()) {
        options.progress(success_message(selected.name(), outcome));
    }
    Ok(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dirs::MockBaseDirs;
    use anyinstall_common::{Arch, Os};
    use camino::Utf8PathBuf;
    use std::path::PathBuf;

    #[test]
    fn bin_dir_flag_wins_over_platform_dirs() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_bin_dir().never();
        dirs.expect_applications_dir()
            .return_const(Some(PathBuf::from("/home/u/Applications")));
        let args = InstallArgs {
            bin_dir: Some(Utf8PathBuf::from("/opt/bin")),
            ..InstallArgs::default()
        };

        let target = install_target(&args, &dirs).expect("target");
        assert_eq!(target.bin_dir, PathBuf::from("/opt/bin"));
    }

    #[test]
    fn missing_bin_dir_is_reported() {
        let mut dirs = MockBaseDirs::new();
        dirs.expect_bin_dir().return_const(None);
        let err = install_target(&InstallArgs::default(), &dirs).expect_err("no bin dir");
        assert!(matches!(err, InstallerError::MissingDirectory { what: "bin" }));
    }

    #[test]
    fn full_overrides_skip_host_detection() {
        let args = InstallArgs {
            os: Some(Os::FreeBsd),
            arch: Some(Arch::Arm64),
            ..InstallArgs::default()
        };
        let platform = platform_for(&args).expect("platform");
        assert_eq!(platform.os(), Os::FreeBsd);
        assert_eq!(platform.arch(), Arch::Arm64);
    }
}
