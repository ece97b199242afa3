//! Install-phase units, one per install method.
//!
//! Each unit runs only when the selected candidate maps to its
//! [`InstallMethod`] and no earlier unit produced an outcome. Units read
//! `selected` and `download` and write `outcome`.
//!
//! - [`ArchiveInstaller`] - unpack and copy executables to the bin directory
//! - [`BinaryInstaller`] - copy a bare executable or `AppImage`
//! - [`DiskImageInstaller`] - mount a `.dmg` and copy its application bundle
//! - [`SystemPackageInstaller`] - hand `.deb`/`.rpm`/`.pkg`/`.msi` to the OS
//! - [`ScriptInstaller`] - run a confirmed shell snippet

mod archive;
mod binary;
mod disk_image;
mod package;
mod script;

pub use archive::ArchiveInstaller;
pub use binary::BinaryInstaller;
pub use disk_image::DiskImageInstaller;
pub use package::SystemPackageInstaller;
pub use script::ScriptInstaller;

use crate::confirm::Confirmer;
use crate::executor::CommandExecutor;
use crate::extract::ArchiveExtractor;
use anyinstall::pipeline::{Phase, RegistryBuilder, UnitSpec};
use anyinstall::record::InstallMethod;
use anyinstall::{Candidate, ResolutionContext, ResolveError, SourceKind};
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Where installs put their files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallTarget {
    /// Directory receiving executables.
    pub bin_dir: PathBuf,
    /// Directory receiving application bundles.
    pub applications_dir: PathBuf,
}

/// Host collaborators the install units share.
#[derive(Clone)]
pub struct InstallTools {
    /// Runs external commands.
    pub executor: Rc<dyn CommandExecutor>,
    /// Approves privileged or code-running steps.
    pub confirmer: Rc<dyn Confirmer>,
}

/// Registers every install unit in the Install phase.
pub fn register_installers(
    builder: &mut RegistryBuilder,
    target: &InstallTarget,
    tools: &InstallTools,
    extractor: Box<dyn ArchiveExtractor>,
) {
    builder.register(
        ArchiveInstaller::new(extractor, target.bin_dir.clone()),
        UnitSpec::new(Phase::Install, 100),
    );
    builder.register(
        BinaryInstaller::new(target.bin_dir.clone()),
        UnitSpec::new(Phase::Install, 100),
    );
    builder.register(
        DiskImageInstaller::new(Rc::clone(&tools.executor), target.applications_dir.clone()),
        UnitSpec::new(Phase::Install, 100),
    );
    builder.register(
        SystemPackageInstaller::new(Rc::clone(&tools.executor), Rc::clone(&tools.confirmer)),
        UnitSpec::new(Phase::Install, 100),
    );
    builder.register(
        ScriptInstaller::new(Rc::clone(&tools.executor), Rc::clone(&tools.confirmer)),
        UnitSpec::new(Phase::Install, 100),
    );
}

/// Whether `method` is the pending install for `ctx`.
fn pending(ctx: &ResolutionContext, method: InstallMethod) -> bool {
    if ctx.outcome.is_some() {
        return false;
    }
    let matches = ctx
        .selected
        .as_ref()
        .and_then(InstallMethod::for_candidate)
        .is_some_and(|selected| selected == method);
    matches && (method == InstallMethod::Script || ctx.download.is_some())
}

/// The selected candidate and its local file.
fn selected_file(ctx: &ResolutionContext) -> Option<(&Candidate, &Path)> {
    let selected = ctx.selected.as_ref()?;
    let download = ctx.download.as_ref()?;
    Some((selected, download.path.as_path()))
}

fn install_failed(method: InstallMethod, reason: impl Display) -> ResolveError {
    ResolveError::InstallFailed {
        method: method.to_string(),
        reason: reason.to_string(),
    }
}

/// Command name to install a bare executable under.
///
/// Repositories lend their name (`jq-linux-amd64` from `jqlang/jq` becomes
/// `jq`); other sources use the file name up to its first `-`, `_`, or `.`.
fn command_name(ctx: &ResolutionContext, candidate: &Candidate) -> String {
    let base = match &ctx.source {
        Some(SourceKind::Repository { repo, .. }) => repo.clone(),
        _ => candidate
            .name()
            .split(['-', '_', '.'])
            .find(|part| !part.is_empty())
            .unwrap_or("tool")
            .to_owned(),
    };
    if ctx.platform.os() == anyinstall_common::Os::Windows {
        format!("{base}.exe")
    } else {
        base
    }
}

/// Copies `source` into `bin_dir` as `name` and marks it executable.
fn place_executable(source: &Path, bin_dir: &Path, name: &str) -> io::Result<PathBuf> {
    std::fs::create_dir_all(bin_dir)?;
    let dest = bin_dir.join(name);
    if dest.exists() {
        std::fs::remove_file(&dest)?;
    }
    std::fs::copy(source, &dest)?;
    make_executable(&dest)?;
    Ok(dest)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    std::fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
const fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests;
