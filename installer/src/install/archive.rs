//! Archive installs: unpack, pick out the programs, and copy them to the
//! bin directory.

use super::{install_failed, pending, place_executable, selected_file};
use crate::cleanup::WorkDir;
use crate::extract::ArchiveExtractor;
use anyinstall::pipeline::Unit;
use anyinstall::record::{InstallMethod, InstallOutcome, InstalledFiles};
use anyinstall::{ResolutionContext, ResolveError};
use anyinstall_common::is_companion_file;
use log::{debug, info};
use std::path::{Path, PathBuf};

const METHOD: InstallMethod = InstallMethod::Archive;

/// Names that never hold a program even when marked executable.
const NON_PROGRAM_PREFIXES: [&str; 5] = ["readme", "license", "licence", "changelog", "copying"];
const NON_PROGRAM_EXTENSIONS: [&str; 10] =
    ["md", "txt", "1", "html", "json", "toml", "yml", "yaml", "bash", "fish"];

/// Unpacks an archive and copies the executables it contains.
pub struct ArchiveInstaller {
    extractor: Box<dyn ArchiveExtractor>,
    bin_dir: PathBuf,
    work: WorkDir,
}

impl ArchiveInstaller {
    /// Identifier of this unit.
    pub const ID: &'static str = "install-archive";

    /// Creates the unit copying executables into `bin_dir`.
    #[must_use]
    pub fn new(extractor: Box<dyn ArchiveExtractor>, bin_dir: PathBuf) -> Self {
        Self {
            extractor,
            bin_dir,
            work: WorkDir::default(),
        }
    }
}

impl Unit for ArchiveInstaller {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        pending(ctx, METHOD)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> anyinstall::Result<()> {
        let Some((selected, archive)) = selected_file(ctx) else {
            return Ok(());
        };
        let Some(format) = selected.format() else {
            return Err(install_failed(METHOD, "unknown archive format"));
        };
        let dest = self.work.path()?.join("unpacked");
        let files = self
            .extractor
            .extract(archive, &dest, format)
            .map_err(|err| install_failed(METHOD, err))?;

        let programs = find_programs(&files);
        if programs.is_empty() {
            return Err(install_failed(METHOD, "archive contains no executables"));
        }

        let mut installed = Vec::with_capacity(programs.len());
        for program in programs {
            let Some(name) = program.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let placed = place_executable(program, &self.bin_dir, name)?;
            info!(target: "anyinstall::install", "installed {}", placed.display());
            installed.push(placed);
        }
        ctx.outcome = Some(InstallOutcome {
            method: METHOD,
            files: InstalledFiles::Paths(installed),
        });
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &mut ResolutionContext) -> anyinstall::Result<()> {
        self.work.release().map_err(ResolveError::from)
    }
}

/// Files that look like programs.
///
/// Executable permission bits decide on Unix and `.exe` on Windows. When no
/// file qualifies (zip files often drop modes), extensionless files that are
/// not documentation are taken instead.
fn find_programs(files: &[PathBuf]) -> Vec<&Path> {
    let candidates: Vec<&Path> = files
        .iter()
        .map(PathBuf::as_path)
        .filter(|path| !is_documentation(path))
        .collect();
    let marked: Vec<&Path> = candidates
        .iter()
        .copied()
        .filter(|path| is_marked_executable(path))
        .collect();
    if !marked.is_empty() {
        return marked;
    }
    debug!(target: "anyinstall::install", "no executable bits set; using extensionless files");
    candidates
        .into_iter()
        .filter(|path| path.extension().is_none())
        .collect()
}

fn is_documentation(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return true;
    };
    let lowered = name.to_ascii_lowercase();
    if NON_PROGRAM_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return true;
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    is_companion_file(name) || NON_PROGRAM_EXTENSIONS.contains(&extension.as_str())
}

#[cfg(unix)]
fn is_marked_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path).is_ok_and(|meta| meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_marked_executable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
}
