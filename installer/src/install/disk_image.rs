//! `.dmg` installs through `hdiutil`.
//!
//! The image is attached read-only at a private mount point, its top-level
//! `.app` bundles are copied with `ditto`, and the image is detached during
//! cleanup whether or not the copy succeeded.

use super::{install_failed, pending, selected_file};
use crate::cleanup::{WorkDir, remove_dir_with_fallback};
use crate::executor::{CommandExecutor, run_checked};
use anyinstall::pipeline::Unit;
use anyinstall::record::{InstallMethod, InstallOutcome, InstalledFiles};
use anyinstall::{ResolutionContext, ResolveError};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::rc::Rc;

const METHOD: InstallMethod = InstallMethod::DiskImage;

/// Mounts a disk image and copies its application bundles.
pub struct DiskImageInstaller {
    executor: Rc<dyn CommandExecutor>,
    applications_dir: PathBuf,
    work: WorkDir,
    mounted: Option<PathBuf>,
}

impl DiskImageInstaller {
    /// Identifier of this unit.
    pub const ID: &'static str = "install-disk-image";

    /// Creates the unit copying bundles into `applications_dir`.
    #[must_use]
    pub fn new(executor: Rc<dyn CommandExecutor>, applications_dir: PathBuf) -> Self {
        Self {
            executor,
            applications_dir,
            work: WorkDir::default(),
            mounted: None,
        }
    }

    fn attach(&mut self, image: &Path) -> anyinstall::Result<PathBuf> {
        let mount = self.work.path()?.join("mount");
        std::fs::create_dir_all(&mount)?;
        let mount_arg = mount.to_string_lossy();
        let image_arg = image.to_string_lossy();
        run_checked(
            self.executor.as_ref(),
            "hdiutil",
            &[
                "attach",
                "-nobrowse",
                "-readonly",
                "-noautoopen",
                "-mountpoint",
                &mount_arg,
                &image_arg,
            ],
        )
        .map_err(|err| install_failed(METHOD, err))?;
        debug!(target: "anyinstall::install", "attached {} at {}", image.display(), mount.display());
        self.mounted = Some(mount.clone());
        Ok(mount)
    }

    fn copy_bundle(&self, bundle: &Path) -> anyinstall::Result<PathBuf> {
        let Some(name) = bundle.file_name() else {
            return Err(install_failed(METHOD, "bundle without a name"));
        };
        std::fs::create_dir_all(&self.applications_dir)?;
        let dest = self.applications_dir.join(name);
        if dest.exists() {
            remove_dir_with_fallback(&dest)?;
        }
        let source_arg = bundle.to_string_lossy();
        let dest_arg = dest.to_string_lossy();
        run_checked(self.executor.as_ref(), "ditto", &[&source_arg, &dest_arg])
            .map_err(|err| install_failed(METHOD, err))?;
        info!(target: "anyinstall::install", "installed {}", dest.display());
        Ok(dest)
    }
}

/// Top-level `.app` bundles under `mount`, sorted by name.
fn find_bundles(mount: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut bundles: Vec<PathBuf> = std::fs::read_dir(mount)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("app"))
        })
        .collect();
    bundles.sort();
    Ok(bundles)
}

impl Unit for DiskImageInstaller {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        pending(ctx, METHOD)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> anyinstall::Result<()> {
        let Some((_, selected_image)) = selected_file(ctx) else {
            return Ok(());
        };
        let image = selected_image.to_path_buf();
        let mount = self.attach(&image)?;
        let bundles = find_bundles(&mount)?;
        if bundles.is_empty() {
            return Err(install_failed(METHOD, "disk image contains no application bundle"));
        }
        let installed = bundles
            .iter()
            .map(|bundle| self.copy_bundle(bundle))
            .collect::<anyinstall::Result<Vec<_>>>()?;
        ctx.outcome = Some(InstallOutcome {
            method: METHOD,
            files: InstalledFiles::Paths(installed),
        });
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &mut ResolutionContext) -> anyinstall::Result<()> {
        let detached = match self.mounted.take() {
            Some(mount) => {
                let mount_arg = mount.to_string_lossy();
                run_checked(self.executor.as_ref(), "hdiutil", &["detach", "-force", &mount_arg])
                    .map(drop)
                    .map_err(|err| ResolveError::InstallFailed {
                        method: METHOD.to_string(),
                        reason: format!("detaching {}: {err}", mount.display()),
                    })
            }
            None => Ok(()),
        };
        // Remove the scratch directory only once nothing is mounted in it.
        detached?;
        self.work.release()?;
        Ok(())
    }
}
