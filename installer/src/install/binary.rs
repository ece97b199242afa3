//! Single-file installs of bare executables.

use super::{command_name, pending, place_executable, selected_file};
use anyinstall::ResolutionContext;
use anyinstall::pipeline::Unit;
use anyinstall::record::{InstallMethod, InstallOutcome, InstalledFiles};
use log::info;
use std::path::PathBuf;

/// Copies a bare executable, `.exe`, or `AppImage` into the bin directory.
pub struct BinaryInstaller {
    bin_dir: PathBuf,
}

impl BinaryInstaller {
    /// Identifier of this unit.
    pub const ID: &'static str = "install-binary";

    /// Creates the unit copying into `bin_dir`.
    #[must_use]
    pub const fn new(bin_dir: PathBuf) -> Self {
        Self { bin_dir }
    }
}

impl Unit for BinaryInstaller {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        pending(ctx, InstallMethod::Binary)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> anyinstall::Result<()> {
        let Some((selected, file)) = selected_file(ctx) else {
            return Ok(());
        };
        let name = command_name(ctx, selected);
        let dest = place_executable(file, &self.bin_dir, &name)?;
        info!(target: "anyinstall::install", "installed {}", dest.display());
        ctx.outcome = Some(InstallOutcome {
            method: InstallMethod::Binary,
            files: InstalledFiles::Paths(vec![dest]),
        });
        Ok(())
    }
}
