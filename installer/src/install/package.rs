//! Native package installs through `dpkg`, `rpm`, `installer`, or `msiexec`.

use super::{install_failed, pending, selected_file};
use crate::confirm::Confirmer;
use crate::executor::{CommandExecutor, command_line, run_checked};
use anyinstall::pipeline::Unit;
use anyinstall::record::{InstallMethod, InstallOutcome, InstalledFiles};
use anyinstall::{ResolutionContext, ResolveError};
use anyinstall_common::InstallFormat;
use log::info;
use std::path::Path;
use std::rc::Rc;

const METHOD: InstallMethod = InstallMethod::SystemPackage;

/// Hands a native package to the platform installer after confirmation.
///
/// The OS decides where files go, so the outcome is
/// [`InstalledFiles::SystemInstall`].
pub struct SystemPackageInstaller {
    executor: Rc<dyn CommandExecutor>,
    confirmer: Rc<dyn Confirmer>,
}

impl SystemPackageInstaller {
    /// Identifier of this unit.
    pub const ID: &'static str = "install-system-package";

    /// Creates the unit.
    #[must_use]
    pub const fn new(executor: Rc<dyn CommandExecutor>, confirmer: Rc<dyn Confirmer>) -> Self {
        Self {
            executor,
            confirmer,
        }
    }
}

/// Program and arguments installing `package` of `format`.
#[must_use]
pub fn package_command(format: InstallFormat, package: &Path) -> Option<(&'static str, Vec<String>)> {
    let path = package.to_string_lossy().into_owned();
    let command = match format {
        InstallFormat::Deb => ("sudo", vec!["dpkg".to_owned(), "-i".to_owned(), path]),
        InstallFormat::Rpm => ("sudo", vec!["rpm".to_owned(), "-U".to_owned(), path]),
        InstallFormat::Pkg => (
            "sudo",
            vec![
                "installer".to_owned(),
                "-pkg".to_owned(),
                path,
                "-target".to_owned(),
                "/".to_owned(),
            ],
        ),
        InstallFormat::Msi => ("msiexec", vec!["/i".to_owned(), path, "/qn".to_owned()]),
        _ => return None,
    };
    Some(command)
}

impl Unit for SystemPackageInstaller {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        pending(ctx, METHOD)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> anyinstall::Result<()> {
        let Some((selected, package)) = selected_file(ctx) else {
            return Ok(());
        };
        let Some((program, owned_args)) = selected
            .format()
            .and_then(|format| package_command(format, package))
        else {
            return Err(install_failed(METHOD, "not a native package"));
        };
        let args: Vec<&str> = owned_args.iter().map(String::as_str).collect();
        let line = command_line(program, &args);
        if !self
            .confirmer
            .confirm(&format!("Install {} by running `{line}`?", selected.name()))
        {
            return Err(ResolveError::UserAborted {
                step: "system package install".to_owned(),
            });
        }
        run_checked(self.executor.as_ref(), program, &args)
            .map_err(|err| install_failed(METHOD, err))?;
        info!(target: "anyinstall::install", "installed {} via {program}", selected.name());
        ctx.outcome = Some(InstallOutcome {
            method: METHOD,
            files: InstalledFiles::SystemInstall,
        });
        Ok(())
    }
}
