//! Script installs.
//!
//! The script text is shown in full before it runs. Mined snippets go to the
//! shell inline; downloaded script assets run as files.

use super::{install_failed, pending};
use crate::confirm::Confirmer;
use crate::executor::{CommandExecutor, run_checked};
use anyinstall::pipeline::Unit;
use anyinstall::record::{InstallMethod, InstallOutcome, InstalledFiles};
use anyinstall::{ResolutionContext, ResolveError};
use log::info;
use std::rc::Rc;

const METHOD: InstallMethod = InstallMethod::Script;

#[cfg(not(windows))]
const SHELL: (&str, &[&str]) = ("sh", &["-c"]);
#[cfg(windows)]
const SHELL: (&str, &[&str]) = ("powershell", &["-NoProfile", "-Command"]);
#[cfg(not(windows))]
const SHELL_FILE: (&str, &[&str]) = ("sh", &[]);
#[cfg(windows)]
const SHELL_FILE: (&str, &[&str]) = ("powershell", &["-NoProfile", "-File"]);

/// Runs a mined install script after showing it to the user.
pub struct ScriptInstaller {
    executor: Rc<dyn CommandExecutor>,
    confirmer: Rc<dyn Confirmer>,
}

impl ScriptInstaller {
    /// Identifier of this unit.
    pub const ID: &'static str = "install-script";

    /// Creates the unit.
    #[must_use]
    pub const fn new(executor: Rc<dyn CommandExecutor>, confirmer: Rc<dyn Confirmer>) -> Self {
        Self {
            executor,
            confirmer,
        }
    }
}

impl Unit for ScriptInstaller {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        pending(ctx, METHOD)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> anyinstall::Result<()> {
        let Some(selected) = ctx.selected.as_ref() else {
            return Ok(());
        };
        // Mined snippets run inline; downloaded `.sh` assets run as files.
        let (body, inline) = match (selected.code(), ctx.download.as_ref()) {
            (Some(code), _) => (code.to_owned(), true),
            (None, Some(download)) => (download.path.to_string_lossy().into_owned(), false),
            (None, None) => return Err(install_failed(METHOD, "candidate carries no script")),
        };
        let shown = if inline {
            body.clone()
        } else {
            std::fs::read_to_string(&body)?
        };
        let prompt = format!(
            "Run this install script from {}?\n\n{shown}\n",
            selected.origin()
        );
        if !self.confirmer.confirm(&prompt) {
            return Err(ResolveError::UserAborted {
                step: "install script".to_owned(),
            });
        }
        let (shell, flags) = if inline { SHELL } else { SHELL_FILE };
        let mut args: Vec<&str> = flags.to_vec();
        args.push(&body);
        run_checked(self.executor.as_ref(), shell, &args)
            .map_err(|err| install_failed(METHOD, err))?;
        info!(target: "anyinstall::install", "install script finished");
        ctx.outcome = Some(InstallOutcome {
            method: METHOD,
            files: InstalledFiles::SystemInstall,
        });
        Ok(())
    }
}
