//! CLI argument definitions for `anyinstall`.
//!
//! Kept apart from the entrypoint so parsing can be tested without running
//! anything.

use anyinstall_common::{Arch, Os};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Resolve an install request to one artefact and install it.
#[derive(Parser, Debug)]
#[command(name = "anyinstall")]
#[command(version, about)]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = concat!(
    "Resolve an install request to one artefact and install it.\n\n",
    "A source may be a repository shorthand (owner/repo or owner/repo@tag), ",
    "a repository or release URL, a direct download URL, a project website, ",
    "or a local file. Release assets, scraped download links, and install ",
    "scripts found in release notes or READMEs are scored against this ",
    "machine's operating system, architecture, and installed tools, and the ",
    "best one is installed.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the newest release of a repository:\n",
    "    $ anyinstall junegunn/fzf\n\n",
    "  Pin a release and skip confirmations:\n",
    "    $ anyinstall BurntSushi/ripgrep --tag 14.1.0 --yes\n\n",
    "  Show what would be installed on another platform:\n",
    "    $ anyinstall resolve junegunn/fzf --os darwin --arch arm64\n\n",
    "  Reinstall something installed before:\n",
    "    $ anyinstall update junegunn/fzf\n\n",
    "  List recorded installs:\n",
    "    $ anyinstall list --json",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Install arguments (used when no subcommand is given).
    #[command(flatten)]
    pub install: InstallArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve and install (default when no subcommand is given).
    Install(InstallArgs),

    /// Resolve only and print the selection with its alternatives.
    Resolve(InstallArgs),

    /// Reinstall a recorded source, preferring its previous install method.
    Update(InstallArgs),

    /// List recorded installs.
    List(ListArgs),
}

/// Arguments shared by install, resolve, and update.
#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Repository shorthand, URL, or local path.
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    /// Release tag to use instead of the newest release.
    #[arg(long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Answer yes to every confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,

    /// Directory receiving executables [default: ~/.local/bin].
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<Utf8PathBuf>,

    /// Resolve for this operating system instead of the host's.
    #[arg(long, value_name = "OS")]
    pub os: Option<Os>,

    /// Resolve for this architecture instead of the host's.
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<Arch>,

    /// Configuration file [default: platform config directory].
    #[arg(long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only print errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Arguments for the list command.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (repeatable: -v, -vv, -vvv).
    #[arg(short, long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl InstallArgs {
    /// The source with `--tag` folded into repository shorthands.
    ///
    /// A tag already present in the source wins over `--tag`. URLs and paths
    /// are returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyinstall_installer::cli::InstallArgs;
    ///
    /// let args = InstallArgs {
    ///     source: Some("junegunn/fzf".to_owned()),
    ///     tag: Some("v0.54.0".to_owned()),
    ///     ..InstallArgs::default()
    /// };
    /// assert_eq!(args.effective_source().as_deref(), Some("junegunn/fzf@v0.54.0"));
    /// ```
    #[must_use]
    pub fn effective_source(&self) -> Option<String> {
        let source = self.source.as_deref()?.trim();
        match self.tag.as_deref() {
            Some(tag) if is_shorthand(source) && !source.contains('@') => {
                Some(format!("{source}@{tag}"))
            }
            _ => Some(source.to_owned()),
        }
    }
}

fn is_shorthand(source: &str) -> bool {
    !source.contains("://")
        && source.split('/').count() == 2
        && !source.starts_with(['.', '/', '~'])
}

impl Cli {
    /// Returns the effective install arguments.
    ///
    /// `List` carries no install arguments; the flattened defaults are
    /// returned for it.
    #[must_use]
    pub const fn install_args(&self) -> &InstallArgs {
        match &self.command {
            Some(Command::Install(args) | Command::Resolve(args) | Command::Update(args)) => args,
            Some(Command::List(_)) | None => &self.install,
        }
    }

    /// Requested log verbosity and quietness.
    #[must_use]
    pub fn verbosity(&self) -> (u8, bool) {
        match &self.command {
            Some(Command::List(args)) => (args.verbosity, false),
            _ => {
                let args = self.install_args();
                (args.verbosity, args.quiet)
            }
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
