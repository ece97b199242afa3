//! `anyinstall` CLI entrypoint.
//!
//! Parses arguments, sets up logging and Ctrl-C handling, and hands off to
//! the install flow. Any error is printed with its hint and exits with 1.

use anyinstall_installer::cli::{Cli, Command, InstallArgs};
use anyinstall_installer::dirs::{BaseDirs, SystemBaseDirs};
use anyinstall_installer::error::{InstallerError, Result};
use anyinstall_installer::install_flow::{
    Backends, RunOptions, install_target, run_install, run_resolve, run_update,
};
use anyinstall_installer::list::run_list;
use anyinstall_installer::output::{format_selection, write_stderr_line};
use anyinstall_installer::settings::load_config;
use anyinstall_installer::store::JsonRecordStore;
use clap::Parser;
use log::LevelFilter;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status after a second Ctrl-C.
const EXIT_SIGINT: i32 = 130;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity());
    let cancel = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(&cancel);

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &cancel, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging((verbosity, quiet): (u8, bool)) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if quiet || verbosity > 0 {
        builder.filter_level(level_for(verbosity, quiet));
    }
    builder.target(env_logger::Target::Stderr).format_timestamp(None);
    if builder.try_init().is_err() {
        log::debug!(target: "anyinstall::cli", "logger already installed; keeping it");
    }
}

/// The first Ctrl-C lets the current step finish and cleanup run; a second
/// one exits immediately.
fn install_interrupt_handler(cancel: &Arc<AtomicBool>) {
    let flag = Arc::clone(cancel);
    let result = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(EXIT_SIGINT);
        }
    });
    if let Err(err) = result {
        log::warn!(target: "anyinstall::cli", "Ctrl-C handling unavailable: {err}");
    }
}

fn run(
    cli: &Cli,
    cancel: &Arc<AtomicBool>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    let dirs = SystemBaseDirs::new();
    match &cli.command {
        Some(Command::List(args)) => run_list(args, &JsonRecordStore::in_data_dir(&dirs)?, stdout),
        Some(Command::Resolve(args)) => {
            let (backends, mut options) = prepare(args, &dirs, cancel, stderr)?;
            let ctx = run_resolve(args, backends, &mut options)?;
            writeln!(stdout, "{}", format_selection(&ctx))
                .map_err(|source| InstallerError::WriteFailed { source })
        }
        Some(Command::Update(args)) => {
            let target = install_target(args, &dirs)?;
            let store = JsonRecordStore::in_data_dir(&dirs)?;
            let (backends, mut options) = prepare(args, &dirs, cancel, stderr)?;
            run_update(args, backends, &target, store, &mut options).map(drop)
        }
        Some(Command::Install(args)) => install(args, &dirs, cancel, stderr),
        None => install(&cli.install, &dirs, cancel, stderr),
    }
}

fn install(
    args: &InstallArgs,
    dirs: &dyn BaseDirs,
    cancel: &Arc<AtomicBool>,
    stderr: &mut dyn Write,
) -> Result<()> {
    let target = install_target(args, dirs)?;
    let store = JsonRecordStore::in_data_dir(dirs)?;
    let (backends, mut options) = prepare(args, dirs, cancel, stderr)?;
    run_install(args, backends, &target, store, &mut options).map(drop)
}

fn prepare<'a>(
    args: &InstallArgs,
    dirs: &dyn BaseDirs,
    cancel: &Arc<AtomicBool>,
    stderr: &'a mut dyn Write,
) -> Result<(Backends, RunOptions<'a>)> {
    let config = load_config(args.config.as_deref(), dirs)?;
    let backends = Backends::system(args.yes || config.assume_yes);
    let options = RunOptions {
        config,
        cancel: Arc::clone(cancel),
        stderr,
        quiet: args.quiet,
    };
    Ok((backends, options))
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            if let Some(hint) = err.hint() {
                write_stderr_line(stderr, format!("hint: {hint}"));
            }
            1
        }
    }
}
