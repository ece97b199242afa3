//! `anyinstall list`: recorded installs, newest last.

use crate::cli::ListArgs;
use crate::error::{InstallerError, Result};
use crate::output::{format_human, format_json};
use crate::store::JsonRecordStore;
use log::trace;
use std::io::Write;

/// Writes the recorded installs to `stdout`.
///
/// # Errors
///
/// Returns an error when the store cannot be read or `stdout` rejects the
/// write.
pub fn run_list(args: &ListArgs, store: &JsonRecordStore, stdout: &mut dyn Write) -> Result<()> {
    let records = store.all()?;
    trace!(
        target: "anyinstall::list",
        "{} records in {}",
        records.len(),
        store.path().display()
    );
    let output = if args.json {
        format_json(&records)
    } else {
        format_human(&records)
    };
    writeln!(stdout, "{output}").map_err(|source| InstallerError::WriteFailed { source })?;
    Ok(())
}
