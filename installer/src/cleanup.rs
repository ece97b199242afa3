//! Removal of temporary directories left behind by a run.

use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A lazily created scratch directory owned by one pipeline unit.
///
/// The unit creates it during `execute` and releases it from `cleanup`, so
/// the directory is removed on success, failure, and cancellation alike.
#[derive(Debug, Default)]
pub struct WorkDir {
    dir: Option<TempDir>,
}

impl WorkDir {
    /// Path of the directory, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory cannot be created.
    pub fn path(&mut self) -> io::Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.path().to_path_buf());
        }
        let dir = tempfile::Builder::new().prefix("anyinstall-").tempdir()?;
        let path = dir.path().to_path_buf();
        self.dir = Some(dir);
        Ok(path)
    }

    /// Removes the directory if it was created.
    ///
    /// # Errors
    ///
    /// Returns the removal error after the read-only fallback also failed.
    pub fn release(&mut self) -> io::Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => Ok(()),
            Err(_) => remove_dir_with_fallback(&path),
        }
    }
}

/// Removes `dir` and everything under it.
///
/// A first failure is retried once after clearing read-only flags, which
/// extracted archives and mounted-image copies often carry. A missing
/// directory counts as removed.
///
/// # Errors
///
/// Returns the error of the retry when the directory still cannot be
/// removed.
pub fn remove_dir_with_fallback(dir: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            debug!(
                target: "anyinstall::cleanup",
                "removing {} failed ({err}); clearing read-only flags",
                dir.display()
            );
            make_writable(dir);
            std::fs::remove_dir_all(dir).inspect_err(|retry| {
                warn!(
                    target: "anyinstall::cleanup",
                    "could not remove {}: {retry}",
                    dir.display()
                );
            })
        }
    }
}

fn make_writable(path: &Path) {
    let Ok(metadata) = std::fs::symlink_metadata(path) else {
        return;
    };
    if metadata.file_type().is_symlink() {
        return;
    }
    let mut permissions = metadata.permissions();
    if permissions.readonly() {
        set_owner_writable(&mut permissions);
        if std::fs::set_permissions(path, permissions).is_err() {
            return;
        }
    }
    if metadata.is_dir() {
        if let Ok(entries) = std::fs::read_dir(path) {
            for entry in entries.flatten() {
                make_writable(&entry.path());
            }
        }
    }
}

#[cfg(unix)]
fn set_owner_writable(permissions: &mut std::fs::Permissions) {
    use std::os::unix::fs::PermissionsExt;

    permissions.set_mode(permissions.mode() | 0o700);
}

#[cfg(not(unix))]
fn set_owner_writable(permissions: &mut std::fs::Permissions) {
    permissions.set_readonly(false);
}
