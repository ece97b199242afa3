//! Archive extraction with path traversal protection.
//!
//! Gzip and zstd tarballs and zip files are unpacked in-process. Xz and
//! bzip2 tarballs go through the host `tar`, and 7z archives through `7z`,
//! whose presence the capability filter already checked.

use crate::executor::{CommandExecutor, run_checked};
use anyinstall_common::InstallFormat;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

/// Trait for extracting archives, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extracts `archive` of the given `format` into `dest`.
    ///
    /// Returns the regular files that were extracted.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape `dest`, [`ExtractionError::EmptyArchive`] if no files were
    /// found, and [`ExtractionError::Unsupported`] for non-archive formats.
    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        format: InstallFormat,
    ) -> Result<Vec<PathBuf>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container is malformed.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,

    /// The format is not an archive.
    #[error("{format} is not an archive format")]
    Unsupported {
        /// The rejected format.
        format: InstallFormat,
    },

    /// An external extraction tool failed.
    #[error("{tool} failed: {reason}")]
    Tool {
        /// The tool that ran.
        tool: &'static str,
        /// Description of the failure.
        reason: String,
    },
}

/// Extractor covering every archive format the resolver accepts.
pub struct StandardExtractor {
    executor: Rc<dyn CommandExecutor>,
}

impl StandardExtractor {
    /// Creates an extractor delegating external formats to `executor`.
    #[must_use]
    pub const fn new(executor: Rc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    fn run_tool(&self, tool: &'static str, args: &[&str]) -> Result<(), ExtractionError> {
        run_checked(self.executor.as_ref(), tool, args)
            .map(drop)
            .map_err(|err| ExtractionError::Tool {
                tool,
                reason: err.to_string(),
            })
    }
}

impl ArchiveExtractor for StandardExtractor {
    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        format: InstallFormat,
    ) -> Result<Vec<PathBuf>, ExtractionError> {
        debug!(
            target: "anyinstall::extract",
            "extracting {} as {format}",
            archive.display()
        );
        std::fs::create_dir_all(dest)?;
        let files = match format {
            InstallFormat::TarGz => {
                unpack_tar(flate2::read::GzDecoder::new(File::open(archive)?), dest)?
            }
            InstallFormat::TarZst => unpack_tar(zstd::Decoder::new(File::open(archive)?)?, dest)?,
            InstallFormat::Zip => unpack_zip(archive, dest)?,
            InstallFormat::TarXz | InstallFormat::TarBz2 => {
                let archive_arg = archive.to_string_lossy();
                let dest_arg = dest.to_string_lossy();
                self.run_tool("tar", &["-xf", &archive_arg, "-C", &dest_arg])?;
                list_files(dest)?
            }
            InstallFormat::SevenZip => {
                let archive_arg = archive.to_string_lossy();
                let output = format!("-o{}", dest.to_string_lossy());
                let args = ["x", "-y", output.as_str(), archive_arg.as_ref()];
                self.run_tool("7z", &args)
                    .or_else(|_| self.run_tool("7za", &args))?;
                list_files(dest)?
            }
            other => return Err(ExtractionError::Unsupported { format: other }),
        };

        if files.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }
        Ok(files)
    }
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;

        let dest_path = dest.join(&entry_path);
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        entry.unpack(&dest_path)?;

        if entry.header().entry_type().is_file() {
            extracted.push(dest_path);
        }
    }
    Ok(extracted)
}

fn unpack_zip(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>, ExtractionError> {
    let mut zip = zip::ZipArchive::new(File::open(archive)?)?;
    let mut extracted = Vec::new();

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            });
        };
        let dest_path = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
            continue;
        }
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&dest_path)?;
        std::io::copy(&mut entry, &mut out)?;
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;

            std::fs::set_permissions(&dest_path, std::fs::Permissions::from_mode(mode))?;
        }
        extracted.push(dest_path);
    }
    Ok(extracted)
}

/// Validate that an archive entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Every regular file under `dir`, depth first in directory order.
///
/// # Errors
///
/// Returns an I/O error when a directory cannot be read.
pub fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = std::fs::read_dir(&current)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();
        for path in entries {
            let file_type = std::fs::symlink_metadata(&path)?.file_type();
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
