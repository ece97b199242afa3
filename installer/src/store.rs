//! Install records kept as a JSON array on disk.
//!
//! Records live at `<data_dir>/records.json`. Writers take an exclusive
//! `fs2` lock on a sibling `records.lock` file and replace the array through
//! a temporary file and a rename. A file that no longer parses is treated as
//! empty and overwritten on the next append.

use crate::dirs::BaseDirs;
use anyinstall::record::{InstallRecord, RecordSink};
use fs2::FileExt;
use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const RECORDS_FILENAME: &str = "records.json";
const LOCK_FILENAME: &str = "records.lock";

/// Errors raised while reading or writing install records.
#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    /// No data directory could be determined.
    #[error("could not determine the anyinstall data directory")]
    MissingDataDirectory,

    /// Creating the record directory failed.
    #[error("failed to create record directory {path}: {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Taking the store lock failed.
    #[error("failed to lock {path}: {source}")]
    Lock {
        /// Lock file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the record file failed.
    #[error("failed to read records from {path}: {source}")]
    Read {
        /// Record file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing the records failed.
    #[error("failed to serialize records: {source}")]
    Serialize {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing the record file failed.
    #[error("failed to write records to {path}: {source}")]
    Write {
        /// Record file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// File-backed store of [`InstallRecord`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRecordStore {
    path: PathBuf,
}

/// Holds the exclusive store lock until dropped.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            debug!(target: "anyinstall::store", "failed to release record lock: {err}");
        }
    }
}

impl JsonRecordStore {
    /// Store at an explicit file path.
    #[must_use]
    pub const fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store in the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::MissingDataDirectory`] when `dirs` cannot
    /// name a data directory.
    pub fn in_data_dir(dirs: &dyn BaseDirs) -> Result<Self, RecordStoreError> {
        let data_dir = dirs
            .data_dir()
            .ok_or(RecordStoreError::MissingDataDirectory)?;
        Ok(Self::at(data_dir.join(RECORDS_FILENAME)))
    }

    /// Path of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Read`] when an existing file cannot be read.
    pub fn all(&self) -> Result<Vec<InstallRecord>, RecordStoreError> {
        load_records(&self.path)
    }

    /// The most recent record for `source`.
    ///
    /// A pinned shorthand (`owner/repo@tag`) matches records of the same
    /// repository at any tag.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Read`] when an existing file cannot be read.
    pub fn latest_for(&self, source: &str) -> Result<Option<InstallRecord>, RecordStoreError> {
        let wanted = unpinned(source);
        Ok(self
            .all()?
            .into_iter()
            .rev()
            .find(|record| unpinned(&record.source) == wanted))
    }

    /// Appends `record` under the store lock.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory, lock, or file cannot be written.
    pub fn append(&self, record: &InstallRecord) -> Result<(), RecordStoreError> {
        let parent = self.parent()?;
        std::fs::create_dir_all(parent).map_err(|source| RecordStoreError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
        let _lock = self.lock(parent)?;
        let mut records = load_records(&self.path)?;
        records.push(record.clone());
        let json = serde_json::to_vec_pretty(&records)
            .map_err(|source| RecordStoreError::Serialize { source })?;
        write_atomic(&self.path, &json).map_err(|source| RecordStoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(
            target: "anyinstall::store",
            "stored record {} of {} in {}",
            records.len(),
            record.source,
            self.path.display()
        );
        Ok(())
    }

    fn parent(&self) -> Result<&Path, RecordStoreError> {
        self.path
            .parent()
            .ok_or_else(|| RecordStoreError::CreateDirectory {
                path: self.path.clone(),
                source: std::io::Error::other("record path has no parent"),
            })
    }

    fn lock(&self, parent: &Path) -> Result<StoreLock, RecordStoreError> {
        let lock_path = parent.join(LOCK_FILENAME);
        let lock_error = |source| RecordStoreError::Lock {
            path: lock_path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(lock_error)?;
        file.lock_exclusive().map_err(lock_error)?;
        Ok(StoreLock { file })
    }
}

impl RecordSink for JsonRecordStore {
    fn persist(&mut self, record: &InstallRecord) -> std::io::Result<()> {
        self.append(record).map_err(std::io::Error::other)
    }
}

/// `source` without an `@tag` suffix; URLs and paths are returned unchanged.
#[must_use]
pub fn unpinned(source: &str) -> &str {
    if source.contains("://") {
        return source;
    }
    source.split_once('@').map_or(source, |(base, _)| base)
}

fn load_records(path: &Path) -> Result<Vec<InstallRecord>, RecordStoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(|source| RecordStoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(&content) {
        Ok(records) => Ok(records),
        Err(err) => {
            warn!(
                target: "anyinstall::store",
                "ignoring unreadable records in {}: {err}",
                path.display()
            );
            Ok(Vec::new())
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(RECORDS_FILENAME);
    let tmp = path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()));
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}
