//! Install outcomes and the record emitted after a successful install.
//!
//! The core produces an [`InstallRecord`] and hands it to a [`RecordSink`].
//! Persistence belongs to the sink; the core reads earlier records only
//! indirectly, when an update run supplies a previous [`InstallMethod`] as a
//! hint.

use crate::candidate::{Candidate, CandidateKind, CandidateOrigin};
use crate::context::ResolutionContext;
use crate::error::Result;
use crate::pipeline::Unit;
use anyinstall_common::InstallFormat;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Procedure used to put an artefact on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallMethod {
    /// Unpack an archive and copy its executables.
    Archive,
    /// Copy a bare executable.
    Binary,
    /// Mount a disk image and copy its application bundle.
    DiskImage,
    /// Hand the file to the platform package installer.
    SystemPackage,
    /// Run a shell snippet.
    Script,
}

impl InstallMethod {
    /// Method that installs `format`.
    #[must_use]
    pub const fn for_format(format: InstallFormat) -> Self {
        match format {
            InstallFormat::TarGz
            | InstallFormat::TarXz
            | InstallFormat::TarBz2
            | InstallFormat::TarZst
            | InstallFormat::Zip
            | InstallFormat::SevenZip => Self::Archive,
            InstallFormat::Dmg => Self::DiskImage,
            InstallFormat::Pkg | InstallFormat::Deb | InstallFormat::Rpm | InstallFormat::Msi => {
                Self::SystemPackage
            }
            InstallFormat::Shell => Self::Script,
            InstallFormat::AppImage | InstallFormat::Exe | InstallFormat::Binary => Self::Binary,
        }
    }

    /// Method for `candidate`, if its format is known.
    #[must_use]
    pub fn for_candidate(candidate: &Candidate) -> Option<Self> {
        match candidate.kind() {
            CandidateKind::Script => Some(Self::Script),
            CandidateKind::Asset => candidate.format().map(Self::for_format),
        }
    }

    /// Stable identifier used in records and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Archive => "archive",
            Self::Binary => "binary",
            Self::DiskImage => "disk-image",
            Self::SystemPackage => "system-package",
            Self::Script => "script",
        }
    }
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files an install produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "paths")]
pub enum InstalledFiles {
    /// Paths written by the installer.
    Paths(Vec<PathBuf>),
    /// The OS-level installer decided placement.
    SystemInstall,
}

/// Result of the install phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Procedure that ran.
    pub method: InstallMethod,
    /// What it produced.
    pub files: InstalledFiles,
}

/// Persistable summary of one successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRecord {
    /// Raw input the user gave.
    pub source: String,
    /// Classified shape of the input.
    pub source_kind: String,
    /// Display name of the installed candidate.
    pub candidate: String,
    /// URL, path, or full script text of the candidate.
    pub origin: CandidateOrigin,
    /// Asset or script.
    pub kind: CandidateKind,
    /// Byte size the source advertised.
    #[serde(default)]
    pub size: Option<u64>,
    /// Whether the candidate came from a prerelease.
    #[serde(default)]
    pub prerelease: bool,
    /// Procedure that ran.
    pub method: InstallMethod,
    /// What it produced.
    pub files: InstalledFiles,
    /// Release tag, when the source had one.
    pub version: Option<String>,
    /// SHA-256 of the downloaded artefact.
    pub sha256: Option<String>,
    /// Seconds since the Unix epoch.
    pub installed_at: u64,
}

impl InstallRecord {
    /// Builds the record for a finished run, if it selected and installed.
    #[must_use]
    pub fn from_context(ctx: &ResolutionContext) -> Option<Self> {
        let selected = ctx.selected.as_ref()?;
        let outcome = ctx.outcome.as_ref()?;
        let installed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Some(Self {
            source: ctx.input().to_owned(),
            source_kind: ctx
                .source
                .as_ref()
                .map_or_else(|| "unknown".to_owned(), |kind| kind.label().to_owned()),
            candidate: selected.name().to_owned(),
            origin: selected.origin().clone(),
            kind: selected.kind(),
            size: selected.size(),
            prerelease: selected.is_prerelease(),
            method: outcome.method,
            files: outcome.files.clone(),
            version: ctx.release.as_ref().map(|release| release.tag.clone()),
            sha256: ctx.download.as_ref().and_then(|d| d.sha256.clone()),
            installed_at,
        })
    }
}

/// Receives install records for persistence.
#[cfg_attr(test, mockall::automock)]
pub trait RecordSink {
    /// Persists `record`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the record cannot be stored.
    fn persist(&mut self, record: &InstallRecord) -> std::io::Result<()>;
}

/// Install-phase unit that emits the record of a finished install.
///
/// Reads `selected`, `outcome`, `release`, and `download`; writes `record`.
/// A sink failure is logged rather than failing the run, because the install
/// itself already succeeded.
pub struct RecordInstall {
    sink: Box<dyn RecordSink>,
}

impl RecordInstall {
    /// Identifier of this unit.
    pub const ID: &'static str = "record-install";

    /// Creates the unit around `sink`.
    #[must_use]
    pub const fn new(sink: Box<dyn RecordSink>) -> Self {
        Self { sink }
    }
}

impl Unit for RecordInstall {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        ctx.outcome.is_some() && ctx.record.is_none()
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let Some(record) = InstallRecord::from_context(ctx) else {
            return Ok(());
        };
        match self.sink.persist(&record) {
            Ok(()) => debug!(target: "anyinstall::record", "recorded install of {}", record.candidate),
            Err(err) => warn!(target: "anyinstall::record", "could not record install: {err}"),
        }
        ctx.record = Some(record);
        Ok(())
    }
}
