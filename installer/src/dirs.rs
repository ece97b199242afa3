//! Platform directory resolution behind a mockable trait.

use directories_next::{BaseDirs as SystemDirs, ProjectDirs};
use std::path::PathBuf;

/// Environment variable that overrides the binary install directory.
pub const BIN_DIR_ENV: &str = "ANYINSTALL_BIN_DIR";

/// Directories the installer reads from and writes to.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Directory that receives installed executables.
    fn bin_dir(&self) -> Option<PathBuf>;

    /// Directory holding the install record store.
    fn data_dir(&self) -> Option<PathBuf>;

    /// Directory holding `config.toml`.
    fn config_dir(&self) -> Option<PathBuf>;

    /// Directory that receives application bundles from disk images.
    fn applications_dir(&self) -> Option<PathBuf>;
}

/// Directories derived from the platform conventions.
///
/// - bin: `$ANYINSTALL_BIN_DIR`, else `~/.local/bin`
/// - data: `~/.local/share/anyinstall` (Linux),
///   `~/Library/Application Support/anyinstall` (macOS)
/// - applications: `~/Applications`
#[derive(Debug, Clone, Default)]
pub struct SystemBaseDirs {
    home: Option<PathBuf>,
    data: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl SystemBaseDirs {
    /// Resolves the directories of the current user.
    #[must_use]
    pub fn new() -> Self {
        let project = ProjectDirs::from("", "", "anyinstall");
        Self {
            home: SystemDirs::new().map(|dirs| dirs.home_dir().to_path_buf()),
            data: project.as_ref().map(|p| p.data_dir().to_path_buf()),
            config: project.as_ref().map(|p| p.config_dir().to_path_buf()),
        }
    }
}

impl BaseDirs for SystemBaseDirs {
    fn bin_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = std::env::var_os(BIN_DIR_ENV).filter(|value| !value.is_empty()) {
            return Some(PathBuf::from(dir));
        }
        self.home.as_ref().map(|home| home.join(".local").join("bin"))
    }

    fn data_dir(&self) -> Option<PathBuf> {
        self.data.clone()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config.clone()
    }

    fn applications_dir(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join("Applications"))
    }
}
