//! Loading [`ResolverConfig`] from TOML.
//!
//! An explicit `--config` path must exist. Without one, `config.toml` in the
//! platform config directory is read when present, and defaults apply
//! otherwise.

use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use anyinstall::ResolverConfig;
use camino::Utf8Path;
use log::debug;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.toml";

/// Loads the resolver configuration.
///
/// # Errors
///
/// Returns [`InstallerError::Config`] when the file cannot be read or does
/// not parse, or when an explicit path does not exist.
pub fn load_config(explicit: Option<&Utf8Path>, dirs: &dyn BaseDirs) -> Result<ResolverConfig> {
    if let Some(path) = explicit {
        return read_config(path.as_std_path());
    }
    match default_config_path(dirs) {
        Some(path) if path.is_file() => read_config(&path),
        Some(path) => {
            debug!(target: "anyinstall::config", "no config at {}; using defaults", path.display());
            Ok(ResolverConfig::default())
        }
        None => Ok(ResolverConfig::default()),
    }
}

fn default_config_path(dirs: &dyn BaseDirs) -> Option<PathBuf> {
    dirs.config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

fn read_config(path: &Path) -> Result<ResolverConfig> {
    let config_error = |reason: String| InstallerError::Config {
        path: path.to_path_buf(),
        reason,
    };
    let text = std::fs::read_to_string(path).map_err(|err| config_error(err.to_string()))?;
    let config = ResolverConfig::from_toml(&text).map_err(|err| config_error(err.to_string()))?;
    debug!(target: "anyinstall::config", "loaded {}", path.display());
    Ok(config)
}
