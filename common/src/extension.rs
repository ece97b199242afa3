//! Extension normalization and the table of installable formats.

use crate::platform::Os;
use serde::{Deserialize, Serialize};
use std::fmt;

const COMPOUND_EXTENSIONS: &[&str] = &["tar.gz", "tar.xz", "tar.bz2", "tar.zst"];
const MAX_EXTENSION_LEN: usize = 8;

const COMPANION_EXTENSIONS: &[&str] = &[
    "sha256", "sha512", "sha1", "md5", "sig", "asc", "pem", "crt", "txt", "json", "sbom",
    "spdx", "yml", "yaml", "md", "pub", "minisig", "intoto", "sum", "b3",
];

/// Returns the lowercase extension of the last path segment of `name`.
///
/// Compound archive extensions (`tar.gz`, `tar.xz`, `tar.bz2`, `tar.zst`) are
/// recognised as a unit. Names without a dot, dot-files, and trailing
/// segments that do not look like an extension (version numbers, long words)
/// yield an empty string.
///
/// # Examples
///
/// ```
/// use anyinstall_common::get_extension;
///
/// assert_eq!(get_extension("tool-linux-amd64.tar.gz"), "tar.gz");
/// assert_eq!(get_extension("Tool.DMG"), "dmg");
/// assert_eq!(get_extension("tool-v1.2"), "");
/// assert_eq!(get_extension("tool"), "");
/// ```
#[must_use]
pub fn get_extension(name: &str) -> String {
    let segment = name
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if let Some(compound) = COMPOUND_EXTENSIONS.iter().find(|ext| {
        segment
            .strip_suffix(*ext)
            .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
    }) {
        return (*compound).to_owned();
    }

    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && looks_like_extension(ext) => ext.to_owned(),
        _ => String::new(),
    }
}

fn looks_like_extension(ext: &str) -> bool {
    !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
        && !ext.chars().all(|c| c.is_ascii_digit())
}

/// Reports whether `name` is a checksum, signature, or metadata file that
/// accompanies a release rather than being installable itself.
#[must_use]
pub fn is_companion_file(name: &str) -> bool {
    let lowered = name.to_ascii_lowercase();
    if lowered.contains("checksum") || lowered.starts_with("sha256sums") {
        return true;
    }
    let ext = get_extension(&lowered);
    COMPANION_EXTENSIONS.contains(&ext.as_str())
}

/// Formats the installer knows how to put on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallFormat {
    /// Gzip-compressed tarball.
    TarGz,
    /// XZ-compressed tarball.
    TarXz,
    /// Bzip2-compressed tarball.
    TarBz2,
    /// Zstandard-compressed tarball.
    TarZst,
    /// Zip archive.
    Zip,
    /// 7-Zip archive.
    SevenZip,
    /// macOS disk image.
    Dmg,
    /// macOS installer package.
    Pkg,
    /// Debian package.
    Deb,
    /// RPM package.
    Rpm,
    /// Linux `AppImage`.
    AppImage,
    /// Windows installer database.
    Msi,
    /// Windows executable.
    Exe,
    /// Shell script.
    Shell,
    /// Bare executable without an extension.
    Binary,
}

impl InstallFormat {
    /// Every known format.
    pub const ALL: [Self; 15] = [
        Self::TarGz,
        Self::TarXz,
        Self::TarBz2,
        Self::TarZst,
        Self::Zip,
        Self::SevenZip,
        Self::Dmg,
        Self::Pkg,
        Self::Deb,
        Self::Rpm,
        Self::AppImage,
        Self::Msi,
        Self::Exe,
        Self::Shell,
        Self::Binary,
    ];

    /// Maps a normalized extension to its format.
    ///
    /// The empty extension maps to [`InstallFormat::Binary`]; unknown
    /// extensions map to `None`.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let format = match ext {
            "" => Self::Binary,
            "tar.gz" | "tgz" => Self::TarGz,
            "tar.xz" | "txz" => Self::TarXz,
            "tar.bz2" | "tbz" | "tbz2" => Self::TarBz2,
            "tar.zst" | "tzst" => Self::TarZst,
            "zip" => Self::Zip,
            "7z" => Self::SevenZip,
            "dmg" => Self::Dmg,
            "pkg" => Self::Pkg,
            "deb" => Self::Deb,
            "rpm" => Self::Rpm,
            "appimage" => Self::AppImage,
            "msi" => Self::Msi,
            "exe" => Self::Exe,
            "sh" => Self::Shell,
            _ => return None,
        };
        Some(format)
    }

    /// Canonical extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::TarXz => "tar.xz",
            Self::TarBz2 => "tar.bz2",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
            Self::SevenZip => "7z",
            Self::Dmg => "dmg",
            Self::Pkg => "pkg",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::AppImage => "appimage",
            Self::Msi => "msi",
            Self::Exe => "exe",
            Self::Shell => "sh",
            Self::Binary => "",
        }
    }

    /// The single OS this format can only be installed on, if any.
    #[must_use]
    pub const fn native_os(self) -> Option<Os> {
        match self {
            Self::Dmg | Self::Pkg => Some(Os::Darwin),
            Self::Deb | Self::Rpm | Self::AppImage => Some(Os::Linux),
            Self::Msi | Self::Exe => Some(Os::Windows),
            _ => None,
        }
    }

    /// Helper commands needed to install this format.
    ///
    /// Any one entry suffices; an empty slice means no helper is needed.
    #[must_use]
    pub const fn required_commands(self) -> &'static [&'static str] {
        match self {
            Self::Deb => &["dpkg"],
            Self::Rpm => &["rpm"],
            Self::Pkg => &["installer"],
            Self::Dmg => &["hdiutil"],
            Self::Msi => &["msiexec"],
            Self::TarXz | Self::TarBz2 => &["tar"],
            Self::SevenZip => &["7z", "7za"],
            Self::Shell => &["sh"],
            _ => &[],
        }
    }

    /// Reports whether this format is an archive that must be unpacked.
    #[must_use]
    pub const fn is_archive(self) -> bool {
        matches!(
            self,
            Self::TarGz | Self::TarXz | Self::TarBz2 | Self::TarZst | Self::Zip | Self::SevenZip
        )
    }
}

impl fmt::Display for InstallFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary => f.write_str("binary"),
            other => f.write_str(other.extension()),
        }
    }
}
