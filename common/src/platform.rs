//! Host platform profile and the filename vocabularies used to recognise it.
//!
//! Release assets name their platform in free text (`darwin`, `macos`,
//! `apple`, ...) and their architecture likewise (`arm64`, `aarch64`,
//! `silicon`, ...). Each canonical [`Os`] and [`Arch`] owns an alias family;
//! a filename token belongs to a family when it equals one of its aliases.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Operating systems the resolver can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Os {
    /// macOS.
    Darwin,
    /// Linux distributions.
    Linux,
    /// Microsoft Windows.
    Windows,
    /// FreeBSD.
    FreeBsd,
}

/// CPU architectures the resolver can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arch {
    /// 64-bit ARM.
    Arm64,
    /// 64-bit x86.
    X86_64,
    /// 32-bit x86.
    X86,
    /// 32-bit ARM.
    Arm,
}

const OS_ALIASES: &[(Os, &[&str])] = &[
    (
        Os::Darwin,
        &["darwin", "macos", "macosx", "osx", "mac", "apple"],
    ),
    // `gnu` alone is not Linux: Rust's `*-pc-windows-gnu` targets use it too.
    (Os::Linux, &["linux", "musl", "ubuntu", "debian"]),
    (
        Os::Windows,
        &[
            "windows", "win", "win32", "win64", "msvc", "mingw", "mingw32", "mingw64",
        ],
    ),
    (Os::FreeBsd, &["freebsd"]),
];

const ARCH_ALIASES: &[(Arch, &[&str])] = &[
    (
        Arch::Arm64,
        &["arm64", "aarch64", "silicon", "armv8", "arm64e"],
    ),
    (Arch::X86_64, &["x86_64", "amd64", "x64", "intel64"]),
    (Arch::X86, &["x86", "i386", "i586", "i686", "386"]),
    (
        Arch::Arm,
        &["arm", "armv6", "armv7", "armv7l", "armhf", "armel", "arm32"],
    ),
];

/// Extensions each OS prefers, in no particular order.
///
/// Every entry earns the same flat boost so no single packaging format is
/// favoured over the others.
const PREFERRED_EXTENSIONS: &[(Os, &[&str])] = &[
    (Os::Darwin, &["dmg", "pkg", "zip", "tar.gz", "tgz", "tar.xz"]),
    (
        Os::Linux,
        &["appimage", "deb", "rpm", "tar.gz", "tgz", "tar.xz", "tar.zst"],
    ),
    (Os::Windows, &["msi", "exe", "zip"]),
    (Os::FreeBsd, &["tar.gz", "tgz", "tar.xz"]),
];

/// Errors raised when a platform cannot be identified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The operating system is not one the resolver knows.
    #[error("unsupported operating system \"{value}\"")]
    UnsupportedOs {
        /// The rejected value.
        value: String,
    },

    /// The architecture is not one the resolver knows.
    #[error("unsupported architecture \"{value}\"")]
    UnsupportedArch {
        /// The rejected value.
        value: String,
    },
}

impl Os {
    /// Every supported operating system.
    pub const ALL: [Self; 4] = [Self::Darwin, Self::Linux, Self::Windows, Self::FreeBsd];

    /// Canonical lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::FreeBsd => "freebsd",
        }
    }

    /// Filename tokens that identify this OS.
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        lookup(OS_ALIASES, self)
    }

    /// Extensions this OS prefers when several formats are available.
    #[must_use]
    pub fn preferred_extensions(self) -> &'static [&'static str] {
        lookup(PREFERRED_EXTENSIONS, self)
    }

    /// Returns the OS whose alias family contains `token`.
    ///
    /// The token must already be case-folded.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        family_of(OS_ALIASES, token)
    }
}

impl Arch {
    /// Every supported architecture.
    pub const ALL: [Self; 4] = [Self::Arm64, Self::X86_64, Self::X86, Self::Arm];

    /// Canonical lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::X86_64 => "x86_64",
            Self::X86 => "x86",
            Self::Arm => "arm",
        }
    }

    /// Filename tokens that identify this architecture.
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        lookup(ARCH_ALIASES, self)
    }

    /// Returns the architecture whose alias family contains `token`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        family_of(ARCH_ALIASES, token)
    }
}

fn lookup<K: PartialEq + Copy>(
    table: &'static [(K, &'static [&'static str])],
    key: K,
) -> &'static [&'static str] {
    table
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map_or(&[], |(_, values)| *values)
}

fn family_of<K: Copy>(table: &[(K, &[&str])], token: &str) -> Option<K> {
    table
        .iter()
        .find(|(_, aliases)| aliases.contains(&token))
        .map(|(key, _)| *key)
}

impl FromStr for Os {
    type Err = PlatformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let folded = value.trim().to_ascii_lowercase();
        Self::from_token(&folded).ok_or_else(|| PlatformError::UnsupportedOs {
            value: value.to_owned(),
        })
    }
}

impl FromStr for Arch {
    type Err = PlatformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let folded = value.trim().to_ascii_lowercase();
        Self::from_token(&folded).ok_or_else(|| PlatformError::UnsupportedArch {
            value: value.to_owned(),
        })
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The OS/architecture pair candidates are judged against.
///
/// # Examples
///
/// ```
/// use anyinstall_common::platform::{Arch, Os, PlatformProfile};
///
/// let host = PlatformProfile::new(Os::Darwin, Arch::Arm64);
/// assert!(host.os_aliases().contains(&"macos"));
/// assert!(host.arch_aliases().contains(&"aarch64"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformProfile {
    os: Os,
    arch: Arch,
}

impl PlatformProfile {
    /// Build a profile for an explicit OS and architecture.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the profile of the running host.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] when the compile-time OS or architecture is
    /// outside the supported set.
    pub fn detect() -> Result<Self, PlatformError> {
        Self::from_consts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Build a profile from `std::env::consts`-style identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError`] for unknown identifiers.
    pub fn from_consts(os: &str, arch: &str) -> Result<Self, PlatformError> {
        Ok(Self {
            os: os.parse()?,
            arch: arch.parse()?,
        })
    }

    /// The host operating system.
    #[must_use]
    pub const fn os(&self) -> Os {
        self.os
    }

    /// The host architecture.
    #[must_use]
    pub const fn arch(&self) -> Arch {
        self.arch
    }

    /// Alias tokens of the host OS family.
    #[must_use]
    pub fn os_aliases(&self) -> &'static [&'static str] {
        self.os.aliases()
    }

    /// Alias tokens of the host architecture family.
    #[must_use]
    pub fn arch_aliases(&self) -> &'static [&'static str] {
        self.arch.aliases()
    }

    /// Extensions preferred on the host OS.
    #[must_use]
    pub fn preferred_extensions(&self) -> &'static [&'static str] {
        self.os.preferred_extensions()
    }

    /// Returns a copy with the OS and/or architecture replaced.
    #[must_use]
    pub const fn with_overrides(self, os: Option<Os>, arch: Option<Arch>) -> Self {
        Self {
            os: match os {
                Some(value) => value,
                None => self.os,
            },
            arch: match arch {
                Some(value) => value,
                None => self.arch,
            },
        }
    }
}

impl fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}
