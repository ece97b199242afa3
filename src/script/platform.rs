//! Per-host vocabularies of compatible and incompatible command families.

use crate::pattern::literal;
use anyinstall_common::Os;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// A named family of commands recognised by one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFamily {
    /// Family name for diagnostics.
    pub name: &'static str,
    /// Regular expression matched against the script text.
    pub pattern: &'static str,
}

const fn family(name: &'static str, pattern: &'static str) -> CommandFamily {
    CommandFamily { name, pattern }
}

const BREW: CommandFamily = family("homebrew", r"\bbrew\b");
const MACPORTS: CommandFamily = family("macports", r"\bport\s+install\b");
const APT: CommandFamily = family("apt", r"\bapt(?:-get)?\b");
const RPM_MANAGERS: CommandFamily = family("dnf/yum", r"\b(?:dnf|yum)\b");
const PACMAN: CommandFamily = family("pacman", r"\bpacman\b");
const ZYPPER: CommandFamily = family("zypper", r"\bzypper\b");
const APK: CommandFamily = family("apk", r"\bapk\s+add\b");
const SNAP: CommandFamily = family("snap", r"\bsnap\s+install\b");
const FLATPAK: CommandFamily = family("flatpak", r"\bflatpak\b");
const DEB_FILE: CommandFamily = family("deb", r"\.deb\b|\bdpkg\b");
const RPM_FILE: CommandFamily = family("rpm", r"\.rpm\b|\brpm\s+-");
const DISK_IMAGE: CommandFamily = family("dmg", r"\.dmg\b|\bhdiutil\b");
const MAC_PACKAGE: CommandFamily = family("pkg", r"\.pkg\b|\binstaller\s+-pkg\b");
const WINDOWS_BINARY: CommandFamily = family("exe/msi", r"(?i)\.exe\b|\.msi\b|\bmsiexec\b");
const WINDOWS_MANAGERS: CommandFamily = family("windows managers", r"\b(?:choco|scoop|winget)\b");
const POWERSHELL: CommandFamily = family(
    "powershell",
    r"(?i)\b(?:powershell|pwsh|iwr|iex|irm|invoke-webrequest|invoke-expression|invoke-restmethod)\b",
);
const DOWNLOADERS: CommandFamily = family("curl/wget", r"\b(?:curl|wget)\b");
const POSIX_SHELL: CommandFamily = family("posix shell", r"\|\s*(?:sudo\s+)?(?:ba|z)?sh\b|\.sh\b");
const FREEBSD_PKG: CommandFamily = family("freebsd pkg", r"\bpkg\s+install\b");

/// Compatible and incompatible families for one host OS.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    /// Families that run on the host.
    pub compatible: &'static [CommandFamily],
    /// Families that cannot run on the host.
    pub incompatible: &'static [CommandFamily],
}

const VOCABULARIES: &[(Os, Vocabulary)] = &[
    (
        Os::Darwin,
        Vocabulary {
            compatible: &[BREW, MACPORTS, DOWNLOADERS, POSIX_SHELL, DISK_IMAGE, MAC_PACKAGE],
            incompatible: &[
                APT,
                RPM_MANAGERS,
                PACMAN,
                ZYPPER,
                APK,
                SNAP,
                FLATPAK,
                DEB_FILE,
                RPM_FILE,
                WINDOWS_BINARY,
                WINDOWS_MANAGERS,
                POWERSHELL,
                FREEBSD_PKG,
            ],
        },
    ),
    (
        Os::Linux,
        Vocabulary {
            compatible: &[
                APT,
                RPM_MANAGERS,
                PACMAN,
                ZYPPER,
                APK,
                SNAP,
                FLATPAK,
                DEB_FILE,
                RPM_FILE,
                DOWNLOADERS,
                POSIX_SHELL,
            ],
            incompatible: &[
                MACPORTS,
                DISK_IMAGE,
                MAC_PACKAGE,
                WINDOWS_BINARY,
                WINDOWS_MANAGERS,
                POWERSHELL,
                FREEBSD_PKG,
            ],
        },
    ),
    (
        Os::Windows,
        Vocabulary {
            compatible: &[WINDOWS_MANAGERS, POWERSHELL, WINDOWS_BINARY],
            incompatible: &[
                BREW,
                MACPORTS,
                APT,
                RPM_MANAGERS,
                PACMAN,
                ZYPPER,
                APK,
                SNAP,
                FLATPAK,
                DEB_FILE,
                RPM_FILE,
                DISK_IMAGE,
                MAC_PACKAGE,
                POSIX_SHELL,
                FREEBSD_PKG,
            ],
        },
    ),
    (
        Os::FreeBsd,
        Vocabulary {
            compatible: &[FREEBSD_PKG, DOWNLOADERS, POSIX_SHELL],
            incompatible: &[
                BREW,
                MACPORTS,
                APT,
                RPM_MANAGERS,
                PACMAN,
                ZYPPER,
                APK,
                SNAP,
                FLATPAK,
                DEB_FILE,
                RPM_FILE,
                DISK_IMAGE,
                WINDOWS_BINARY,
                WINDOWS_MANAGERS,
                POWERSHELL,
            ],
        },
    ),
];

/// Adjustment per compatible family present.
pub const COMPATIBLE_BONUS: i64 = 10;
/// Adjustment per incompatible family present.
pub const INCOMPATIBLE_PENALTY: i64 = -100;

static COMPILED: LazyLock<BTreeMap<&'static str, Regex>> = LazyLock::new(|| {
    VOCABULARIES
        .iter()
        .flat_map(|(_, vocabulary)| vocabulary.compatible.iter().chain(vocabulary.incompatible))
        .map(|family| (family.pattern, literal(family.pattern)))
        .collect()
});

/// Vocabulary for `os`.
#[must_use]
pub fn vocabulary(os: Os) -> Option<&'static Vocabulary> {
    VOCABULARIES
        .iter()
        .find(|(candidate, _)| *candidate == os)
        .map(|(_, vocabulary)| vocabulary)
}

fn present(family: &CommandFamily, code: &str) -> bool {
    COMPILED
        .get(family.pattern)
        .is_some_and(|re| re.is_match(code))
}

/// Platform verdict for one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformFit {
    /// Compatible families found.
    pub compatible: Vec<&'static str>,
    /// Incompatible families found.
    pub incompatible: Vec<&'static str>,
}

impl PlatformFit {
    /// Reports whether the script can run on the host.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.incompatible.is_empty()
    }

    /// Score adjustment implied by the families found.
    #[must_use]
    pub fn adjustment(&self) -> i64 {
        let count = |families: &[&str]| i64::try_from(families.len()).unwrap_or(i64::MAX);
        COMPATIBLE_BONUS
            .saturating_mul(count(&self.compatible))
            .saturating_add(INCOMPATIBLE_PENALTY.saturating_mul(count(&self.incompatible)))
    }
}

/// Matches `code` against the vocabulary of `os`.
#[must_use]
pub fn assess(code: &str, os: Os) -> PlatformFit {
    let Some(vocabulary) = vocabulary(os) else {
        return PlatformFit {
            compatible: Vec::new(),
            incompatible: Vec::new(),
        };
    };
    let found = |families: &[CommandFamily]| {
        families
            .iter()
            .filter(|family| present(family, code))
            .map(|family| family.name)
            .collect::<Vec<_>>()
    };
    PlatformFit {
        compatible: found(vocabulary.compatible),
        incompatible: found(vocabulary.incompatible),
    }
}
