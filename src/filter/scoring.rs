//! Pure compatibility verdicts over asset names.
//!
//! Names are tokenized on `_`, space, `.` and `-`, case-folded, and each token
//! is looked up in the OS and architecture alias families. Adjacent tokens
//! are tried joined with `_` first so `x86_64` and `x86-64` read as one
//! architecture rather than `x86` plus a stray `64`.

use anyinstall_common::{Arch, CapabilitySet, InstallFormat, Os, PlatformProfile, is_companion_file};
use std::collections::BTreeSet;

/// OS and architecture tokens found in a name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTokens {
    /// Every OS family named.
    pub platforms: BTreeSet<Os>,
    /// Every architecture token, in order, duplicates kept.
    pub arches: Vec<Arch>,
}

/// Splits `name` into lowercase segments.
///
/// # Examples
///
/// ```
/// use anyinstall::filter::scoring::tokenize;
///
/// assert_eq!(tokenize("FZF-0.54_darwin arm64.tar.gz"), ["fzf", "0", "54", "darwin", "arm64", "tar", "gz"]);
/// ```
#[must_use]
pub fn tokenize(name: &str) -> Vec<String> {
    name.split(['_', ' ', '.', '-'])
        .filter(|segment| !segment.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Finds the OS and architecture tokens in `name`.
#[must_use]
pub fn classify(name: &str) -> NameTokens {
    let segments = tokenize(name);
    let mut tokens = NameTokens::default();
    let mut rest = segments.as_slice();
    while let Some((first, tail)) = rest.split_first() {
        if let Some((second, after_pair)) = tail.split_first() {
            let joined = format!("{first}_{second}");
            if let Some(arch) = Arch::from_token(&joined) {
                tokens.arches.push(arch);
                rest = after_pair;
                continue;
            }
        }
        if let Some(os) = Os::from_token(first) {
            tokens.platforms.insert(os);
        } else if let Some(arch) = Arch::from_token(first) {
            tokens.arches.push(arch);
        }
        rest = tail;
    }
    tokens
}

/// Outcome of the platform rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformVerdict {
    /// No OS token: tentatively compatible.
    Unknown,
    /// The name targets the host OS.
    Qualified,
    /// Only foreign OS families were named.
    Foreign(BTreeSet<Os>),
}

/// Applies the platform rule.
///
/// A format only installable on one OS counts as naming that OS, and a
/// format native to another OS is foreign whatever the name says.
#[must_use]
pub fn platform_verdict(
    tokens: &NameTokens,
    format: Option<InstallFormat>,
    host: &PlatformProfile,
) -> PlatformVerdict {
    let native = format.and_then(InstallFormat::native_os);
    if let Some(native_os) = native.filter(|os| *os != host.os()) {
        let mut foreign = tokens.platforms.clone();
        foreign.remove(&host.os());
        foreign.insert(native_os);
        return PlatformVerdict::Foreign(foreign);
    }
    if tokens.platforms.contains(&host.os()) {
        PlatformVerdict::Qualified
    } else if tokens.platforms.is_empty() {
        PlatformVerdict::Unknown
    } else {
        PlatformVerdict::Foreign(tokens.platforms.clone())
    }
}

/// Outcome of the architecture rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchVerdict {
    /// No architecture token: tentatively compatible.
    Unknown,
    /// The name carries this many host-architecture tokens.
    Matches(usize),
    /// Only foreign architectures were named.
    Foreign(Vec<Arch>),
}

/// Applies the architecture rule, independently of the platform rule.
#[must_use]
pub fn arch_verdict(tokens: &NameTokens, host: &PlatformProfile) -> ArchVerdict {
    if tokens.arches.is_empty() {
        return ArchVerdict::Unknown;
    }
    let matching = tokens
        .arches
        .iter()
        .filter(|arch| **arch == host.arch())
        .count();
    if matching == 0 {
        ArchVerdict::Foreign(tokens.arches.clone())
    } else {
        ArchVerdict::Matches(matching)
    }
}

/// Outcome of the extension rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionVerdict {
    /// An installable format.
    Installable(InstallFormat),
    /// A checksum, signature, or metadata file.
    Companion,
    /// An extension nothing can install.
    Unknown,
}

/// Classifies the file named `name` with normalized extension `ext`.
#[must_use]
pub fn extension_verdict(name: &str, ext: &str) -> ExtensionVerdict {
    if is_companion_file(name) {
        return ExtensionVerdict::Companion;
    }
    InstallFormat::from_extension(ext).map_or(ExtensionVerdict::Unknown, ExtensionVerdict::Installable)
}

/// Reports whether the host can act on `format`.
#[must_use]
pub fn capability_verdict(format: InstallFormat, capabilities: &CapabilitySet) -> bool {
    capabilities.supports(format)
}

/// Reports whether the host OS prefers `ext`.
#[must_use]
pub fn is_preferred_extension(ext: &str, host: &PlatformProfile) -> bool {
    host.preferred_extensions().contains(&ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn mac() -> PlatformProfile {
        PlatformProfile::new(Os::Darwin, Arch::Arm64)
    }

    #[rstest]
    #[case::underscore("tool_x86_64.tar.gz", &[Arch::X86_64])]
    #[case::hyphen("tool-x86-64.zip", &[Arch::X86_64])]
    #[case::bare_x86("tool-x86.zip", &[Arch::X86])]
    #[case::twice("tool-arm64-aarch64", &[Arch::Arm64, Arch::Arm64])]
    #[case::none("tool-1.2.3.tar.gz", &[])]
    fn classify_joins_architecture_pairs(#[case] name: &str, #[case] expected: &[Arch]) {
        assert_eq!(classify(name).arches, expected);
    }

    #[rstest]
    fn classify_finds_every_platform_family() {
        let tokens = classify("ripgrep-14.1.0-x86_64-unknown-linux-musl.tar.gz");
        assert_eq!(tokens.platforms, BTreeSet::from([Os::Linux]));
        assert_eq!(tokens.arches, [Arch::X86_64]);
    }

    #[rstest]
    #[case::qualified("fzf-darwin_arm64.tar.gz", PlatformVerdict::Qualified)]
    #[case::alias("tool-macos.zip", PlatformVerdict::Qualified)]
    #[case::unknown("tool.tar.gz", PlatformVerdict::Unknown)]
    #[case::native_format("Tool.dmg", PlatformVerdict::Unknown)]
    #[case::foreign("tool-linux-x64.tar.gz", PlatformVerdict::Foreign(BTreeSet::from([Os::Linux])))]
    #[case::foreign_format("tool-x64.exe", PlatformVerdict::Foreign(BTreeSet::from([Os::Windows])))]
    fn platform_rule(mac: PlatformProfile, #[case] name: &str, #[case] expected: PlatformVerdict) {
        let format = InstallFormat::from_extension(&anyinstall_common::get_extension(name));
        assert_eq!(platform_verdict(&classify(name), format, &mac), expected);
    }

    #[rstest]
    fn foreign_native_formats_outrank_host_tokens() {
        let linux = PlatformProfile::new(Os::Linux, Arch::X86_64);
        let name = "tool-linux-x86_64.exe";
        assert_eq!(
            platform_verdict(&classify(name), Some(InstallFormat::Exe), &linux),
            PlatformVerdict::Foreign(BTreeSet::from([Os::Windows]))
        );
    }

    #[rstest]
    #[case::exe("tool-x86_64-pc-windows-gnu.exe")]
    #[case::zip("tool-x86_64-pc-windows-gnu.zip")]
    fn windows_gnu_targets_are_not_linux_builds(#[case] name: &str) {
        let linux = PlatformProfile::new(Os::Linux, Arch::X86_64);
        let format = InstallFormat::from_extension(&anyinstall_common::get_extension(name));
        assert_eq!(
            platform_verdict(&classify(name), format, &linux),
            PlatformVerdict::Foreign(BTreeSet::from([Os::Windows]))
        );
    }

    #[rstest]
    fn every_foreign_alias_is_excluded_on_every_host() {
        for host_os in Os::ALL {
            let host = PlatformProfile::new(host_os, Arch::X86_64);
            for other in Os::ALL.into_iter().filter(|os| *os != host_os) {
                for alias in other.aliases() {
                    let name = format!("tool-{alias}-1.0.tar.gz");
                    let verdict = platform_verdict(&classify(&name), None, &host);
                    assert!(
                        matches!(verdict, PlatformVerdict::Foreign(_)),
                        "{name} on {host} gave {verdict:?}"
                    );
                }
            }
        }
    }

    #[rstest]
    #[case::matching("tool-aarch64", ArchVerdict::Matches(1))]
    #[case::silicon("tool-apple-silicon.dmg", ArchVerdict::Matches(1))]
    #[case::universal("tool-arm64-x86_64", ArchVerdict::Matches(1))]
    #[case::foreign("tool-amd64", ArchVerdict::Foreign(vec![Arch::X86_64]))]
    #[case::unknown("tool", ArchVerdict::Unknown)]
    fn architecture_rule(mac: PlatformProfile, #[case] name: &str, #[case] expected: ArchVerdict) {
        assert_eq!(arch_verdict(&classify(name), &mac), expected);
    }

    #[rstest]
    #[case::installable("tool.deb", "deb", ExtensionVerdict::Installable(InstallFormat::Deb))]
    #[case::bare("tool-linux", "", ExtensionVerdict::Installable(InstallFormat::Binary))]
    #[case::checksum("tool.tar.gz.sha256", "sha256", ExtensionVerdict::Companion)]
    #[case::unknown("tool.apk", "apk", ExtensionVerdict::Unknown)]
    fn extension_rule(#[case] name: &str, #[case] ext: &str, #[case] expected: ExtensionVerdict) {
        assert_eq!(extension_verdict(name, ext), expected);
    }
}
