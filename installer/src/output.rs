//! Text the CLI shows after resolving, installing, or listing.

use anyinstall::record::{InstallOutcome, InstallRecord, InstalledFiles};
use anyinstall::{Candidate, ResolutionContext};
use serde::Serialize;
use std::io::Write;

/// Writes one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort; nothing else can report it.
    }
}

fn describe(candidate: &Candidate) -> String {
    format!(
        "{} [{} via {}, priority {}]",
        candidate.name(),
        candidate.kind(),
        candidate.provider(),
        candidate.priority()
    )
}

/// Selection summary for `anyinstall resolve`.
///
/// # Examples
///
/// ```
/// use anyinstall::ResolutionContext;
/// use anyinstall_common::{Arch, CapabilitySet, Os, PlatformProfile};
/// use anyinstall_installer::output::format_selection;
///
/// let ctx = ResolutionContext::new(
///     "owner/tool",
///     PlatformProfile::new(Os::Linux, Arch::X86_64),
///     CapabilitySet::default(),
/// );
/// assert!(format_selection(&ctx).contains("Nothing selected"));
/// ```
#[must_use]
pub fn format_selection(ctx: &ResolutionContext) -> String {
    let Some(selected) = ctx.selected.as_ref() else {
        return format!("Nothing selected for {}.", ctx.input());
    };
    let mut output = format!("Selected: {}\n  from {}\n", describe(selected), selected.origin());
    if let Some(code) = selected.code() {
        output.push_str("  script:\n");
        for line in code.lines() {
            output.push_str(&format!("    {line}\n"));
        }
    }
    if !ctx.alternatives.is_empty() {
        output.push_str("Alternatives:\n");
        for alternative in &ctx.alternatives {
            output.push_str(&format!("  - {}\n", describe(alternative)));
        }
    }
    output
}

/// Message shown after a successful install.
#[must_use]
pub fn success_message(candidate: &str, outcome: &InstallOutcome) -> String {
    match &outcome.files {
        InstalledFiles::SystemInstall => {
            format!("Installed {candidate} ({}) through the system installer", outcome.method)
        }
        InstalledFiles::Paths(paths) => {
            let mut message = format!("Installed {candidate} ({}):", outcome.method);
            for path in paths {
                message.push_str(&format!("\n  {}", path.display()));
            }
            message
        }
    }
}

/// Human-readable listing of install records.
///
/// # Examples
///
/// ```
/// use anyinstall_installer::output::format_human;
///
/// assert!(format_human(&[]).contains("Nothing installed"));
/// ```
#[must_use]
pub fn format_human(records: &[InstallRecord]) -> String {
    if records.is_empty() {
        return String::from("Nothing installed yet.\n\nRun `anyinstall <source>` to install something.");
    }
    let mut output = String::from("Installed:\n");
    for record in records {
        let version = record.version.as_deref().unwrap_or("unversioned");
        output.push_str(&format!(
            "\n{} ({version})\n  {} via {}\n",
            record.source, record.candidate, record.method
        ));
        match &record.files {
            InstalledFiles::SystemInstall => output.push_str("  managed by the system installer\n"),
            InstalledFiles::Paths(paths) => {
                for path in paths {
                    output.push_str(&format!("  - {}\n", path.display()));
                }
            }
        }
    }
    output
}

/// JSON listing of install records.
#[must_use]
pub fn format_json(records: &[InstallRecord]) -> String {
    #[derive(Serialize)]
    struct Listing<'a> {
        installs: &'a [InstallRecord],
    }

    serde_json::to_string_pretty(&Listing { installs: records })
        .unwrap_or_else(|_| "{}".to_owned())
}
