//! Detection of helper tools that some install formats depend on.
//!
//! A `.deb` is only useful where `dpkg` exists and a `.dmg` needs
//! `hdiutil`. The [`CapabilitySet`] records which of those helpers the host
//! offers so candidates needing a missing helper can be rejected before any
//! download happens.

use crate::extension::InstallFormat;
use log::debug;
use std::collections::BTreeSet;

/// Answers whether a named command can be run on this host.
#[cfg_attr(test, mockall::automock)]
pub trait CapabilityProbe {
    /// Returns `true` when `command` resolves to an executable.
    fn is_available(&self, command: &str) -> bool;
}

/// Probe that searches `PATH` using the `which` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhichProbe;

impl CapabilityProbe for WhichProbe {
    fn is_available(&self, command: &str) -> bool {
        which::which(command).is_ok()
    }
}

/// The set of helper commands found on the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    tools: BTreeSet<String>,
}

impl CapabilitySet {
    /// Probe every command that any [`InstallFormat`] requires.
    pub fn detect(probe: &dyn CapabilityProbe) -> Self {
        let wanted: BTreeSet<&str> = InstallFormat::ALL
            .iter()
            .flat_map(|format| format.required_commands().iter().copied())
            .collect();
        let tools = wanted
            .into_iter()
            .filter(|command| probe.is_available(command))
            .map(str::to_owned)
            .collect::<BTreeSet<_>>();
        debug!(target: "anyinstall::capability", "available helpers: {tools:?}");
        Self { tools }
    }

    /// Build a set from an explicit list of tool names.
    #[must_use]
    pub fn from_tools<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: tools.into_iter().map(Into::into).collect(),
        }
    }

    /// Reports whether `tool` was found.
    #[must_use]
    pub fn has(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    /// Reports whether `format` can be installed with the detected tools.
    #[must_use]
    pub fn supports(&self, format: InstallFormat) -> bool {
        let required = format.required_commands();
        required.is_empty() || required.iter().any(|tool| self.has(tool))
    }

    /// Iterates the detected tool names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(String::as_str)
    }
}
