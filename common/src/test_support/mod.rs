//! Shared test helpers for anyinstall crates.

use crate::capability::CapabilityProbe;
use std::collections::BTreeSet;

/// Probe answering from a fixed list of available commands.
///
/// # Examples
///
/// ```
/// use anyinstall_common::CapabilityProbe;
/// use anyinstall_common::test_support::StubProbe;
///
/// let probe = StubProbe::with(["dpkg"]);
/// assert!(probe.is_available("dpkg"));
/// assert!(!probe.is_available("rpm"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StubProbe {
    available: BTreeSet<String>,
}

impl StubProbe {
    /// Creates a probe that reports only `commands` as available.
    pub fn with<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            available: commands.into_iter().map(Into::into).collect(),
        }
    }
}

impl CapabilityProbe for StubProbe {
    fn is_available(&self, command: &str) -> bool {
        self.available.contains(command)
    }
}
