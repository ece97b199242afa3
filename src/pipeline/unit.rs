//! The unit contract and its static registration facets.

use crate::context::ResolutionContext;
use crate::error::Result;
use std::fmt;

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Classify the raw input.
    Detect,
    /// Discover candidates.
    Source,
    /// Exclude and score candidates.
    Filter,
    /// Choose one candidate.
    Select,
    /// Fetch the chosen artefact.
    Download,
    /// Put it on disk.
    Install,
}

impl Phase {
    /// Every phase in the order the pipeline runs them.
    pub const ORDER: [Self; 6] = [
        Self::Detect,
        Self::Source,
        Self::Filter,
        Self::Select,
        Self::Download,
        Self::Install,
    ];

    /// Lowercase phase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Source => "source",
            Self::Filter => "filter",
            Self::Select => "select",
            Self::Download => "download",
            Self::Install => "install",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step of the resolution pipeline.
pub trait Unit {
    /// Identifier other units may name as a dependency.
    fn id(&self) -> &'static str;

    /// Pure predicate deciding whether the unit runs against `ctx`.
    fn should_run(&self, _ctx: &ResolutionContext) -> bool {
        true
    }

    /// Performs the unit's effect.
    ///
    /// # Errors
    ///
    /// Any error aborts the run.
    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()>;

    /// Releases resources acquired by [`Unit::execute`].
    ///
    /// # Errors
    ///
    /// Failures are reported as cleanup warnings and never replace the
    /// error that ended the run.
    fn cleanup(&mut self, _ctx: &mut ResolutionContext) -> Result<()> {
        Ok(())
    }
}

/// Registration facets of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub(crate) phase: Phase,
    pub(crate) priority: i32,
    pub(crate) dependencies: Vec<&'static str>,
}

impl UnitSpec {
    /// A unit in `phase` running at `priority` (higher runs first).
    #[must_use]
    pub const fn new(phase: Phase, priority: i32) -> Self {
        Self {
            phase,
            priority,
            dependencies: Vec::new(),
        }
    }

    /// Declares that `id` must also be registered.
    #[must_use]
    pub fn depends_on(mut self, id: &'static str) -> Self {
        self.dependencies.push(id);
        self
    }

    /// The unit's phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The unit's priority within its phase.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Identifiers this unit requires.
    #[must_use]
    pub fn dependencies(&self) -> &[&'static str] {
        &self.dependencies
    }
}
