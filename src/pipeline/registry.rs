//! Unit registration and eager validation.

use super::unit::{Phase, Unit, UnitSpec};
use crate::error::RegistryError;
use log::trace;
use std::collections::BTreeSet;

/// Opaque handle returned by [`RegistryBuilder::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitHandle(usize);

pub(super) struct Entry {
    pub(super) unit: Box<dyn Unit>,
    pub(super) spec: UnitSpec,
    pub(super) registration: usize,
    pub(super) ran: bool,
}

/// Collects units before validation.
///
/// # Examples
///
/// ```
/// use anyinstall::context::ResolutionContext;
/// use anyinstall::error::Result;
/// use anyinstall::pipeline::{Phase, RegistryBuilder, Unit, UnitSpec};
///
/// struct Noop;
///
/// impl Unit for Noop {
///     fn id(&self) -> &'static str {
///         "noop"
///     }
///
///     fn execute(&mut self, _ctx: &mut ResolutionContext) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let mut builder = RegistryBuilder::new();
/// builder.register(Noop, UnitSpec::new(Phase::Detect, 0).depends_on("missing"));
/// assert!(builder.build().is_err());
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<Entry>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `unit` with its facets.
    pub fn register<U: Unit + 'static>(&mut self, unit: U, spec: UnitSpec) -> UnitHandle {
        self.register_boxed(Box::new(unit), spec)
    }

    /// Registers an already boxed unit.
    pub fn register_boxed(&mut self, unit: Box<dyn Unit>, spec: UnitSpec) -> UnitHandle {
        let handle = UnitHandle(self.entries.len());
        trace!(
            target: "anyinstall::pipeline",
            "registered {} in {} at priority {}",
            unit.id(),
            spec.phase,
            spec.priority
        );
        self.entries.push(Entry {
            unit,
            spec,
            registration: handle.0,
            ran: false,
        });
        handle
    }

    /// Validates identifiers and dependencies, then fixes execution order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateUnit`] when two units share an
    /// identifier and [`RegistryError::MissingDependency`] when a declared
    /// dependency is not registered.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut ids = BTreeSet::new();
        for entry in &self.entries {
            let id = entry.unit.id();
            if !ids.insert(id) {
                return Err(RegistryError::DuplicateUnit { id });
            }
        }
        for entry in &self.entries {
            if let Some(missing) = entry
                .spec
                .dependencies
                .iter()
                .find(|dependency| !ids.contains(*dependency))
            {
                return Err(RegistryError::MissingDependency {
                    unit: entry.unit.id(),
                    dependency: *missing,
                });
            }
        }

        let mut entries = self.entries;
        entries.sort_by_key(|entry| {
            (
                entry.spec.phase,
                std::cmp::Reverse(entry.spec.priority),
                entry.registration,
            )
        });
        Ok(Registry { entries })
    }
}

/// A validated set of units in execution order.
pub struct Registry {
    pub(super) entries: Vec<Entry>,
}

impl Registry {
    /// Number of registered units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no unit is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers in execution order.
    pub fn execution_order(&self) -> impl Iterator<Item = (Phase, &'static str)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.spec.phase, entry.unit.id()))
    }

    /// Facets of the unit behind `handle`.
    #[must_use]
    pub fn spec(&self, handle: UnitHandle) -> Option<&UnitSpec> {
        self.entries
            .iter()
            .find(|entry| entry.registration == handle.0)
            .map(|entry| &entry.spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ResolutionContext;
    use crate::error::Result;
    use rstest::rstest;

    struct Named(&'static str);

    impl Unit for Named {
        fn id(&self) -> &'static str {
            self.0
        }

        fn execute(&mut self, _ctx: &mut ResolutionContext) -> Result<()> {
            Ok(())
        }
    }

    #[rstest]
    fn orders_by_phase_then_priority_then_registration() {
        let mut builder = RegistryBuilder::new();
        builder.register(Named("select"), UnitSpec::new(Phase::Select, 100));
        builder.register(Named("low"), UnitSpec::new(Phase::Detect, 10));
        builder.register(Named("high"), UnitSpec::new(Phase::Detect, 90));
        builder.register(Named("tie"), UnitSpec::new(Phase::Detect, 10));

        let registry = builder.build().expect("valid registry");
        let order: Vec<_> = registry.execution_order().map(|(_, id)| id).collect();

        assert_eq!(order, ["high", "low", "tie", "select"]);
    }

    #[rstest]
    fn rejects_duplicate_identifiers() {
        let mut builder = RegistryBuilder::new();
        builder.register(Named("twice"), UnitSpec::new(Phase::Detect, 1));
        builder.register(Named("twice"), UnitSpec::new(Phase::Source, 1));

        assert!(matches!(
            builder.build(),
            Err(RegistryError::DuplicateUnit { id: "twice" })
        ));
    }

    #[rstest]
    fn rejects_missing_dependencies() {
        let mut builder = RegistryBuilder::new();
        builder.register(
            Named("scripts"),
            UnitSpec::new(Phase::Source, 50).depends_on("releases"),
        );

        assert!(matches!(
            builder.build(),
            Err(RegistryError::MissingDependency {
                unit: "scripts",
                dependency: "releases"
            })
        ));
    }

    #[rstest]
    fn handles_resolve_their_spec() {
        let mut builder = RegistryBuilder::new();
        builder.register(Named("a"), UnitSpec::new(Phase::Install, 5));
        let handle = builder.register(Named("b"), UnitSpec::new(Phase::Detect, 7));

        let registry = builder.build().expect("valid registry");

        let spec = registry.spec(handle).expect("handle resolves");
        assert_eq!(spec.phase(), Phase::Detect);
        assert_eq!(spec.priority(), 7);
        assert_eq!(registry.len(), 2);
    }
}
