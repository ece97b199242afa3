//! Staged execution of resolution units.
//!
//! Units are registered with a [`Phase`], a priority, and the identifiers of
//! units they depend on. The [`Pipeline`] runs phases in the fixed order of
//! [`Phase::ORDER`], and within a phase runs every unit whose predicate holds
//! in descending priority. Cleanup runs for every unit that executed, in
//! registration order, however the run ends.

mod registry;
mod runner;
mod unit;

pub use registry::{Registry, RegistryBuilder, UnitHandle};
pub use runner::{CleanupWarning, Pipeline, RunReport};
pub use unit::{Phase, Unit, UnitSpec};
