//! Phase-ordered execution with guaranteed cleanup.

use super::registry::{Entry, Registry};
use super::unit::Phase;
use crate::context::ResolutionContext;
use crate::error::{ResolveError, Result};
use log::{debug, trace, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cleanup step that failed after the run ended.
#[derive(Debug)]
pub struct CleanupWarning {
    /// Unit whose cleanup failed.
    pub unit: &'static str,
    /// The cleanup error.
    pub error: ResolveError,
}

/// What a run did and how it ended.
#[derive(Debug)]
pub struct RunReport {
    /// Units that executed, in execution order.
    pub executed: Vec<&'static str>,
    /// Cleanup failures; these never replace `outcome`.
    pub cleanup_warnings: Vec<CleanupWarning>,
    /// The run's own result.
    pub outcome: Result<()>,
}

impl RunReport {
    /// Reports whether the run succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Converts the report into its outcome, keeping cleanup warnings.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the run.
    pub fn into_result(self) -> Result<Vec<CleanupWarning>> {
        self.outcome.map(|()| self.cleanup_warnings)
    }
}

/// Runs a [`Registry`] against a context.
pub struct Pipeline {
    registry: Registry,
    cancel: Option<Arc<AtomicBool>>,
}

impl Pipeline {
    /// Wraps a validated registry.
    #[must_use]
    pub const fn new(registry: Registry) -> Self {
        Self {
            registry,
            cancel: None,
        }
    }

    /// Checks `flag` before every unit and aborts with
    /// [`ResolveError::Cancelled`] once it is set.
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Runs every phase.
    pub fn run(&mut self, ctx: &mut ResolutionContext) -> RunReport {
        self.run_until(ctx, Phase::Install)
    }

    /// Runs phases up to and including `last`.
    ///
    /// Cleanup runs for every unit that executed, in registration order,
    /// whether the run succeeded, failed, or was cancelled.
    pub fn run_until(&mut self, ctx: &mut ResolutionContext, last: Phase) -> RunReport {
        for entry in &mut self.registry.entries {
            entry.ran = false;
        }
        let mut executed = Vec::new();
        let outcome = execute_phases(
            &mut self.registry.entries,
            self.cancel.as_deref(),
            ctx,
            last,
            &mut executed,
        );
        if let Err(err) = &outcome {
            debug!(target: "anyinstall::pipeline", "run aborted: {err}");
        }
        let cleanup_warnings = cleanup_executed(&mut self.registry.entries, ctx);
        RunReport {
            executed,
            cleanup_warnings,
            outcome,
        }
    }
}

fn execute_phases(
    entries: &mut [Entry],
    cancel: Option<&AtomicBool>,
    ctx: &mut ResolutionContext,
    last: Phase,
    executed: &mut Vec<&'static str>,
) -> Result<()> {
    let mut current = None;
    for entry in entries.iter_mut().filter(|e| e.spec.phase <= last) {
        if current != Some(entry.spec.phase) {
            current = Some(entry.spec.phase);
            debug!(target: "anyinstall::pipeline", "phase {}", entry.spec.phase);
        }
        if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            return Err(ResolveError::Cancelled);
        }
        let id = entry.unit.id();
        if !entry.unit.should_run(ctx) {
            trace!(target: "anyinstall::pipeline", "skipping {id}");
            continue;
        }
        debug!(target: "anyinstall::pipeline", "running {id}");
        entry.ran = true;
        executed.push(id);
        entry.unit.execute(ctx)?;
    }
    Ok(())
}

fn cleanup_executed(entries: &mut [Entry], ctx: &mut ResolutionContext) -> Vec<CleanupWarning> {
    let mut ran: Vec<&mut Entry> = entries.iter_mut().filter(|e| e.ran).collect();
    ran.sort_by_key(|entry| entry.registration);

    let mut warnings = Vec::new();
    for entry in ran {
        let unit = entry.unit.id();
        if let Err(error) = entry.unit.cleanup(ctx) {
            warn!(target: "anyinstall::pipeline", "cleanup of {unit} failed: {error}");
            warnings.push(CleanupWarning { unit, error });
        }
    }
    warnings
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
