//! Unit tests for phase ordering, predicates, and cleanup guarantees.

use super::*;
use crate::pipeline::{RegistryBuilder, Unit, UnitSpec};
use anyinstall_common::{Arch, CapabilitySet, Os, PlatformProfile};
use rstest::{fixture, rstest};
use std::cell::RefCell;
use std::rc::Rc;

type Journal = Rc<RefCell<Vec<String>>>;

struct Recording {
    id: &'static str,
    journal: Journal,
    runs: bool,
    fails: bool,
    cleanup_fails: bool,
    on_execute: Option<Box<dyn Fn()>>,
}

impl Recording {
    fn new(id: &'static str, journal: &Journal) -> Self {
        Self {
            id,
            journal: Rc::clone(journal),
            runs: true,
            fails: false,
            cleanup_fails: false,
            on_execute: None,
        }
    }

    const fn skipped(mut self) -> Self {
        self.runs = false;
        self
    }

    const fn failing(mut self) -> Self {
        self.fails = true;
        self
    }

    const fn failing_cleanup(mut self) -> Self {
        self.cleanup_fails = true;
        self
    }

    fn then(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_execute = Some(Box::new(hook));
        self
    }
}

impl Unit for Recording {
    fn id(&self) -> &'static str {
        self.id
    }

    fn should_run(&self, _ctx: &ResolutionContext) -> bool {
        self.runs
    }

    fn execute(&mut self, _ctx: &mut ResolutionContext) -> Result<()> {
        self.journal.borrow_mut().push(format!("run {}", self.id));
        if let Some(hook) = &self.on_execute {
            hook();
        }
        if self.fails {
            return Err(ResolveError::InstallFailed {
                method: "test".to_owned(),
                reason: self.id.to_owned(),
            });
        }
        Ok(())
    }

    fn cleanup(&mut self, _ctx: &mut ResolutionContext) -> Result<()> {
        self.journal.borrow_mut().push(format!("clean {}", self.id));
        if self.cleanup_fails {
            return Err(ResolveError::Io(std::io::Error::other("read-only")));
        }
        Ok(())
    }
}

#[fixture]
fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

#[fixture]
fn context() -> ResolutionContext {
    ResolutionContext::new(
        "owner/repo",
        PlatformProfile::new(Os::Linux, Arch::X86_64),
        CapabilitySet::default(),
    )
}

fn pipeline(units: Vec<(Recording, UnitSpec)>) -> Pipeline {
    let mut builder = RegistryBuilder::new();
    for (unit, spec) in units {
        builder.register(unit, spec);
    }
    Pipeline::new(builder.build().expect("valid registry"))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

#[rstest]
fn runs_phases_in_order_and_priority_within(journal: Journal, mut context: ResolutionContext) {
    let mut pipeline = pipeline(vec![
        (Recording::new("install", &journal), UnitSpec::new(Phase::Install, 0)),
        (Recording::new("detect-low", &journal), UnitSpec::new(Phase::Detect, 1)),
        (Recording::new("detect-high", &journal), UnitSpec::new(Phase::Detect, 9)),
        (Recording::new("source", &journal), UnitSpec::new(Phase::Source, 0)),
    ]);

    let report = pipeline.run(&mut context);

    assert!(report.is_success());
    assert_eq!(
        report.executed,
        ["detect-high", "detect-low", "source", "install"]
    );
    assert_eq!(
        entries(&journal),
        [
            "run detect-high",
            "run detect-low",
            "run source",
            "run install",
            "clean install",
            "clean detect-low",
            "clean detect-high",
            "clean source",
        ]
    );
}

#[rstest]
fn skipped_units_are_not_cleaned(journal: Journal, mut context: ResolutionContext) {
    let mut pipeline = pipeline(vec![
        (Recording::new("a", &journal).skipped(), UnitSpec::new(Phase::Detect, 0)),
        (Recording::new("b", &journal), UnitSpec::new(Phase::Detect, 0)),
    ]);

    let report = pipeline.run(&mut context);

    assert_eq!(report.executed, ["b"]);
    assert_eq!(entries(&journal), ["run b", "clean b"]);
}

#[rstest]
fn failure_aborts_but_cleans_every_executed_unit(
    journal: Journal,
    mut context: ResolutionContext,
) {
    let mut pipeline = pipeline(vec![
        (Recording::new("tempdir", &journal), UnitSpec::new(Phase::Download, 0)),
        (Recording::new("install", &journal).failing(), UnitSpec::new(Phase::Install, 0)),
        (Recording::new("record", &journal), UnitSpec::new(Phase::Install, -10)),
    ]);

    let report = pipeline.run(&mut context);

    assert!(matches!(report.outcome, Err(ResolveError::InstallFailed { .. })));
    assert_eq!(
        entries(&journal),
        ["run tempdir", "run install", "clean tempdir", "clean install"]
    );
}

#[rstest]
fn cleanup_failures_never_mask_the_original_error(
    journal: Journal,
    mut context: ResolutionContext,
) {
    let mut pipeline = pipeline(vec![
        (Recording::new("mount", &journal).failing_cleanup(), UnitSpec::new(Phase::Download, 0)),
        (Recording::new("install", &journal).failing(), UnitSpec::new(Phase::Install, 0)),
    ]);

    let report = pipeline.run(&mut context);

    assert_eq!(report.cleanup_warnings.len(), 1);
    assert!(report.cleanup_warnings.iter().all(|w| w.unit == "mount"));
    assert!(matches!(report.outcome, Err(ResolveError::InstallFailed { .. })));
}

#[rstest]
fn cancellation_stops_before_the_next_unit(journal: Journal, mut context: ResolutionContext) {
    let flag = Arc::new(AtomicBool::new(false));
    let trigger = Arc::clone(&flag);
    let mut builder = RegistryBuilder::new();
    builder.register(
        Recording::new("download", &journal).then(move || trigger.store(true, Ordering::SeqCst)),
        UnitSpec::new(Phase::Download, 0),
    );
    builder.register(Recording::new("install", &journal), UnitSpec::new(Phase::Install, 0));
    let mut pipeline =
        Pipeline::new(builder.build().expect("valid registry")).with_cancellation(flag);

    let report = pipeline.run(&mut context);

    assert!(matches!(report.outcome, Err(ResolveError::Cancelled)));
    assert_eq!(entries(&journal), ["run download", "clean download"]);
}

#[rstest]
fn run_until_stops_after_the_named_phase(journal: Journal, mut context: ResolutionContext) {
    let mut pipeline = pipeline(vec![
        (Recording::new("select", &journal), UnitSpec::new(Phase::Select, 0)),
        (Recording::new("download", &journal), UnitSpec::new(Phase::Download, 0)),
    ]);

    let report = pipeline.run_until(&mut context, Phase::Select);

    assert_eq!(report.executed, ["select"]);
    let warnings = report.into_result().expect("dry run succeeds");
    assert!(warnings.is_empty());
}
