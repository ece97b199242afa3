//! Choosing the single candidate to install.
//!
//! Survivors are ranked by priority, then by whether the name explicitly
//! targets the host platform, then by discovery order. Runners-up are kept
//! for diagnostics only and are never substituted for the winner.

use crate::candidate::Candidate;
use crate::context::ResolutionContext;
use crate::error::{IncompatibilityCause, ResolveError, Result};
use crate::pipeline::Unit;
use log::info;
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// The chosen candidate and its closest rivals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The winner.
    pub chosen: Candidate,
    /// Up to the configured number of runners-up, best first.
    pub alternatives: Vec<Candidate>,
}

/// Ranks `candidates` and picks the best survivor.
///
/// # Errors
///
/// Returns [`ResolveError::NoCompatibleAsset`] naming the most frequent
/// exclusion cause when nothing survives.
pub fn select(candidates: &[Candidate], max_alternatives: usize) -> Result<Selection> {
    let mut survivors: Vec<(usize, &Candidate)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_excluded())
        .collect();
    survivors.sort_by_key(|(index, c)| {
        (
            Reverse(c.priority()),
            Reverse(c.is_platform_qualified()),
            *index,
        )
    });

    let mut ranked = survivors.into_iter().map(|(_, c)| c.clone());
    let Some(chosen) = ranked.next() else {
        return Err(ResolveError::NoCompatibleAsset {
            cause: dominant_cause(candidates),
            considered: candidates.len(),
        });
    };
    Ok(Selection {
        chosen,
        alternatives: ranked.take(max_alternatives).collect(),
    })
}

/// Most frequent exclusion cause; ties go to the cause declared first.
#[must_use]
pub fn dominant_cause(candidates: &[Candidate]) -> Option<IncompatibilityCause> {
    let mut counts: BTreeMap<IncompatibilityCause, usize> = BTreeMap::new();
    for rejection in candidates.iter().filter_map(Candidate::rejection) {
        *counts.entry(rejection.cause).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(cause, count)| (*count, Reverse(*cause)))
        .map(|(cause, _)| cause)
}

/// Select-phase unit wrapping [`select`].
///
/// Reads `candidates`; writes `selected` and `alternatives`.
#[derive(Debug)]
pub struct Selector {
    max_alternatives: usize,
}

impl Selector {
    /// Identifier of this unit.
    pub const ID: &'static str = "selector";

    /// Creates the unit, keeping `max_alternatives` runners-up.
    #[must_use]
    pub const fn new(max_alternatives: usize) -> Self {
        Self { max_alternatives }
    }
}

impl Unit for Selector {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        ctx.selected.is_none()
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let selection = select(&ctx.candidates, self.max_alternatives)?;
        info!(
            target: "anyinstall::select",
            "selected {} (priority {}, from {})",
            selection.chosen.name(),
            selection.chosen.priority(),
            selection.chosen.provider()
        );
        for alternative in &selection.alternatives {
            info!(
                target: "anyinstall::select",
                "alternative {} (priority {})",
                alternative.name(),
                alternative.priority()
            );
        }
        ctx.selected = Some(selection.chosen);
        ctx.alternatives = selection.alternatives;
        Ok(())
    }
}
