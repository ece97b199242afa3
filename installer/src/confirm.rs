//! Confirmation prompts for steps that run code or need elevation.

use dialoguer::Confirm;
use log::warn;
use std::rc::Rc;

/// Asks the user to approve a step.
#[cfg_attr(test, mockall::automock)]
pub trait Confirmer {
    /// Returns `true` when the user approves `prompt`.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Interactive terminal prompt defaulting to "no".
#[derive(Debug, Clone, Copy, Default)]
pub struct DialoguerConfirmer;

impl Confirmer for DialoguerConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        match Confirm::new().with_prompt(prompt).default(false).interact() {
            Ok(answer) => answer,
            Err(err) => {
                warn!(target: "anyinstall::confirm", "prompt failed, treating as declined: {err}");
                false
            }
        }
    }
}

/// Approves everything; selected by `--yes` or `assume_yes = true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// The confirmer matching the user's `--yes` choice.
#[must_use]
pub fn confirmer_for(assume_yes: bool) -> Rc<dyn Confirmer> {
    if assume_yes {
        Rc::new(AssumeYes)
    } else {
        Rc::new(DialoguerConfirmer)
    }
}
