//! Install-script heuristic detector.
//!
//! Mines release notes, READMEs, and scraped pages for short shell snippets
//! that install the project, while rejecting documentation that merely looks
//! like code. The stages are independent and individually testable:
//!
//! 1. [`extract`] pulls code blocks out of markdown.
//! 2. [`rules`] rejects blocks shaped like documentation.
//! 3. [`score`] weighs install keywords in the surviving text.
//! 4. [`platform`] drops snippets meant for another OS and adjusts the rest.

pub mod extract;
pub mod platform;
pub mod rules;
pub mod score;

use crate::candidate::ScriptDocument;
use crate::config::ScriptLimits;
use crate::context::SourceDocument;
use anyinstall_common::Os;
use log::trace;
use platform::PlatformFit;
use std::collections::HashMap;

/// A snippet that passed every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSnippet {
    /// The code text.
    pub code: String,
    /// Where it was found.
    pub document: ScriptDocument,
    /// Keyword score.
    pub score: i64,
    /// Platform verdict for the host.
    pub fit: PlatformFit,
}

impl ScriptSnippet {
    /// Keyword score plus the platform adjustment.
    #[must_use]
    pub fn adjusted_score(&self) -> i64 {
        self.score.saturating_add(self.fit.adjustment())
    }
}

/// Blocks to evaluate in `text`.
///
/// A document without code blocks that is itself short counts as one block,
/// since release bodies are often a bare command.
fn blocks_of(text: &str, limits: &ScriptLimits) -> Vec<String> {
    let blocks = extract::extract_code_blocks(text);
    if !blocks.is_empty() {
        return blocks;
    }
    let trimmed = text.trim();
    let lines = trimmed.lines().filter(|l| !l.trim().is_empty()).count();
    if lines > 0 && lines <= limits.max_lines {
        vec![trimmed.to_owned()]
    } else {
        Vec::new()
    }
}

/// Evaluates one block against the host.
///
/// Returns `None` when a rejection rule fires, no keyword occurs, or the
/// snippet contains a command family incompatible with `host`.
#[must_use]
pub fn evaluate(
    code: &str,
    document: ScriptDocument,
    host: Os,
    limits: &ScriptLimits,
) -> Option<ScriptSnippet> {
    if let Err(rejection) = rules::check(code, limits) {
        trace!(target: "anyinstall::script", "rejected block: {rejection}");
        return None;
    }
    let score = score::keyword_score(code)?;
    let fit = platform::assess(code, host);
    if !fit.is_compatible() {
        trace!(
            target: "anyinstall::script",
            "dropping snippet for another platform: {:?}",
            fit.incompatible
        );
        return None;
    }
    Some(ScriptSnippet {
        code: code.to_owned(),
        document,
        score,
        fit,
    })
}

fn normalize_whitespace(code: &str) -> String {
    code.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Finds install scripts in `documents` runnable on `host`.
///
/// Duplicates (equal after whitespace normalization) keep their best
/// occurrence. Results are ordered by adjusted score, best first, and capped
/// to the top half of the survivors, rounded up.
#[must_use]
pub fn detect_install_scripts(
    documents: &[SourceDocument],
    host: Os,
    limits: &ScriptLimits,
) -> Vec<ScriptSnippet> {
    let mut best: Vec<ScriptSnippet> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for document in documents {
        for block in blocks_of(&document.text, limits) {
            let Some(snippet) = evaluate(&block, document.kind, host, limits) else {
                continue;
            };
            let key = normalize_whitespace(&snippet.code);
            match seen.get(&key).and_then(|index| best.get_mut(*index)) {
                Some(existing) if existing.adjusted_score() >= snippet.adjusted_score() => {}
                Some(existing) => *existing = snippet,
                None => {
                    seen.insert(key, best.len());
                    best.push(snippet);
                }
            }
        }
    }

    best.sort_by_key(|snippet| std::cmp::Reverse(snippet.adjusted_score()));
    let keep = best.len().div_ceil(2);
    best.truncate(keep);
    best
}

/// Reports whether `text` reads as an install script on any platform.
///
/// # Examples
///
/// ```
/// use anyinstall::script::is_install_script;
///
/// assert!(is_install_script("brew install fzf"));
/// assert!(!is_install_script("export PATH=$PATH:/usr/local/bin"));
/// ```
#[must_use]
pub fn is_install_script(text: &str) -> bool {
    let limits = ScriptLimits::default();
    blocks_of(text, &limits)
        .iter()
        .any(|block| rules::check(block, &limits).is_ok() && score::keyword_score(block).is_some_and(|s| s > 0))
}
