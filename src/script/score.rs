//! Weighted keyword scoring of code blocks that survived rejection.
//!
//! Scoring is a pure function over the block text. Every pattern in a tier
//! contributes the tier weight once per occurrence.

use crate::pattern::literal;
use regex::Regex;
use std::sync::LazyLock;

/// Weight and patterns of one keyword tier.
#[derive(Debug, Clone, Copy)]
pub struct Tier {
    /// Tier name for diagnostics.
    pub name: &'static str,
    /// Score added per occurrence.
    pub weight: i64,
    /// Regular expressions matched against the block.
    pub patterns: &'static [&'static str],
}

/// The keyword tiers, strongest first.
pub const TIERS: &[Tier] = &[
    Tier {
        name: "high",
        weight: 30,
        patterns: &[
            r"\|\s*(?:sudo\s+)?(?:ba|z|da|k)?sh\b",
            r"\bcurl\b",
            r"\bwget\b",
            r"\|\s*iex\b",
            r"(?i)\b(?:iwr|invoke-webrequest|irm|invoke-restmethod)\b",
        ],
    },
    Tier {
        name: "medium",
        weight: 15,
        patterns: &[r"\binstall\b", r"\bsetup\b", r"\binstaller\b"],
    },
    Tier {
        name: "low",
        weight: 10,
        patterns: &[
            r"\bbrew\b",
            r"\bport\b",
            r"\bapt(?:-get)?\b",
            r"\bdnf\b",
            r"\byum\b",
            r"\bpacman\b",
            r"\bzypper\b",
            r"\bapk\b",
            r"\bsnap\b",
            r"\bflatpak\b",
            r"\bnix-env\b",
            r"\bchoco\b",
            r"\bscoop\b",
            r"\bwinget\b",
            r"\bcargo\b",
            r"\bnpm\b",
            r"\bpipx?\b",
            r"\bgem\b",
            r"\bgo\b",
        ],
    },
];

/// Bonus for a block of at most two non-empty lines.
pub const TWO_LINE_BONUS: i64 = 20;
/// Bonus for a block of exactly three non-empty lines.
pub const THREE_LINE_BONUS: i64 = 10;
/// Penalty when documentation punctuation remains.
pub const DOC_PUNCTUATION_PENALTY: i64 = 25;

const DOC_PUNCTUATION: &str = r"(?m)(?:[.:!?]\s*$|\be\.g\.|\bi\.e\.|\betc\.)";

static COMPILED_TIERS: LazyLock<Vec<(i64, Regex)>> = LazyLock::new(|| {
    TIERS
        .iter()
        .flat_map(|tier| {
            tier.patterns
                .iter()
                .map(move |pattern| (tier.weight, literal(pattern)))
        })
        .collect()
});

static DOC_PUNCTUATION_RE: LazyLock<Regex> = LazyLock::new(|| literal(DOC_PUNCTUATION));

/// Keyword score of `code`, or `None` when no keyword occurs at all.
///
/// The score floors at zero.
///
/// # Examples
///
/// ```
/// use anyinstall::script::score::keyword_score;
///
/// assert_eq!(keyword_score("brew install tool"), Some(45));
/// assert_eq!(keyword_score("make"), None);
/// ```
#[must_use]
pub fn keyword_score(code: &str) -> Option<i64> {
    let mut hits = 0_i64;
    let mut score = 0_i64;
    for (weight, pattern) in COMPILED_TIERS.iter() {
        let occurrences = i64::try_from(pattern.find_iter(code).count()).unwrap_or(i64::MAX);
        hits = hits.saturating_add(occurrences);
        score = score.saturating_add(weight.saturating_mul(occurrences));
    }
    if hits == 0 {
        return None;
    }
    let lines = code.lines().filter(|line| !line.trim().is_empty()).count();
    score += match lines {
        0..=2 => TWO_LINE_BONUS,
        3 => THREE_LINE_BONUS,
        _ => 0,
    };
    if DOC_PUNCTUATION_RE.is_match(code) {
        score -= DOC_PUNCTUATION_PENALTY;
    }
    Some(score.max(0))
}
