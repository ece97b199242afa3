//! Compilation of the crate's built-in regular expressions.

use regex::Regex;

/// Compiles `pattern`, a string literal from this crate.
///
/// # Panics
///
/// Panics when `pattern` is not a valid regex. Every caller passes a literal
/// that its module's tests force, so a typo fails the test suite rather than
/// silently disabling a rule.
#[expect(
    clippy::expect_used,
    reason = "built-in patterns are literals compiled by each module's tests"
)]
pub(crate) fn literal(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is a valid regex")
}
