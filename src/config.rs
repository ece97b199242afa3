//! Resolver configuration.
//!
//! Every heuristic magnitude lives here as data so it can be tuned from
//! `config.toml` without touching control flow. Omitted keys fall back to
//! their defaults; unknown keys are rejected so typos surface immediately.

use serde::Deserialize;
use thiserror::Error;

/// Settings for one resolution run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Candidate scoring magnitudes.
    pub weights: ScoringWeights,
    /// Limits for the install-script rejection rules.
    pub script: ScriptLimits,
    /// Number of runner-up candidates kept for diagnostics.
    pub max_alternatives: usize,
    /// Fetch release metadata and the README concurrently.
    pub concurrent_fetch: bool,
    /// Branches searched for a README, in order.
    pub readme_branches: Vec<String>,
    /// Accept every confirmation prompt.
    pub assume_yes: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            script: ScriptLimits::default(),
            max_alternatives: 3,
            concurrent_fetch: true,
            readme_branches: vec!["main".to_owned(), "master".to_owned()],
            assume_yes: false,
        }
    }
}

impl ResolverConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use anyinstall::config::ResolverConfig;
    ///
    /// let config = ResolverConfig::from_toml("[weights]\nprerelease_penalty = 500\n")?;
    /// assert_eq!(config.weights.prerelease_penalty, 500);
    /// assert_eq!(config.weights.asset_base, 60);
    /// # Ok::<(), anyinstall::config::ConfigError>(())
    /// ```
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}

/// Priority magnitudes applied by providers and filters.
///
/// The defaults keep one relation load-bearing: an asset whose name targets
/// the host platform and architecture in a preferred format outranks an
/// install script of medium keyword confidence.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringWeights {
    /// Starting priority of a release asset.
    pub asset_base: i64,
    /// Starting priority of a link scraped from a web page.
    pub scraped_base: i64,
    /// Flat boost for an extension the host OS prefers.
    pub preferred_extension: i64,
    /// Boost per name token matching the host architecture.
    pub arch_token: i64,
    /// Flat boost for a name explicitly targeting the host OS.
    pub platform_qualified: i64,
    /// Penalty for a prerelease when a stable alternative survives.
    pub prerelease_penalty: i64,
    /// Boost for the method a previous install used.
    pub method_hint: i64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            asset_base: 60,
            scraped_base: 40,
            preferred_extension: 20,
            arch_token: 10,
            platform_qualified: 30,
            prerelease_penalty: 1000,
            method_hint: 15,
        }
    }
}

/// Hard limits beyond which a code block is treated as documentation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptLimits {
    /// Maximum non-empty lines.
    pub max_lines: usize,
    /// Maximum characters on any line.
    pub max_line_length: usize,
    /// Maximum flag-like tokens across the block.
    pub max_flags: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_lines: 10,
            max_line_length: 200,
            max_flags: 8,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
