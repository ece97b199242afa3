//! Compatibility filters and scoring boosts.
//!
//! Each filter is an independent filter-phase unit over the viable asset
//! candidates. Exclusions record their cause on the candidate; boosts adjust
//! priority. Script candidates are judged by the script detector instead.
//!
//! | Unit | Priority | Effect |
//! |------|----------|--------|
//! | [`PlatformFilter`] | 100 | excludes foreign OS names, marks host-qualified names |
//! | [`ArchitectureFilter`] | 90 | excludes foreign architectures |
//! | [`ExtensionFilter`] | 80 | excludes companion and unknown files |
//! | [`CapabilityFilter`] | 70 | excludes formats lacking a local helper |
//! | [`PreferenceBoost`] | 60 | preferred extension, architecture, and platform boosts |
//! | [`PrereleaseFilter`] | 50 | demotes prereleases when a stable asset survives |
//! | [`MethodHintBoost`] | 40 | favours the method a previous install used |

pub mod scoring;

use crate::config::ScoringWeights;
use crate::context::ResolutionContext;
use crate::error::{IncompatibilityCause, Result};
use crate::pipeline::{Phase, RegistryBuilder, Unit, UnitSpec};
use crate::record::InstallMethod;
use log::trace;
use scoring::{
    ArchVerdict, ExtensionVerdict, PlatformVerdict, arch_verdict, capability_verdict, classify,
    extension_verdict, is_preferred_extension, platform_verdict,
};

fn has_viable_assets(ctx: &ResolutionContext) -> bool {
    ctx.viable().any(crate::candidate::Candidate::is_asset)
}

fn excluded(name: &str, cause: IncompatibilityCause, detail: &str) {
    trace!(target: "anyinstall::filter", "excluding {name}: {cause} ({detail})");
}

/// Excludes assets naming only foreign operating systems.
///
/// Reads `platform`; writes candidate priority, rejection, and the
/// platform-qualified mark.
#[derive(Debug, Default)]
pub struct PlatformFilter;

impl PlatformFilter {
    /// Identifier of this unit.
    pub const ID: &'static str = "platform-filter";
}

impl Unit for PlatformFilter {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        has_viable_assets(ctx)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let host = ctx.platform;
        for candidate in ctx.viable_assets_mut() {
            let tokens = classify(candidate.name());
            match platform_verdict(&tokens, candidate.format(), &host) {
                PlatformVerdict::Qualified => candidate.mark_platform_qualified(),
                PlatformVerdict::Unknown => {}
                PlatformVerdict::Foreign(foreign) => {
                    let detail = foreign
                        .iter()
                        .map(|os| os.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    excluded(candidate.name(), IncompatibilityCause::Platform, &detail);
                    candidate.exclude(IncompatibilityCause::Platform, format!("targets {detail}"));
                }
            }
        }
        Ok(())
    }
}

/// Excludes assets naming only foreign architectures.
#[derive(Debug, Default)]
pub struct ArchitectureFilter;

impl ArchitectureFilter {
    /// Identifier of this unit.
    pub const ID: &'static str = "architecture-filter";
}

impl Unit for ArchitectureFilter {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        has_viable_assets(ctx)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let host = ctx.platform;
        for candidate in ctx.viable_assets_mut() {
            if let ArchVerdict::Foreign(arches) = arch_verdict(&classify(candidate.name()), &host) {
                let detail = arches
                    .iter()
                    .map(|arch| arch.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                excluded(candidate.name(), IncompatibilityCause::Architecture, &detail);
                candidate.exclude(
                    IncompatibilityCause::Architecture,
                    format!("built for {detail}"),
                );
            }
        }
        Ok(())
    }
}

/// Excludes checksums, signatures, and files of unknown format.
#[derive(Debug, Default)]
pub struct ExtensionFilter;

impl ExtensionFilter {
    /// Identifier of this unit.
    pub const ID: &'static str = "extension-filter";
}

impl Unit for ExtensionFilter {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        has_viable_assets(ctx)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        for candidate in ctx.viable_assets_mut() {
            let detail = match extension_verdict(candidate.name(), candidate.extension()) {
                ExtensionVerdict::Installable(_) => continue,
                ExtensionVerdict::Companion => "companion file".to_owned(),
                ExtensionVerdict::Unknown => format!("unknown extension .{}", candidate.extension()),
            };
            excluded(candidate.name(), IncompatibilityCause::Extension, &detail);
            candidate.exclude(IncompatibilityCause::Extension, detail);
        }
        Ok(())
    }
}

/// Excludes formats whose helper tool is missing on the host.
///
/// Reads `capabilities`.
#[derive(Debug, Default)]
pub struct CapabilityFilter;

impl CapabilityFilter {
    /// Identifier of this unit.
    pub const ID: &'static str = "capability-filter";
}

impl Unit for CapabilityFilter {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        has_viable_assets(ctx)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let capabilities = ctx.capabilities.clone();
        for candidate in ctx.viable_assets_mut() {
            let Some(format) = candidate.format() else {
                continue;
            };
            if !capability_verdict(format, &capabilities) {
                let detail = format!("{format} needs {}", format.required_commands().join(" or "));
                excluded(candidate.name(), IncompatibilityCause::Capability, &detail);
                candidate.exclude(IncompatibilityCause::Capability, detail);
            }
        }
        Ok(())
    }
}

/// Applies the preferred-extension, architecture-token, and
/// platform-qualified boosts.
#[derive(Debug)]
pub struct PreferenceBoost {
    weights: ScoringWeights,
}

impl PreferenceBoost {
    /// Identifier of this unit.
    pub const ID: &'static str = "preference-boost";

    /// Creates the unit with `weights`.
    #[must_use]
    pub const fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }
}

impl Unit for PreferenceBoost {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        has_viable_assets(ctx)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let host = ctx.platform;
        let weights = self.weights;
        for candidate in ctx.viable_assets_mut() {
            let mut boost = 0;
            if is_preferred_extension(candidate.extension(), &host) {
                boost += weights.preferred_extension;
            }
            if let ArchVerdict::Matches(count) = arch_verdict(&classify(candidate.name()), &host) {
                boost += weights
                    .arch_token
                    .saturating_mul(i64::try_from(count).unwrap_or(i64::MAX));
            }
            if candidate.is_platform_qualified() {
                boost += weights.platform_qualified;
            }
            if boost != 0 {
                trace!(target: "anyinstall::filter", "boosting {} by {boost}", candidate.name());
                candidate.boost(boost);
            }
        }
        Ok(())
    }
}

/// Demotes prerelease assets, but only when a stable asset survives.
#[derive(Debug)]
pub struct PrereleaseFilter {
    penalty: i64,
}

impl PrereleaseFilter {
    /// Identifier of this unit.
    pub const ID: &'static str = "prerelease-filter";

    /// Creates the unit with a fixed `penalty`.
    #[must_use]
    pub const fn new(penalty: i64) -> Self {
        Self { penalty }
    }
}

impl Unit for PrereleaseFilter {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        let stable = ctx.viable().any(|c| c.is_asset() && !c.is_prerelease());
        stable && ctx.viable().any(|c| c.is_asset() && c.is_prerelease())
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        for candidate in ctx.viable_assets_mut().filter(|c| c.is_prerelease()) {
            trace!(target: "anyinstall::filter", "demoting prerelease {}", candidate.name());
            candidate.demote(
                self.penalty,
                IncompatibilityCause::Prerelease,
                "a stable release is available",
            );
        }
        Ok(())
    }
}

/// Boosts assets installed by the method a previous install used.
///
/// Reads `method_hint`.
#[derive(Debug)]
pub struct MethodHintBoost {
    boost: i64,
}

impl MethodHintBoost {
    /// Identifier of this unit.
    pub const ID: &'static str = "method-hint-boost";

    /// Creates the unit with a fixed `boost`.
    #[must_use]
    pub const fn new(boost: i64) -> Self {
        Self { boost }
    }
}

impl Unit for MethodHintBoost {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        ctx.method_hint.is_some() && has_viable_assets(ctx)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let hint = ctx.method_hint;
        for candidate in ctx.viable_assets_mut() {
            if hint.is_some() && InstallMethod::for_candidate(candidate) == hint {
                candidate.boost(self.boost);
            }
        }
        Ok(())
    }
}

/// Registers every filter with its standard priority.
pub fn register_filters(builder: &mut RegistryBuilder, weights: ScoringWeights) {
    builder.register(PlatformFilter, UnitSpec::new(Phase::Filter, 100));
    builder.register(ArchitectureFilter, UnitSpec::new(Phase::Filter, 90));
    builder.register(ExtensionFilter, UnitSpec::new(Phase::Filter, 80));
    builder.register(CapabilityFilter, UnitSpec::new(Phase::Filter, 70));
    builder.register(
        PreferenceBoost::new(weights),
        UnitSpec::new(Phase::Filter, 60).depends_on(PlatformFilter::ID),
    );
    builder.register(
        PrereleaseFilter::new(weights.prerelease_penalty),
        UnitSpec::new(Phase::Filter, 50),
    );
    builder.register(
        MethodHintBoost::new(weights.method_hint),
        UnitSpec::new(Phase::Filter, 40),
    );
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
