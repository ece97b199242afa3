//! Assembly of the standard resolution pipeline.
//!
//! [`Resolver`] registers the detect, source, filter, and select units with
//! their standard priorities. Callers that install add their own download
//! and install units to the returned builder before building it.

use crate::config::ResolverConfig;
use crate::context::ResolutionContext;
use crate::detect::register_detectors;
use crate::error::Result;
use crate::filter::register_filters;
use crate::pipeline::{CleanupWarning, Phase, Pipeline, RegistryBuilder, UnitSpec};
use crate::select::Selector;
use crate::source::{
    DirectLinkProvider, LocalFileProvider, PageFetcher, ReleaseAssetProvider, ReleaseSource,
    RequireCandidates, ScriptProvider, WebsiteProvider,
};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Builds resolution pipelines around the network collaborators.
pub struct Resolver {
    config: ResolverConfig,
    releases: Box<dyn ReleaseSource>,
    pages: Box<dyn PageFetcher>,
}

impl Resolver {
    /// Creates a resolver using `config` and the given backends.
    #[must_use]
    pub const fn new(
        config: ResolverConfig,
        releases: Box<dyn ReleaseSource>,
        pages: Box<dyn PageFetcher>,
    ) -> Self {
        Self {
            config,
            releases,
            pages,
        }
    }

    /// The configuration the units are built from.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// A builder holding every unit up to and including the Select phase.
    #[must_use]
    pub fn into_builder(self) -> RegistryBuilder {
        let Self {
            config,
            releases,
            pages,
        } = self;
        let weights = config.weights;
        let mut builder = RegistryBuilder::new();

        register_detectors(&mut builder);

        builder.register(
            ReleaseAssetProvider::new(releases, &config),
            UnitSpec::new(Phase::Source, 100),
        );
        builder.register(
            WebsiteProvider::new(pages, weights.scraped_base),
            UnitSpec::new(Phase::Source, 90),
        );
        builder.register(
            DirectLinkProvider::new(weights.asset_base),
            UnitSpec::new(Phase::Source, 80),
        );
        builder.register(
            LocalFileProvider::new(weights.asset_base),
            UnitSpec::new(Phase::Source, 80),
        );
        builder.register(
            ScriptProvider::new(config.script),
            UnitSpec::new(Phase::Source, 50)
                .depends_on(ReleaseAssetProvider::ID)
                .depends_on(WebsiteProvider::ID),
        );
        builder.register(
            RequireCandidates,
            UnitSpec::new(Phase::Source, -100).depends_on(ScriptProvider::ID),
        );

        register_filters(&mut builder, weights);

        builder.register(
            Selector::new(config.max_alternatives),
            UnitSpec::new(Phase::Select, 100),
        );
        builder
    }

    /// Runs detection through selection on `ctx`.
    ///
    /// On success `ctx.selected` holds the chosen candidate.
    ///
    /// # Errors
    ///
    /// Returns the first unit failure, or [`crate::error::ResolveError::Cancelled`]
    /// when `cancel` is raised between units.
    pub fn resolve(
        self,
        ctx: &mut ResolutionContext,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<Vec<CleanupWarning>> {
        let registry = self.into_builder().build()?;
        debug!(target: "anyinstall::resolver", "resolving {:?} for {}", ctx.input(), ctx.platform);
        let mut pipeline = Pipeline::new(registry);
        if let Some(flag) = cancel {
            pipeline = pipeline.with_cancellation(flag);
        }
        pipeline.run_until(ctx, Phase::Select).into_result()
    }
}
