//! Resolves an ambiguous install request into one platform-compatible
//! artefact.
//!
//! An input such as `junegunn/fzf`, a release URL, a download page, or a
//! local file is classified, expanded into candidates (release assets,
//! scraped links, and install scripts mined from markdown), filtered against
//! the host platform, and ranked. The [`pipeline`] runs these stages as
//! registered units over one [`context::ResolutionContext`].
//!
//! - [`detect`] - input classification
//! - [`source`] - candidate providers and their network seams
//! - [`filter`] - compatibility rules and scoring boosts
//! - [`select`] - choosing one candidate
//! - [`script`] - the install-script heuristic detector
//! - [`record`] - install records emitted after a successful install
//!
//! No network or subprocess access happens here; the installer crate
//! supplies those collaborators.
//!
//! # Examples
//!
//! ```
//! use anyinstall::config::ResolverConfig;
//! use anyinstall::context::ResolutionContext;
//! use anyinstall::resolver::Resolver;
//! use anyinstall::test_support::{StubPageFetcher, StubReleaseSource, release_with_assets};
//! use anyinstall_common::{Arch, CapabilitySet, Os, PlatformProfile};
//!
//! let releases = StubReleaseSource::with_releases(vec![release_with_assets(
//!     "v0.54.0",
//!     false,
//!     &["fzf-0.54.0-darwin_arm64.tar.gz", "fzf-0.54.0-linux_amd64.tar.gz"],
//! )]);
//! let resolver = Resolver::new(
//!     ResolverConfig::default(),
//!     Box::new(releases),
//!     Box::new(StubPageFetcher::default()),
//! );
//! let mut ctx = ResolutionContext::new(
//!     "junegunn/fzf",
//!     PlatformProfile::new(Os::Darwin, Arch::Arm64),
//!     CapabilitySet::default(),
//! );
//!
//! resolver.resolve(&mut ctx, None)?;
//! assert_eq!(
//!     ctx.selected.as_ref().map(|c| c.name()),
//!     Some("fzf-0.54.0-darwin_arm64.tar.gz")
//! );
//! # Ok::<(), anyinstall::error::ResolveError>(())
//! ```

pub mod candidate;
pub mod config;
pub mod context;
pub mod detect;
pub mod error;
pub mod filter;
mod pattern;
pub mod pipeline;
pub mod record;
pub mod resolver;
pub mod script;
pub mod select;
pub mod source;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use candidate::{Candidate, CandidateKind, CandidateOrigin};
pub use config::ResolverConfig;
pub use context::{ResolutionContext, SourceKind};
pub use error::{IncompatibilityCause, ResolveError, Result};
pub use resolver::Resolver;
