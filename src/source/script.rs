//! Install-script candidates mined from fetched documents.

use crate::candidate::Candidate;
use crate::config::ScriptLimits;
use crate::context::ResolutionContext;
use crate::error::Result;
use crate::pipeline::Unit;
use crate::script::detect_install_scripts;
use log::debug;

/// Adds script candidates for snippets found in the context's documents.
///
/// Reads `documents` and `platform`; writes `candidates`. Runs once, after
/// the providers that collect documents.
#[derive(Debug, Clone)]
pub struct ScriptProvider {
    limits: ScriptLimits,
}

impl ScriptProvider {
    /// Identifier of this unit.
    pub const ID: &'static str = "install-scripts";

    /// Creates the provider with the given rejection limits.
    #[must_use]
    pub const fn new(limits: ScriptLimits) -> Self {
        Self { limits }
    }
}

impl Unit for ScriptProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn should_run(&self, ctx: &ResolutionContext) -> bool {
        !ctx.documents.is_empty() && ctx.candidates.iter().all(Candidate::is_asset)
    }

    fn execute(&mut self, ctx: &mut ResolutionContext) -> Result<()> {
        let scripts = detect_install_scripts(&ctx.documents, ctx.platform.os(), &self.limits);
        debug!(
            target: "anyinstall::source",
            "{} install script(s) found in {} document(s)",
            scripts.len(),
            ctx.documents.len()
        );
        for snippet in scripts {
            let confidence = u8::try_from(snippet.score.clamp(0, 100)).unwrap_or(100);
            let priority = snippet.adjusted_score();
            ctx.candidates.push(
                Candidate::script(snippet.code, snippet.document, Self::ID, priority)
                    .with_confidence(confidence),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{CandidateKind, ScriptDocument};
    use crate::context::SourceDocument;
    use anyinstall_common::{Arch, CapabilitySet, Os, PlatformProfile};
    use rstest::{fixture, rstest};

    #[fixture]
    fn context() -> ResolutionContext {
        ResolutionContext::new(
            "owner/tool",
            PlatformProfile::new(Os::Darwin, Arch::Arm64),
            CapabilitySet::default(),
        )
    }

    #[rstest]
    fn scripts_enter_with_adjusted_priority(mut context: ResolutionContext) {
        context.documents.push(SourceDocument {
            kind: ScriptDocument::Readme,
            text: "## Install\n\n```sh\ncurl -fsSL https://x/install.sh | sh\n```\n".to_owned(),
        });
        let mut unit = ScriptProvider::new(ScriptLimits::default());
        assert!(unit.should_run(&context));

        unit.execute(&mut context).expect("script mining never fails");

        let script = context.candidates.first().expect("one script candidate");
        assert_eq!(script.kind(), CandidateKind::Script);
        assert_eq!(script.priority(), 115);
        assert_eq!(script.confidence(), 95);
        assert_eq!(script.provider(), ScriptProvider::ID);
        assert!(!unit.should_run(&context));
    }

    #[rstest]
    fn nothing_to_mine_without_documents(context: ResolutionContext) {
        let unit = ScriptProvider::new(ScriptLimits::default());
        assert!(!unit.should_run(&context));
    }

    #[rstest]
    fn foreign_snippets_add_nothing(mut context: ResolutionContext) {
        context.documents.push(SourceDocument {
            kind: ScriptDocument::ReleaseNotes,
            text: "sudo apt-get install tool".to_owned(),
        });
        let mut unit = ScriptProvider::new(ScriptLimits::default());

        unit.execute(&mut context).expect("script mining never fails");

        assert!(context.candidates.is_empty());
    }
}
