//! Final synthesis of the three committed choices into a `BrandProfile`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::FlowError;
use crate::generator::GeneratorClient;

use super::model::{BrandProfile, DESCRIPTION_FALLBACK, TAGLINE_FALLBACK};
use super::outbox::{emit, Outbound, Outbox};
use super::prompts::synthesis_prompt;
use super::render::Menu;
use super::session::Session;
use super::state::{Stage, StageState};

const ASSEMBLY_NOTICE: &str = "⏳ Putting it all together...";

pub struct ProfileAssembler {
    generator: Arc<dyn GeneratorClient>,
}

impl ProfileAssembler {
    pub fn new(generator: Arc<dyn GeneratorClient>) -> Self {
        Self { generator }
    }

    /// Build the profile, store it on the session and move to `ProfileReady`.
    ///
    /// The session is kept so the post-profile actions can use it.
    pub async fn assemble(
        &self,
        session: &mut Session,
        outbox: &dyn Outbox,
    ) -> Result<BrandProfile, FlowError> {
        let missing = session.missing_choices(&Stage::ALL);
        if !missing.is_empty() {
            return Err(FlowError::IncompleteSelections { missing });
        }
        let (seed, name) = session.context()?;
        let (seed, name) = (seed.to_string(), name.to_string());

        if !session.state.can_transition_to(StageState::ProfileReady) {
            return Err(FlowError::state_mismatch("assemble", session.state));
        }

        let [problem, audience, format] = Stage::ALL.map(|s| session.choice(s).cloned());
        let (Some(problem), Some(audience), Some(format)) = (problem, audience, format) else {
            return Err(FlowError::IncompleteSelections {
                missing: session.missing_choices(&Stage::ALL),
            });
        };

        emit(outbox, Outbound::notice(ASSEMBLY_NOTICE)).await;

        let prompt = synthesis_prompt(&seed, &name, &problem, &audience, &format);
        let batch = self.generator.generate(&prompt).await.map_err(|e| {
            warn!(identity = %session.identity, error = %e, "Profile synthesis failed");
            FlowError::GenerationFailed {
                target: "the project profile".to_string(),
                reason: e.to_string(),
            }
        })?;

        let tagline = non_empty(Some(batch.lead_comment)).unwrap_or_else(|| {
            warn!(identity = %session.identity, "Synthesis output has no tagline");
            TAGLINE_FALLBACK.to_string()
        });
        let description = non_empty(batch.description).unwrap_or_else(|| {
            warn!(identity = %session.identity, "Synthesis output has no description");
            DESCRIPTION_FALLBACK.to_string()
        });

        let profile = BrandProfile {
            project_name: name,
            seed_concept: seed,
            tagline,
            description,
            problem,
            audience,
            format,
            references: batch.options,
        };

        session.profile = Some(profile.clone());
        session.transition_to(StageState::ProfileReady, "assemble")?;

        info!(
            identity = %session.identity,
            references = profile.references.len(),
            "Project profile assembled"
        );

        emit(outbox, Outbound::menu(Menu::for_profile(&profile))).await;
        Ok(profile)
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}
