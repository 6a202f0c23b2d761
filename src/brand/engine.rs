//! Stage engine: builds a stage prompt, calls the generator and renders the
//! resulting menu.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::FlowError;
use crate::generator::GeneratorClient;

use super::model::StageOption;
use super::outbox::{emit, Outbound, Outbox};
use super::prompts::stage_prompt;
use super::render::Menu;
use super::session::Session;
use super::state::{Stage, StageState};

pub struct StageEngine {
    generator: Arc<dyn GeneratorClient>,
}

impl StageEngine {
    pub fn new(generator: Arc<dyn GeneratorClient>) -> Self {
        Self { generator }
    }

    /// Generate and present the options for `stage`.
    ///
    /// Every precondition is checked before the generator is called. On
    /// failure the session's state and stored options are left as they were.
    pub async fn run_stage(
        &self,
        stage: Stage,
        session: &mut Session,
        outbox: &dyn Outbox,
    ) -> Result<Menu, FlowError> {
        let (seed, name) = session.context()?;

        let missing = session.missing_choices(stage.predecessors());
        if !missing.is_empty() {
            return Err(FlowError::IncompleteSelections { missing });
        }

        let target = StageState::awaiting(stage);
        if !session.state.can_transition_to(target) {
            return Err(FlowError::state_mismatch(
                format!("run_stage:{stage}"),
                session.state,
            ));
        }

        let prior: Vec<(Stage, &StageOption)> = stage
            .predecessors()
            .iter()
            .filter_map(|s| session.choice(*s).map(|c| (*s, c)))
            .collect();
        let prompt = stage_prompt(stage, seed, name, &prior);

        emit(outbox, Outbound::notice(stage.progress_notice())).await;

        let batch = self.generator.generate(&prompt).await.map_err(|e| {
            warn!(identity = %session.identity, stage = %stage, error = %e, "Stage generation failed");
            FlowError::GenerationFailed {
                target: stage.subject().to_string(),
                reason: e.to_string(),
            }
        })?;

        if batch.options.is_empty() {
            warn!(identity = %session.identity, stage = %stage, "Generator returned no options");
            return Err(FlowError::GenerationFailed {
                target: stage.subject().to_string(),
                reason: "no options in generator output".to_string(),
            });
        }

        let menu = Menu::for_stage(stage, &batch.lead_comment, &batch.options);
        session.set_options(stage, batch.options);
        session.transition_to(target, "run_stage")?;

        info!(
            identity = %session.identity,
            stage = %stage,
            options = menu.options.len(),
            "Stage options ready"
        );

        emit(outbox, Outbound::menu(menu.clone())).await;
        Ok(menu)
    }
}
