//! Selection handling: menu picks, custom text and regeneration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::FlowError;

use super::assembler::ProfileAssembler;
use super::engine::StageEngine;
use super::model::{BrandProfile, StageOption};
use super::outbox::{emit, Outbound, Outbox};
use super::render::{Action, Menu};
use super::session::Session;
use super::state::{Stage, StageState};

const CUSTOM_INPUT_PROMPT: &str = "✏️ Type your own option:";

/// What the user sees after a handled selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The next stage's menu (or the same stage, regenerated).
    Menu(Menu),
    /// All stages done; the profile card was rendered.
    Profile(BrandProfile),
    /// Waiting for the user to type an option.
    AwaitingText,
}

pub struct SelectionHandler {
    engine: Arc<StageEngine>,
    assembler: Arc<ProfileAssembler>,
}

impl SelectionHandler {
    pub fn new(engine: Arc<StageEngine>, assembler: Arc<ProfileAssembler>) -> Self {
        Self { engine, assembler }
    }

    /// Commit option `index` of `stage` and advance.
    ///
    /// While the menu for `stage` is still on screen the choice may be
    /// re-committed, so a failed follow-up generation can be retried.
    pub async fn select_option(
        &self,
        stage: Stage,
        index: usize,
        session: &mut Session,
        outbox: &dyn Outbox,
    ) -> Result<Advance, FlowError> {
        let action = Action::Choose { stage, index }.action_id();
        session.expect_state(StageState::awaiting(stage), &action)?;

        let options = session.options(stage);
        let option = options
            .get(index)
            .cloned()
            .ok_or(FlowError::InvalidSelection {
                index,
                available: options.len(),
            })?;

        info!(identity = %session.identity, stage = %stage, choice = %option.short, "Option selected");
        session.commit_choice(stage, option);
        self.advance(stage, session, outbox).await
    }

    /// Switch the active stage to free-text entry.
    pub async fn request_custom_input(
        &self,
        stage: Stage,
        session: &mut Session,
        outbox: &dyn Outbox,
    ) -> Result<Advance, FlowError> {
        let action = Action::CustomInput { stage }.action_id();
        session.expect_state(StageState::awaiting(stage), &action)?;

        session.transition_to(StageState::AwaitingCustomInput, &action)?;
        session.pending_custom_stage = Some(stage);

        emit(outbox, Outbound::notice(CUSTOM_INPUT_PROMPT)).await;
        Ok(Advance::AwaitingText)
    }

    /// Commit typed text as the pending stage's choice and advance.
    pub async fn submit_custom_input(
        &self,
        text: &str,
        session: &mut Session,
        outbox: &dyn Outbox,
    ) -> Result<Advance, FlowError> {
        session.expect_state(StageState::AwaitingCustomInput, "custom_text")?;
        let stage = session
            .pending_custom_stage
            .ok_or(FlowError::PendingStageMissing)?;

        let option = StageOption::custom(text);
        if !option.is_complete() {
            return Err(FlowError::EmptyInput);
        }

        info!(identity = %session.identity, stage = %stage, choice = %option.short, "Custom option submitted");
        session.commit_choice(stage, option);
        session.pending_custom_stage = None;
        session.transition_to(StageState::awaiting(stage), "custom_text")?;

        let result = self.advance(stage, session, outbox).await;
        if matches!(&result, Err(e) if !e.is_fatal()) {
            // Stay on the text prompt so the user can resubmit.
            session.state = StageState::AwaitingCustomInput;
            session.pending_custom_stage = Some(stage);
        }
        result
    }

    /// Replace the active stage's options with a fresh batch.
    ///
    /// From `Idle` this retries stage 1 after a failed first generation.
    pub async fn regenerate(
        &self,
        session: &mut Session,
        outbox: &dyn Outbox,
    ) -> Result<Advance, FlowError> {
        let stage = match session.state {
            StageState::Idle => Some(Stage::Problem),
            state => state.active_stage(),
        }
        .ok_or_else(|| FlowError::state_mismatch(Action::Regenerate.action_id(), session.state))?;

        debug!(identity = %session.identity, stage = %stage, "Regenerating options");
        self.engine
            .run_stage(stage, session, outbox)
            .await
            .map(Advance::Menu)
    }

    async fn advance(
        &self,
        committed: Stage,
        session: &mut Session,
        outbox: &dyn Outbox,
    ) -> Result<Advance, FlowError> {
        match committed.next() {
            Some(next) => self
                .engine
                .run_stage(next, session, outbox)
                .await
                .map(Advance::Menu),
            None => self
                .assembler
                .assemble(session, outbox)
                .await
                .map(Advance::Profile),
        }
    }
}
