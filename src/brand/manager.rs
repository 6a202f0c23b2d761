//! BrandFlow: the single entry point transports drive.
//!
//! Loads the session for an identity, dispatches the event to the stage
//! engine, selection handler or profile actions, then saves or clears the
//! session according to the outcome.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::FlowError;
use crate::generator::{GeneratorClient, LlmGenerator};
use crate::llm::create_provider;

use super::assembler::ProfileAssembler;
use super::engine::StageEngine;
use super::feedback::Publisher;
use super::model::FeedbackReport;
use super::outbox::{emit, Outbound, Outbox};
use super::render::{Action, FlowEvent, Menu};
use super::selection::SelectionHandler;
use super::session::{Session, SessionStatus, SessionStore};
use super::state::{Stage, StageState};

const MENU_NOTICE: &str = "🏠 Back to the main menu.";
const SHARED_NOTICE: &str = "✅ Project shared!";
const SHARE_FAILED_NOTICE: &str = "❌ Could not share the project right now. Please try again later.";
const FEEDBACK_THANKS: &str = "🙏 Thanks for the feedback!";
const FEEDBACK_FAILED_NOTICE: &str = "❌ Could not deliver your feedback, sorry.";

/// Whether the session survives the event.
enum Outcome {
    Continue,
    Finished,
}

/// Coordinates the staged workflow for every identity.
pub struct BrandFlow {
    store: SessionStore,
    engine: Arc<StageEngine>,
    selection: SelectionHandler,
    publisher: Arc<dyn Publisher>,
    /// One mutex per identity so events for a user never interleave.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BrandFlow {
    pub fn new(generator: Arc<dyn GeneratorClient>, publisher: Arc<dyn Publisher>) -> Self {
        let engine = Arc::new(StageEngine::new(generator.clone()));
        let assembler = Arc::new(ProfileAssembler::new(generator));
        Self {
            store: SessionStore::new(),
            selection: SelectionHandler::new(engine.clone(), assembler),
            engine,
            publisher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build the LLM provider and generator described by `config`.
    pub fn from_config(
        config: &AppConfig,
        publisher: Arc<dyn Publisher>,
    ) -> crate::error::Result<Self> {
        let llm = create_provider(&config.llm)?;
        let generator = Arc::new(LlmGenerator::new(llm, config.generator.clone()));
        Ok(Self::new(generator, publisher))
    }

    /// Begin a new run for `identity`, replacing any session it had.
    ///
    /// Returns the state after stage 1 was presented.
    pub async fn start(
        &self,
        identity: &str,
        seed_concept: &str,
        project_name: &str,
        outbox: &dyn Outbox,
    ) -> Result<StageState, FlowError> {
        let lock = self.lock_for(identity).await;
        let result = {
            let _guard = lock.lock().await;
            self.start_locked(identity, seed_concept, project_name, outbox)
                .await
        };
        self.release(identity, lock).await;
        result
    }

    async fn start_locked(
        &self,
        identity: &str,
        seed_concept: &str,
        project_name: &str,
        outbox: &dyn Outbox,
    ) -> Result<StageState, FlowError> {
        let (seed, name) = (seed_concept.trim(), project_name.trim());
        if seed.is_empty() {
            let err = FlowError::MissingContext { field: "seed_concept" };
            return self.fail(identity, err, None, outbox).await;
        }
        if name.is_empty() {
            let err = FlowError::MissingContext { field: "project_name" };
            return self.fail(identity, err, None, outbox).await;
        }

        if self.store.clear(identity).await {
            info!(identity = identity, "Replacing existing session");
        }
        let mut session = Session::new(identity, seed, name);
        info!(identity = identity, project = name, "Workflow started");

        match self.engine.run_stage(Stage::Problem, &mut session, outbox).await {
            Ok(_) => {
                let state = session.state;
                self.store.save(session).await;
                Ok(state)
            }
            Err(e) => self.fail(identity, e, Some(session), outbox).await,
        }
    }

    /// Handle one user event.
    ///
    /// Returns the new state, or `None` once the session has been torn down.
    pub async fn handle(
        &self,
        identity: &str,
        event: FlowEvent,
        outbox: &dyn Outbox,
    ) -> Result<Option<StageState>, FlowError> {
        let lock = self.lock_for(identity).await;
        let result = {
            let _guard = lock.lock().await;
            self.handle_locked(identity, event, outbox).await
        };
        self.release(identity, lock).await;
        result
    }

    async fn handle_locked(
        &self,
        identity: &str,
        event: FlowEvent,
        outbox: &dyn Outbox,
    ) -> Result<Option<StageState>, FlowError> {
        let Some(mut session) = self.store.get(identity).await else {
            if matches!(&event, FlowEvent::ButtonSelect(id) if id.trim() == Action::Restart.action_id()) {
                emit(outbox, Outbound::notice(MENU_NOTICE)).await;
                return Ok(None);
            }
            let err = FlowError::MissingContext { field: "session" };
            return self.fail(identity, err, None, outbox).await;
        };

        match self.dispatch(&mut session, event, outbox).await {
            Ok(Outcome::Continue) => {
                let state = session.state;
                self.store.save(session).await;
                Ok(Some(state))
            }
            Ok(Outcome::Finished) => {
                self.store.clear(identity).await;
                info!(identity = identity, "Workflow finished");
                Ok(None)
            }
            Err(e) => self.fail(identity, e, Some(session), outbox).await,
        }
    }

    pub async fn status(&self, identity: &str) -> Option<SessionStatus> {
        self.store
            .get(identity)
            .await
            .map(|s| SessionStatus::from(&s))
    }

    /// Drop the session for `identity`. Returns whether one existed.
    pub async fn reset(&self, identity: &str) -> bool {
        let lock = self.lock_for(identity).await;
        let cleared = {
            let _guard = lock.lock().await;
            self.store.clear(identity).await
        };
        self.release(identity, lock).await;
        cleared
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        event: FlowEvent,
        outbox: &dyn Outbox,
    ) -> Result<Outcome, FlowError> {
        let id = match event {
            FlowEvent::TextInput(text) => {
                return match session.state {
                    StageState::AwaitingCustomInput => self
                        .selection
                        .submit_custom_input(&text, session, outbox)
                        .await
                        .map(|_| Outcome::Continue),
                    StageState::AwaitingComment => {
                        self.submit_feedback(session, Some(text), outbox).await
                    }
                    state => Err(FlowError::state_mismatch("free_text", state)),
                };
            }
            FlowEvent::ButtonSelect(id) => id,
        };

        match Action::parse(&id, session.state)? {
            Action::Choose { stage, index } => self
                .selection
                .select_option(stage, index, session, outbox)
                .await
                .map(|_| Outcome::Continue),
            Action::Regenerate => self
                .selection
                .regenerate(session, outbox)
                .await
                .map(|_| Outcome::Continue),
            Action::CustomInput { stage } => self
                .selection
                .request_custom_input(stage, session, outbox)
                .await
                .map(|_| Outcome::Continue),
            Action::Collect => {
                session.expect_state(StageState::ProfileReady, &id)?;
                let profile = session
                    .profile
                    .as_ref()
                    .ok_or(FlowError::MissingContext { field: "profile" })?;
                emit(outbox, Outbound::menu(Menu::collected(profile))).await;
                Ok(Outcome::Finished)
            }
            Action::Share => {
                session.expect_state(StageState::ProfileReady, &id)?;
                let profile = session
                    .profile
                    .as_ref()
                    .ok_or(FlowError::MissingContext { field: "profile" })?;
                let notice = match self.publisher.publish_profile(&session.identity, profile).await {
                    Ok(()) => SHARED_NOTICE,
                    Err(e) => {
                        warn!(identity = %session.identity, error = %e, "Failed to share project");
                        SHARE_FAILED_NOTICE
                    }
                };
                emit(outbox, Outbound::notice(notice)).await;
                Ok(Outcome::Continue)
            }
            Action::LeaveFeedback => {
                session.transition_to(StageState::AwaitingRating, &id)?;
                emit(outbox, Outbound::menu(Menu::rating())).await;
                Ok(Outcome::Continue)
            }
            Action::Rate(stars) => {
                session.expect_state(StageState::AwaitingRating, &id)?;
                if !(1..=5).contains(&stars) {
                    return Err(FlowError::InvalidSelection {
                        index: usize::from(stars),
                        available: 5,
                    });
                }
                session.feedback.rating = Some(stars);
                session.transition_to(StageState::AwaitingComment, &id)?;
                emit(outbox, Outbound::menu(Menu::comment_prompt(stars))).await;
                Ok(Outcome::Continue)
            }
            Action::SkipComment => {
                session.expect_state(StageState::AwaitingComment, &id)?;
                self.submit_feedback(session, None, outbox).await
            }
            Action::Restart => {
                emit(outbox, Outbound::notice(MENU_NOTICE)).await;
                Ok(Outcome::Finished)
            }
        }
    }

    async fn submit_feedback(
        &self,
        session: &mut Session,
        comment: Option<String>,
        outbox: &dyn Outbox,
    ) -> Result<Outcome, FlowError> {
        let rating = session
            .feedback
            .rating
            .ok_or_else(|| FlowError::state_mismatch("feedback", session.state))?;
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        session.feedback.comment = comment.clone();

        let report = FeedbackReport::new(
            session.identity.as_str(),
            session.project_name.clone(),
            rating,
            comment,
        );
        let notice = match self.publisher.publish_feedback(&report).await {
            Ok(()) => FEEDBACK_THANKS,
            Err(e) => {
                warn!(identity = %session.identity, error = %e, "Failed to publish feedback");
                FEEDBACK_FAILED_NOTICE
            }
        };
        emit(outbox, Outbound::notice(notice)).await;
        Ok(Outcome::Finished)
    }

    /// Report `err` to the user and apply the fatal/recoverable policy.
    async fn fail<T>(
        &self,
        identity: &str,
        err: FlowError,
        session: Option<Session>,
        outbox: &dyn Outbox,
    ) -> Result<T, FlowError> {
        emit(outbox, Outbound::notice(err.user_notice())).await;

        if err.is_fatal() {
            error!(identity = identity, error = %err, kind = err.kind(), "Fatal workflow error, clearing session");
            self.store.clear(identity).await;
        } else {
            warn!(identity = identity, error = %err, kind = err.kind(), "Recoverable workflow error");
            if let Some(session) = session {
                self.store.save(session).await;
            }
        }
        Err(err)
    }

    async fn lock_for(&self, identity: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(identity.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the identity's lock entry once no other event holds or awaits it.
    async fn release(&self, identity: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one in `lock`.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(identity);
        }
    }
}
