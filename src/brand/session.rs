//! Per-conversation session state and the in-memory store that owns it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::FlowError;

use super::model::{BrandProfile, Feedback, StageOption};
use super::state::{Stage, StageState};

/// State of one user's in-progress workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub identity: String,
    pub seed_concept: Option<String>,
    pub project_name: Option<String>,
    pub state: StageState,
    stage_options: [Vec<StageOption>; 3],
    stage_choices: [Option<StageOption>; 3],
    pub pending_custom_stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<BrandProfile>,
    #[serde(default)]
    pub feedback: Feedback,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        identity: impl Into<String>,
        seed_concept: impl Into<String>,
        project_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            identity: identity.into(),
            seed_concept: Some(seed_concept.into()),
            project_name: Some(project_name.into()),
            state: StageState::Idle,
            stage_options: Default::default(),
            stage_choices: Default::default(),
            pending_custom_stage: None,
            profile: None,
            feedback: Feedback::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Seed concept and project name, both required for every prompt.
    pub fn context(&self) -> Result<(&str, &str), FlowError> {
        let seed = self
            .seed_concept
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(FlowError::MissingContext {
                field: "seed_concept",
            })?;
        let name = self
            .project_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(FlowError::MissingContext {
                field: "project_name",
            })?;
        Ok((seed, name))
    }

    /// Most recent batch for a stage.
    pub fn options(&self, stage: Stage) -> &[StageOption] {
        &self.stage_options[stage.slot()]
    }

    /// Replace the stage's batch; earlier batches are not retained.
    pub fn set_options(&mut self, stage: Stage, options: Vec<StageOption>) {
        self.stage_options[stage.slot()] = options;
        self.touch();
    }

    pub fn choice(&self, stage: Stage) -> Option<&StageOption> {
        self.stage_choices[stage.slot()].as_ref()
    }

    pub fn commit_choice(&mut self, stage: Stage, option: StageOption) {
        self.stage_choices[stage.slot()] = Some(option);
        self.touch();
    }

    /// Stages among `stages` that have no committed choice.
    pub fn missing_choices(&self, stages: &[Stage]) -> Vec<Stage> {
        stages
            .iter()
            .copied()
            .filter(|s| self.choice(*s).is_none())
            .collect()
    }

    /// Move to `target`, rejecting transitions outside the state table.
    pub fn transition_to(&mut self, target: StageState, action: &str) -> Result<(), FlowError> {
        if !self.state.can_transition_to(target) {
            return Err(FlowError::state_mismatch(action, self.state));
        }
        debug!(identity = %self.identity, from = %self.state, to = %target, "Session transition");
        self.state = target;
        self.touch();
        Ok(())
    }

    /// Fail with `StateMismatch` unless the session is in `expected`.
    pub fn expect_state(&self, expected: StageState, action: &str) -> Result<(), FlowError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(FlowError::state_mismatch(action, self.state))
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Read-only snapshot of a session for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub identity: String,
    pub state: StageState,
    pub project_name: Option<String>,
    pub choices: Vec<(Stage, StageOption)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_custom_stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<BrandProfile>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionStatus {
    fn from(session: &Session) -> Self {
        Self {
            identity: session.identity.clone(),
            state: session.state,
            project_name: session.project_name.clone(),
            choices: Stage::ALL
                .iter()
                .filter_map(|s| session.choice(*s).map(|c| (*s, c.clone())))
                .collect(),
            pending_custom_stage: session.pending_custom_stage,
            profile: session.profile.clone(),
            updated_at: session.updated_at,
        }
    }
}

/// In-memory session store keyed by identity.
///
/// Sessions are cloned out for processing and written back afterwards, so the
/// lock is never held across a generator call.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, identity: &str) -> Option<Session> {
        self.sessions.read().await.get(identity).cloned()
    }

    /// Insert or replace the session under its identity.
    pub async fn save(&self, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.identity.clone(), session);
    }

    /// Remove the session. Returns whether one existed.
    pub async fn clear(&self, identity: &str) -> bool {
        let removed = self.sessions.write().await.remove(identity).is_some();
        if removed {
            debug!(identity = identity, "Session cleared");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(labels: &[&str]) -> Vec<StageOption> {
        labels
            .iter()
            .map(|l| StageOption::new(*l, format!("{l} in full")))
            .collect()
    }

    #[test]
    fn new_session_is_idle_with_context() {
        let session = Session::new("u1", "task manager app", "Taskly");
        assert_eq!(session.state, StageState::Idle);
        assert_eq!(session.context().unwrap(), ("task manager app", "Taskly"));
        assert!(Stage::ALL.iter().all(|s| session.choice(*s).is_none()));
        assert_eq!(session.missing_choices(&Stage::ALL).len(), 3);
    }

    #[test]
    fn missing_context_names_field() {
        let mut session = Session::new("u1", "idea", "Name");
        session.project_name = Some("   ".to_string());
        assert_eq!(
            session.context().unwrap_err(),
            FlowError::MissingContext {
                field: "project_name"
            }
        );
        session.seed_concept = None;
        assert_eq!(
            session.context().unwrap_err(),
            FlowError::MissingContext {
                field: "seed_concept"
            }
        );
    }

    #[test]
    fn set_options_overwrites_batch() {
        let mut session = Session::new("u1", "idea", "Name");
        session.set_options(Stage::Audience, opts(&["A", "B", "C"]));
        session.set_options(Stage::Audience, opts(&["D"]));
        assert_eq!(session.options(Stage::Audience), opts(&["D"]).as_slice());
        assert!(session.options(Stage::Problem).is_empty());
    }

    #[test]
    fn transition_rejects_skips() {
        let mut session = Session::new("u1", "idea", "Name");
        let err = session
            .transition_to(StageState::AwaitingStage2, "run_stage")
            .unwrap_err();
        assert_eq!(err, FlowError::state_mismatch("run_stage", StageState::Idle));
        assert_eq!(session.state, StageState::Idle);

        session.transition_to(StageState::AwaitingStage1, "run_stage").unwrap();
        assert_eq!(session.state, StageState::AwaitingStage1);
    }

    #[test]
    fn missing_choices_respects_order_independence() {
        let mut session = Session::new("u1", "idea", "Name");
        session.commit_choice(Stage::Format, StageOption::custom("App"));
        session.commit_choice(Stage::Problem, StageOption::custom("Focus"));
        assert_eq!(session.missing_choices(&Stage::ALL), vec![Stage::Audience]);
    }

    #[tokio::test]
    async fn store_get_save_clear() {
        let store = SessionStore::new();
        assert!(store.get("u1").await.is_none());
        store.save(Session::new("u1", "idea", "Name")).await;
        store.save(Session::new("u2", "other", "Other")).await;

        // Stored sessions are copies; edits only land on save.
        let mut session = store.get("u1").await.unwrap();
        session.pending_custom_stage = Some(Stage::Audience);
        assert_eq!(store.get("u1").await.unwrap().pending_custom_stage, None);
        store.save(session).await;
        assert_eq!(
            store.get("u1").await.unwrap().pending_custom_stage,
            Some(Stage::Audience)
        );

        assert!(store.clear("u1").await);
        assert!(!store.clear("u1").await);
        assert!(store.get("u1").await.is_none());
        assert!(store.get("u2").await.is_some());
    }

    #[test]
    fn status_lists_committed_choices_in_stage_order() {
        let mut session = Session::new("u1", "idea", "Name");
        session.commit_choice(Stage::Audience, StageOption::custom("Freelancers"));
        session.commit_choice(Stage::Problem, StageOption::custom("Overwhelm"));
        let status = SessionStatus::from(&session);
        let stages: Vec<Stage> = status.choices.iter().map(|(s, _)| *s).collect();
        assert_eq!(stages, vec![Stage::Problem, Stage::Audience]);
    }
}
