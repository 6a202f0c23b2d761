//! Render payloads and the action-id codec shared by every transport.
//!
//! Transports show a [`Menu`] as buttons and send back an [`InboundEvent`]
//! carrying either the pressed button's `action_id` or free text.

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

use super::model::{BrandProfile, StageOption};
use super::state::Stage;

/// A user action addressed by a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Choose { stage: Stage, index: usize },
    Regenerate,
    CustomInput { stage: Stage },
    Collect,
    Share,
    LeaveFeedback,
    Rate(u8),
    SkipComment,
    Restart,
}

impl Action {
    /// Wire identifier, e.g. `choose_stage2:0`.
    pub fn action_id(&self) -> String {
        match self {
            Self::Choose { stage, index } => format!("choose_stage{}:{index}", stage.number()),
            Self::Regenerate => "repeat_brand".to_string(),
            Self::CustomInput { stage } => format!("custom_input:{}", stage.number()),
            Self::Collect => "get_project".to_string(),
            Self::Share => "forward_project".to_string(),
            Self::LeaveFeedback => "leave_feedback".to_string(),
            Self::Rate(stars) => format!("rate_{stars}"),
            Self::SkipComment => "skip_comment".to_string(),
            Self::Restart => "start".to_string(),
        }
    }

    /// Parse a wire identifier.
    ///
    /// A recognized prefix with a malformed index is an `InvalidSelection`;
    /// anything unrecognized is a `StateMismatch`.
    pub fn parse(id: &str, state: super::state::StageState) -> Result<Action, FlowError> {
        let id = id.trim();
        let unknown = || FlowError::state_mismatch(id, state);

        match id {
            "repeat_brand" => return Ok(Self::Regenerate),
            "get_project" => return Ok(Self::Collect),
            "forward_project" => return Ok(Self::Share),
            "leave_feedback" => return Ok(Self::LeaveFeedback),
            "skip_comment" => return Ok(Self::SkipComment),
            "start" => return Ok(Self::Restart),
            _ => {}
        }

        if let Some(rest) = id.strip_prefix("choose_stage") {
            let (stage, index) = rest.split_once(':').ok_or_else(unknown)?;
            let stage = parse_stage(stage).ok_or_else(unknown)?;
            let index = index
                .parse::<usize>()
                .map_err(|_| FlowError::InvalidSelection {
                    index: usize::MAX,
                    available: 0,
                })?;
            return Ok(Self::Choose { stage, index });
        }

        if let Some(stage) = id.strip_prefix("custom_input:") {
            let stage = parse_stage(stage).ok_or_else(unknown)?;
            return Ok(Self::CustomInput { stage });
        }

        if let Some(stars) = id.strip_prefix("rate_") {
            let stars = stars.parse::<u8>().map_err(|_| FlowError::InvalidSelection {
                index: usize::MAX,
                available: 5,
            })?;
            return Ok(Self::Rate(stars));
        }

        Err(unknown())
    }
}

fn parse_stage(s: &str) -> Option<Stage> {
    s.parse::<u8>().ok().and_then(Stage::from_number)
}

/// One selectable option in a stage menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    pub index: usize,
    pub label: String,
    pub full: String,
    pub action_id: String,
}

/// A button that is always offered alongside the options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingAction {
    pub label: String,
    pub action_id: String,
}

impl StandingAction {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action_id: action.action_id(),
        }
    }
}

/// Abstract choice menu rendered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub text: String,
    pub options: Vec<MenuOption>,
    pub standing_actions: Vec<StandingAction>,
}

impl Menu {
    /// Menu for a freshly generated stage batch.
    pub fn for_stage(stage: Stage, lead_comment: &str, options: &[StageOption]) -> Self {
        let mut text = format!("{}\n{}\n\nOptions:\n", stage.heading(), lead_comment.trim());
        for opt in options {
            text.push_str(&format!("• {}\n", opt.full));
        }

        let options = options
            .iter()
            .enumerate()
            .map(|(index, opt)| MenuOption {
                index,
                label: opt.short.clone(),
                full: opt.full.clone(),
                action_id: Action::Choose { stage, index }.action_id(),
            })
            .collect();

        Self {
            text,
            options,
            standing_actions: vec![
                StandingAction::new("🔄 3 more options", Action::Regenerate),
                StandingAction::new("✏️ My own option", Action::CustomInput { stage }),
                StandingAction::new("🏠 Menu", Action::Restart),
            ],
        }
    }

    /// Final profile card with the post-profile actions.
    pub fn for_profile(profile: &BrandProfile) -> Self {
        Self {
            text: profile.render(),
            options: Vec::new(),
            standing_actions: vec![
                StandingAction::new("📜 Collect project", Action::Collect),
                StandingAction::new("📢 Share project", Action::Share),
                StandingAction::new("⭐ Leave feedback", Action::LeaveFeedback),
                StandingAction::new("🏠 Menu", Action::Restart),
            ],
        }
    }

    /// Profile card sent on collection; the session is gone afterwards.
    pub fn collected(profile: &BrandProfile) -> Self {
        Self {
            text: profile.render(),
            options: Vec::new(),
            standing_actions: vec![StandingAction::new("🔄 Back to menu", Action::Restart)],
        }
    }

    /// One-to-five star rating menu.
    pub fn rating() -> Self {
        Self {
            text: "Rate the project from 1 to 5 ⭐:".to_string(),
            options: (1..=5u8)
                .map(|stars| MenuOption {
                    index: usize::from(stars - 1),
                    label: "⭐".repeat(usize::from(stars)),
                    full: format!("{stars}/5"),
                    action_id: Action::Rate(stars).action_id(),
                })
                .collect(),
            standing_actions: Vec::new(),
        }
    }

    /// Prompt for an optional comment after a rating.
    pub fn comment_prompt(stars: u8) -> Self {
        Self {
            text: format!(
                "Thanks for your rating {stars}⭐!\nNow write a comment if you like ⌨️"
            ),
            options: Vec::new(),
            standing_actions: vec![StandingAction::new(
                "✅ Send without a comment",
                Action::SkipComment,
            )],
        }
    }

    /// Every action id the menu offers, options first.
    pub fn action_ids(&self) -> Vec<&str> {
        self.options
            .iter()
            .map(|o| o.action_id.as_str())
            .chain(self.standing_actions.iter().map(|a| a.action_id.as_str()))
            .collect()
    }
}

/// Raw inbound event from a transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_text: Option<String>,
}

/// The two event kinds the workflow reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    TextInput(String),
    ButtonSelect(String),
}

impl TryFrom<InboundEvent> for FlowEvent {
    type Error = crate::error::ChannelError;

    fn try_from(event: InboundEvent) -> Result<Self, Self::Error> {
        match (event.action_id, event.free_text) {
            (Some(id), _) if !id.trim().is_empty() => Ok(Self::ButtonSelect(id)),
            (_, Some(text)) => Ok(Self::TextInput(text)),
            _ => Err(crate::error::ChannelError::InvalidMessage(
                "event needs an action_id or free_text".to_string(),
            )),
        }
    }
}
