//! Workflow state machine: the three decision stages and the session state.

use serde::{Deserialize, Serialize};

/// The three sequential decision stages.
///
/// Progresses linearly: Problem → Audience → Format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Which problem or need the concept addresses.
    Problem,
    /// Who benefits the most.
    Audience,
    /// The concrete format the project takes.
    Format,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Problem, Stage::Audience, Stage::Format];

    /// One-based stage number used in action ids and headings.
    pub fn number(&self) -> u8 {
        match self {
            Self::Problem => 1,
            Self::Audience => 2,
            Self::Format => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Stage> {
        match n {
            1 => Some(Self::Problem),
            2 => Some(Self::Audience),
            3 => Some(Self::Format),
            _ => None,
        }
    }

    /// Zero-based slot in per-stage arrays.
    pub(crate) fn slot(&self) -> usize {
        usize::from(self.number() - 1)
    }

    pub fn next(&self) -> Option<Stage> {
        Stage::from_number(self.number() + 1)
    }

    /// Stages that must be committed before this one can be generated.
    pub fn predecessors(&self) -> &'static [Stage] {
        match self {
            Self::Problem => &[],
            Self::Audience => &[Stage::Problem],
            Self::Format => &[Stage::Problem, Stage::Audience],
        }
    }

    /// Heading shown above the stage menu.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Problem => "Stage 1: the core.",
            Self::Audience => "Stage 2: who is it for?",
            Self::Format => "Stage 3: format.",
        }
    }

    /// Notice sent while the stage options are being generated.
    pub fn progress_notice(&self) -> &'static str {
        match self {
            Self::Problem => "⏳ Moving on to the problem space of the project...",
            Self::Audience => "⏳ Moving on to the target audience...",
            Self::Format => "⏳ Now the most interesting part: what format will it take...",
        }
    }

    /// What the stage generates, used in error notices.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Problem => "problem options",
            Self::Audience => "audience options",
            Self::Format => "format options",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Problem => "problem",
            Self::Audience => "audience",
            Self::Format => "format",
        };
        write!(f, "{s}")
    }
}

/// Where a session currently is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Session created, stage 1 not rendered yet.
    #[default]
    Idle,
    AwaitingStage1,
    AwaitingStage2,
    AwaitingStage3,
    AwaitingCustomInput,
    ProfileReady,
    AwaitingRating,
    AwaitingComment,
}

impl StageState {
    /// The state in which the menu for `stage` is on screen.
    pub fn awaiting(stage: Stage) -> StageState {
        match stage {
            Stage::Problem => Self::AwaitingStage1,
            Stage::Audience => Self::AwaitingStage2,
            Stage::Format => Self::AwaitingStage3,
        }
    }

    /// The stage whose menu is active, if any.
    pub fn active_stage(&self) -> Option<Stage> {
        match self {
            Self::AwaitingStage1 => Some(Stage::Problem),
            Self::AwaitingStage2 => Some(Stage::Audience),
            Self::AwaitingStage3 => Some(Stage::Format),
            _ => None,
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Self-transitions on a stage are regenerations.
    pub fn can_transition_to(&self, target: StageState) -> bool {
        use StageState::*;
        matches!(
            (self, target),
            (Idle, AwaitingStage1)
                | (AwaitingStage1, AwaitingStage1)
                | (AwaitingStage1, AwaitingStage2)
                | (AwaitingStage2, AwaitingStage2)
                | (AwaitingStage2, AwaitingStage3)
                | (AwaitingStage3, AwaitingStage3)
                | (AwaitingStage3, ProfileReady)
                | (AwaitingStage1 | AwaitingStage2 | AwaitingStage3, AwaitingCustomInput)
                | (AwaitingCustomInput, AwaitingStage1 | AwaitingStage2 | AwaitingStage3)
                | (ProfileReady, AwaitingRating)
                | (AwaitingRating, AwaitingComment)
        )
    }
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::AwaitingStage1 => "awaiting_stage1",
            Self::AwaitingStage2 => "awaiting_stage2",
            Self::AwaitingStage3 => "awaiting_stage3",
            Self::AwaitingCustomInput => "awaiting_custom_input",
            Self::ProfileReady => "profile_ready",
            Self::AwaitingRating => "awaiting_rating",
            Self::AwaitingComment => "awaiting_comment",
        };
        write!(f, "{s}")
    }
}
