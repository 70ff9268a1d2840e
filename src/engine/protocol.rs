use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::engine::llm_client::ProviderError;
use crate::model::character::{Character, SetupError};
use crate::model::event_result::WorldUpdateReport;
use crate::model::message::Turn;
use crate::model::transcript::TimelineItem;

/// Where a narrative step currently is. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    AwaitingModel,
    ToolRequested,
    ExecutingTool,
    AwaitingModelSecond,
    Finalized,
    Failed,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepPhase::AwaitingModel => "awaiting_model",
            StepPhase::ToolRequested => "tool_requested",
            StepPhase::ExecutingTool => "executing_tool",
            StepPhase::AwaitingModelSecond => "awaiting_model_second",
            StepPhase::Finalized => "finalized",
            StepPhase::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Terminal failure of one step. `Display` is what the player sees in
/// place of narrative.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("An error occurred while processing your request: {0}")]
    ProviderCall(#[from] ProviderError),

    #[error("Error processing arguments for the action {tool}: {reason}")]
    ArgumentParse { tool: String, reason: String },

    #[error("The AI tried to use an unknown action: {0}.")]
    UnknownTool(String),

    #[error("An error occurred while performing the action: {tool}. Details: {reason}")]
    ToolExecution { tool: String, reason: String },
}

/// The single capability round executed during a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRound {
    pub call_id: String,
    pub tool: &'static str,
    pub result: String,
    /// Further calls in the same response that were recorded but not run.
    pub ignored_calls: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub narrative: String,
    pub options_block: String,
    pub choices: Vec<String>,
    pub tool_round: Option<ToolRound>,
    pub world: WorldUpdateReport,
    pub history: Vec<Turn>,
}

/// Result of one narrative step.
///
/// Failures still carry the history as it stood when the step stopped;
/// nothing is rolled back.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Finalized(StepReport),
    Failed {
        error: StepError,
        world: WorldUpdateReport,
        history: Vec<Turn>,
    },
}

impl StepOutcome {
    /// Narrative to display: the prose, or the error message.
    pub fn narrative(&self) -> Cow<'_, str> {
        match self {
            StepOutcome::Finalized(report) => Cow::Borrowed(&report.narrative),
            StepOutcome::Failed { error, .. } => Cow::Owned(error.to_string()),
        }
    }

    pub fn choices(&self) -> &[String] {
        match self {
            StepOutcome::Finalized(report) => &report.choices,
            StepOutcome::Failed { .. } => &[],
        }
    }

    pub fn history(&self) -> &[Turn] {
        match self {
            StepOutcome::Finalized(report) => &report.history,
            StepOutcome::Failed { history, .. } => history,
        }
    }

    pub fn world(&self) -> &WorldUpdateReport {
        match self {
            StepOutcome::Finalized(report) => &report.world,
            StepOutcome::Failed { world, .. } => world,
        }
    }

    pub fn error(&self) -> Option<&StepError> {
        match self {
            StepOutcome::Finalized(_) => None,
            StepOutcome::Failed { error, .. } => Some(error),
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, StepOutcome::Finalized(_))
    }
}

pub enum EngineCommand {
    StartStory {
        genre: String,
        roster: Vec<Character>,
    },
    PlayerInput {
        text: String,
        is_choice: bool,
    },
    CharacterState,
    Timeline {
        width: usize,
    },
    ExportStory,
    SaveSession,
    Reset,
}

pub enum EngineResponse {
    Step {
        outcome: Box<StepOutcome>,
        characters: Vec<Character>,
    },
    SetupFailed(SetupError),
    Characters(Vec<Character>),
    Timeline(Vec<TimelineItem>),
    Story(String),
    SessionJson(String),
    SessionNotSaved(String),
    NoStory,
    ResetDone,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::llm_client::ProviderErrorKind;

    #[test]
    fn failure_narrative_is_the_error_message() {
        let outcome = StepOutcome::Failed {
            error: StepError::UnknownTool("teleport_character".into()),
            world: WorldUpdateReport::default(),
            history: Vec::new(),
        };

        assert_eq!(
            outcome.narrative(),
            "The AI tried to use an unknown action: teleport_character."
        );
        assert!(outcome.choices().is_empty());
        assert!(!outcome.is_finalized());
    }

    #[test]
    fn provider_errors_convert() {
        let err: StepError =
            ProviderError::new(ProviderErrorKind::Network, "connection refused").into();
        assert_eq!(
            err.to_string(),
            "An error occurred while processing your request: connection refused"
        );
    }
}
