use serde::{Deserialize, Serialize};

use crate::engine::world_tracker::WorldTracker;
use crate::model::character::Character;
use crate::model::history::ConversationHistory;
use crate::model::transcript::Transcript;

/// Everything one conversation owns, threaded through every engine call.
///
/// Created when a story starts, dropped on reset. Steps take it by `&mut`,
/// so only one step can run against it at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub genre: String,
    pub(crate) history: ConversationHistory,
    pub(crate) world: WorldTracker,
    pub(crate) transcript: Transcript,
    pub(crate) turn: u32,
}

impl Session {
    pub fn new(genre: impl Into<String>, system_prompt: String, world: WorldTracker) -> Self {
        Self {
            genre: genre.into(),
            history: ConversationHistory::new(system_prompt),
            world,
            transcript: Transcript::default(),
            turn: 0,
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn world(&self) -> &WorldTracker {
        &self.world
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Name, role and location of every character, in registration order.
    pub fn character_state(&self) -> Vec<Character> {
        self.world.registry().iter().cloned().collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
