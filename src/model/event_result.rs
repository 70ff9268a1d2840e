use serde::{Deserialize, Serialize};

/// Which channel proposed a world-state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    /// Arguments of a successfully executed capability call.
    Authoritative,
    /// Pattern match over the final narrative text.
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WorldUpdate {
    Applied {
        source: UpdateSource,
        character: String,
        location: String,
    },
    Rejected {
        source: UpdateSource,
        reason: String,
    },
    Deferred {
        source: UpdateSource,
        character: String,
        reason: String,
    },
}

impl WorldUpdate {
    pub fn is_applied(&self) -> bool {
        matches!(self, WorldUpdate::Applied { .. })
    }
}

/// Everything the world-state tracker did during one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldUpdateReport {
    pub results: Vec<WorldUpdate>,
}

impl WorldUpdateReport {
    pub fn push(&mut self, update: WorldUpdate) {
        self.results.push(update);
    }

    pub fn applied(&self) -> impl Iterator<Item = (&str, &str, UpdateSource)> {
        self.results.iter().filter_map(|r| match r {
            WorldUpdate::Applied {
                source,
                character,
                location,
            } => Some((character.as_str(), location.as_str(), *source)),
            _ => None,
        })
    }
}
