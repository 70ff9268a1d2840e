use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The fixed set of capabilities the narrator model may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    MoveCharacter,
    SpeakToCharacter,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 2] = [
        CapabilityKind::MoveCharacter,
        CapabilityKind::SpeakToCharacter,
    ];

    /// Wire name used in tool schemas and tool calls.
    pub fn name(self) -> &'static str {
        match self {
            CapabilityKind::MoveCharacter => "move_character",
            CapabilityKind::SpeakToCharacter => "speak_to_character",
        }
    }

    /// Exact match on the wire name; anything else is not dispatchable.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Decode the argument object into the typed capability.
    pub fn decode(self, arguments: Value) -> Result<Capability, serde_json::Error> {
        match self {
            CapabilityKind::MoveCharacter => {
                serde_json::from_value(arguments).map(Capability::MoveCharacter)
            }
            CapabilityKind::SpeakToCharacter => {
                serde_json::from_value(arguments).map(Capability::SpeakToCharacter)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCharacter {
    pub character_name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakToCharacter {
    pub speaking_character: String,
    pub target_character: String,
    pub message: String,
}

/// A capability call with its typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    MoveCharacter(MoveCharacter),
    SpeakToCharacter(SpeakToCharacter),
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::MoveCharacter(_) => CapabilityKind::MoveCharacter,
            Capability::SpeakToCharacter(_) => CapabilityKind::SpeakToCharacter,
        }
    }

    pub fn short_name(&self) -> &'static str {
        self.kind().name()
    }
}

/// A tool call that passed parsing and name lookup but has not run yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityCall {
    pub id: String,
    pub kind: CapabilityKind,
    pub arguments: Value,
}
