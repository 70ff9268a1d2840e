//! Capabilities the narrator model may call.
//!
//! Both are narrative simulations: they only produce an acknowledgment for
//! the model. The matching world-state change is applied by the engine.

use serde_json::{json, Value};

use crate::engine::protocol::StepError;
use crate::model::capability::{
    Capability, CapabilityCall, CapabilityKind, MoveCharacter, SpeakToCharacter,
};

/// Tool definition offered to the provider on every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

fn definition(kind: CapabilityKind) -> ToolDefinition {
    match kind {
        CapabilityKind::MoveCharacter => ToolDefinition {
            name: kind.name().to_string(),
            description: "Move a character to a specified location in the narrative world."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "character_name": {
                        "type": "string",
                        "description": "The name of the character to move."
                    },
                    "location": {
                        "type": "string",
                        "description": "The destination location."
                    }
                },
                "required": ["character_name", "location"]
            }),
        },
        CapabilityKind::SpeakToCharacter => ToolDefinition {
            name: kind.name().to_string(),
            description: "Have one character speak a message to another character.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "speaking_character": {
                        "type": "string",
                        "description": "The name of the character who is speaking."
                    },
                    "target_character": {
                        "type": "string",
                        "description": "The name of the character being spoken to."
                    },
                    "message": {
                        "type": "string",
                        "description": "The message to be delivered."
                    }
                },
                "required": ["speaking_character", "target_character", "message"]
            }),
        },
    }
}

/// The fixed capability schema, in dispatch-table order.
pub fn capability_schema() -> Vec<ToolDefinition> {
    CapabilityKind::ALL.into_iter().map(definition).collect()
}

/// Run a decoded call: typed argument decoding, then the handler.
pub fn execute(call: &CapabilityCall) -> Result<(Capability, String), StepError> {
    let tool = call.kind.name();

    let capability =
        call.kind
            .decode(call.arguments.clone())
            .map_err(|e| StepError::ToolExecution {
                tool: tool.to_string(),
                reason: e.to_string(),
            })?;

    let acknowledgment = run(&capability).map_err(|reason| StepError::ToolExecution {
        tool: tool.to_string(),
        reason,
    })?;

    Ok((capability, acknowledgment))
}

fn run(capability: &Capability) -> Result<String, String> {
    match capability {
        Capability::MoveCharacter(args) => move_character(args),
        Capability::SpeakToCharacter(args) => speak_to_character(args),
    }
}

fn move_character(args: &MoveCharacter) -> Result<String, String> {
    require("character_name", &args.character_name)?;
    require("location", &args.location)?;

    Ok(format!(
        "SIMULATION ACTION: {} is moving to {}.",
        args.character_name.trim(),
        args.location.trim()
    ))
}

fn speak_to_character(args: &SpeakToCharacter) -> Result<String, String> {
    require("speaking_character", &args.speaking_character)?;
    require("target_character", &args.target_character)?;

    Ok(format!(
        "SIMULATION ACTION: {} says to {}: '{}'",
        args.speaking_character.trim(),
        args.target_character.trim(),
        args.message
    ))
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("'{field}' must not be empty"))
    } else {
        Ok(())
    }
}
