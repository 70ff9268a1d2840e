use serde_json::Value;

use crate::engine::protocol::StepError;
use crate::model::capability::{CapabilityCall, CapabilityKind};
use crate::model::message::ToolCall;

/// Decode a raw tool call from the model into a dispatchable call.
///
/// The argument payload must be a JSON object, and the name must be one of
/// the fixed capabilities. Field-level validation happens when the handler
/// runs.
pub fn decode_tool_call(call: &ToolCall) -> Result<CapabilityCall, StepError> {
    let name = call.name();

    let arguments: Value =
        serde_json::from_str(&call.function.arguments).map_err(|e| StepError::ArgumentParse {
            tool: name.to_string(),
            reason: e.to_string(),
        })?;

    if !arguments.is_object() {
        return Err(StepError::ArgumentParse {
            tool: name.to_string(),
            reason: "arguments must be a JSON object".to_string(),
        });
    }

    let Some(kind) = CapabilityKind::from_name(name) else {
        return Err(StepError::UnknownTool(name.to_string()));
    };

    Ok(CapabilityCall {
        id: call.id.clone(),
        kind,
        arguments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_call() {
        let call = ToolCall::function(
            "call_1",
            "move_character",
            r#"{"character_name":"Elara","location":"Market"}"#,
        );
        let decoded = decode_tool_call(&call).unwrap();
        assert_eq!(decoded.kind, CapabilityKind::MoveCharacter);
        assert_eq!(decoded.id, "call_1");
        assert_eq!(decoded.arguments["location"], "Market");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let call = ToolCall::function("call_1", "move_character", "{character_name: Elara");
        assert!(matches!(
            decode_tool_call(&call),
            Err(StepError::ArgumentParse { .. })
        ));
    }

    #[test]
    fn non_object_payload_is_a_parse_error() {
        let call = ToolCall::function("call_1", "move_character", "[1, 2]");
        assert!(matches!(
            decode_tool_call(&call),
            Err(StepError::ArgumentParse { .. })
        ));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let call = ToolCall::function("call_1", "teleport_character", "{}");
        assert_eq!(
            decode_tool_call(&call),
            Err(StepError::UnknownTool("teleport_character".into()))
        );
    }

    #[test]
    fn parse_failure_wins_over_unknown_name() {
        let call = ToolCall::function("call_1", "teleport_character", "not json");
        assert!(matches!(
            decode_tool_call(&call),
            Err(StepError::ArgumentParse { .. })
        ));
    }
}
