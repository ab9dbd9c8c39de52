#[cfg(test)]
mod tests {
    use crate::webhook::{normalize, WebhookEvent};
    use serde_json::json;

    #[test]
    fn direct_function_shape_is_normalized() {
        let raw = json!({
            "type": "function",
            "function": "createBooking",
            "parameters": {"name": "Ada", "email": "ada@example.com"},
            "callId": "call-1"
        });
        let event = normalize(&raw);
        match event {
            WebhookEvent::FunctionCall {
                name,
                parameters,
                call_id,
            } => {
                assert_eq!(name, "createBooking");
                assert_eq!(parameters["name"], json!("Ada"));
                assert_eq!(call_id.as_deref(), Some("call-1"));
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn nested_function_call_with_string_arguments_is_decoded() {
        let raw = json!({
            "type": "function-call",
            "functionCall": {
                "name": "checkAvailability",
                "arguments": "{\"startDate\":\"2024-05-01\"}"
            },
            "call": {"id": "call-2"}
        });
        match normalize(&raw) {
            WebhookEvent::FunctionCall {
                name,
                parameters,
                call_id,
            } => {
                assert_eq!(name, "checkAvailability");
                assert_eq!(parameters["startDate"], json!("2024-05-01"));
                assert_eq!(call_id.as_deref(), Some("call-2"));
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn undecodable_arguments_yield_empty_parameters() {
        let raw = json!({
            "type": "function-call",
            "functionCall": {"name": "createBooking", "arguments": "{broken"}
        });
        match normalize(&raw) {
            WebhookEvent::FunctionCall { parameters, .. } => {
                assert!(parameters.is_empty());
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn message_envelope_is_unwrapped() {
        let raw = json!({
            "message": {
                "type": "function",
                "function": "createBooking",
                "parameters": {"name": "Ada"},
                "call": {"id": "call-3"}
            }
        });
        match normalize(&raw) {
            WebhookEvent::FunctionCall { name, call_id, .. } => {
                assert_eq!(name, "createBooking");
                assert_eq!(call_id.as_deref(), Some("call-3"));
            }
            other => panic!("expected function call, got {:?}", other),
        }
    }

    #[test]
    fn tool_calls_array_takes_first_entry() {
        let raw = json!({
            "type": "tool",
            "toolCalls": [{
                "id": "tc-1",
                "function": {
                    "name": "booking",
                    "arguments": {"startTime": "2024-05-01T10:00:00Z"}
                }
            }],
            "callId": "call-4"
        });
        match normalize(&raw) {
            WebhookEvent::ToolCall {
                tool,
                parameters,
                call_id,
                tool_call_id,
            } => {
                assert_eq!(tool, "booking");
                assert_eq!(parameters["startTime"], json!("2024-05-01T10:00:00Z"));
                assert_eq!(call_id.as_deref(), Some("call-4"));
                assert_eq!(tool_call_id.as_deref(), Some("tc-1"));
            }
            other => panic!("expected tool call, got {:?}", other),
        }
    }

    #[test]
    fn flat_tool_shape_is_supported() {
        let raw = json!({
            "type": "tool",
            "tool": "booking",
            "parameters": {"name": "Ada"}
        });
        match normalize(&raw) {
            WebhookEvent::ToolCall {
                tool, tool_call_id, ..
            } => {
                assert_eq!(tool, "booking");
                assert!(tool_call_id.is_none());
            }
            other => panic!("expected tool call, got {:?}", other),
        }
    }

    #[test]
    fn transcript_and_status_events_pass_through() {
        for event_type in ["transcript", "call_ended", "status-update"] {
            let raw = json!({"type": event_type});
            assert_eq!(
                normalize(&raw),
                WebhookEvent::Passthrough {
                    event_type: event_type.to_string()
                }
            );
        }
    }

    #[test]
    fn typeless_payload_passes_through_as_unknown() {
        let raw = json!({"something": "else"});
        assert_eq!(
            normalize(&raw),
            WebhookEvent::Passthrough {
                event_type: "unknown".to_string()
            }
        );
    }
}
