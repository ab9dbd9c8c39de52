// --- File: crates/dialbook_gateway/src/webhook.rs ---
//! Webhook normalization: the voice platform delivers several payload shapes
//! (direct function call, nested function-call, tool call, transcript and
//! status events). One function flattens them into a single discriminated
//! union so the dispatcher can pattern-match exhaustively instead of probing
//! optional fields at every call site.

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Normalized voice-platform event.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    /// `type` is `function` or `function-call`: the assistant invoked a
    /// named function with parameters.
    FunctionCall {
        name: String,
        parameters: Map<String, Value>,
        call_id: Option<String>,
    },
    /// `type` is `tool`: a tool invocation. Only the `booking` tool is
    /// recognized downstream.
    ToolCall {
        tool: String,
        parameters: Map<String, Value>,
        call_id: Option<String>,
        tool_call_id: Option<String>,
    },
    /// Transcript, call-ended, status-update and any unrecognized type:
    /// carries no business action, acknowledged generically.
    Passthrough { event_type: String },
}

fn string_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str()
}

fn object_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Map<String, Value>> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_object()
}

/// Call id lives in different places depending on how the platform wrapped
/// the event.
fn extract_call_id(payload: &Value) -> Option<String> {
    string_at(payload, &["callId"])
        .or_else(|| string_at(payload, &["call", "id"]))
        .or_else(|| string_at(payload, &["message", "call", "id"]))
        .map(String::from)
}

/// Decodes stringified function arguments. A decode failure is logged and
/// yields empty parameters; the call itself still proceeds.
fn decode_arguments(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("Function arguments decoded to a non-object; treating as empty");
            Map::new()
        }
        Err(e) => {
            warn!("Failed to decode function arguments: {}", e);
            Map::new()
        }
    }
}

fn function_parameters(payload: &Value) -> Map<String, Value> {
    if let Some(params) = object_at(payload, &["parameters"]) {
        return params.clone();
    }
    if let Some(params) = object_at(payload, &["functionCall", "parameters"]) {
        return params.clone();
    }
    if let Some(raw) = string_at(payload, &["functionCall", "arguments"]) {
        return decode_arguments(raw);
    }
    Map::new()
}

fn tool_call(payload: &Value, call_id: Option<String>) -> WebhookEvent {
    // Newer payloads carry an array of tool calls; older ones a flat shape.
    if let Some(first) = payload
        .get("toolCalls")
        .and_then(Value::as_array)
        .and_then(|calls| calls.first())
    {
        let tool = string_at(first, &["function", "name"])
            .unwrap_or_default()
            .to_string();
        let parameters = object_at(first, &["function", "arguments"])
            .cloned()
            .or_else(|| {
                string_at(first, &["function", "arguments"]).map(decode_arguments)
            })
            .unwrap_or_default();
        return WebhookEvent::ToolCall {
            tool,
            parameters,
            call_id,
            tool_call_id: string_at(first, &["id"]).map(String::from),
        };
    }
    WebhookEvent::ToolCall {
        tool: string_at(payload, &["tool"]).unwrap_or_default().to_string(),
        parameters: object_at(payload, &["parameters"]).cloned().unwrap_or_default(),
        call_id,
        tool_call_id: None,
    }
}

/// Flattens a raw voice-platform payload into a `WebhookEvent`.
///
/// Events wrapped in a `message` envelope are unwrapped first; the call id
/// is probed across both the envelope and the inner payload.
pub fn normalize(raw: &Value) -> WebhookEvent {
    let call_id = extract_call_id(raw);
    // The platform sometimes wraps the event under `message`.
    let payload = if raw.get("type").is_none() && raw.get("message").map_or(false, Value::is_object)
    {
        &raw["message"]
    } else {
        raw
    };

    let event_type = string_at(payload, &["type"]).unwrap_or("").to_string();
    debug!("Normalizing webhook event of type '{}'", event_type);

    match event_type.as_str() {
        "function" | "function-call" => {
            let name = string_at(payload, &["function"])
                .or_else(|| string_at(payload, &["functionCall", "name"]))
                .unwrap_or_default()
                .to_string();
            WebhookEvent::FunctionCall {
                name,
                parameters: function_parameters(payload),
                call_id,
            }
        }
        "tool" => tool_call(payload, call_id),
        other => WebhookEvent::Passthrough {
            event_type: if other.is_empty() {
                "unknown".to_string()
            } else {
                other.to_string()
            },
        },
    }
}
