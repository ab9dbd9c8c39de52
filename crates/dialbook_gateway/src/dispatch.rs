// --- File: crates/dialbook_gateway/src/dispatch.rs ---
//! Action resolution: turning one ambiguous inbound request into exactly one
//! canonical action.
//!
//! Different callers place their intent in different places. The web front
//! end uses `?action=`, some integrations hit a dedicated path, and the voice
//! platform posts webhooks with no action marker at all. Resolution follows a
//! fixed precedence order, and unrecognized paths deliberately fall back to
//! the webhook action rather than erroring: voice platforms retry failed
//! callbacks aggressively and the payload itself tells us what to do.

use dialbook_common::error::{validation_error, GatewayError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Closed set of operations the gateway performs. Resolution must yield
/// exactly one member or fail with a validation error naming `action`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    #[serde(rename = "createBooking")]
    CreateBooking,
    #[serde(rename = "getAvailableSlots")]
    GetAvailableSlots,
    #[serde(rename = "rescheduleBooking")]
    RescheduleBooking,
    #[serde(rename = "cancelBooking")]
    CancelBooking,
    #[serde(rename = "getBookingDetails")]
    GetBookingDetails,
    #[serde(rename = "checkAvailability")]
    CheckAvailability,
    #[serde(rename = "findAvailability")]
    FindAvailability,
    #[serde(rename = "handleVapiWebhook")]
    HandleVapiWebhook,
    #[serde(rename = "initializeAssistant")]
    InitializeAssistant,
    #[serde(rename = "trialStarted")]
    TrialStarted,
}

impl ActionKind {
    pub const ALL: [ActionKind; 10] = [
        ActionKind::CreateBooking,
        ActionKind::GetAvailableSlots,
        ActionKind::RescheduleBooking,
        ActionKind::CancelBooking,
        ActionKind::GetBookingDetails,
        ActionKind::CheckAvailability,
        ActionKind::FindAvailability,
        ActionKind::HandleVapiWebhook,
        ActionKind::InitializeAssistant,
        ActionKind::TrialStarted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::CreateBooking => "createBooking",
            ActionKind::GetAvailableSlots => "getAvailableSlots",
            ActionKind::RescheduleBooking => "rescheduleBooking",
            ActionKind::CancelBooking => "cancelBooking",
            ActionKind::GetBookingDetails => "getBookingDetails",
            ActionKind::CheckAvailability => "checkAvailability",
            ActionKind::FindAvailability => "findAvailability",
            ActionKind::HandleVapiWebhook => "handleVapiWebhook",
            ActionKind::InitializeAssistant => "initializeAssistant",
            ActionKind::TrialStarted => "trialStarted",
        }
    }

    pub fn parse(value: &str) -> Option<ActionKind> {
        ActionKind::ALL.iter().copied().find(|a| a.as_str() == value)
    }
}

/// One inbound HTTP call, stripped to what resolution needs. Ephemeral,
/// built and discarded per request.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub query_params: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub raw_body: Option<String>,
}

/// The resolved action plus the merged parameter map. Body fields win over
/// query parameters; query fills only keys the body left unset.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: ActionKind,
    pub params: Map<String, Value>,
}

/// Parses the raw body as a JSON object. Malformed JSON and non-object
/// bodies are cosmetic input noise, recovered as an empty object.
fn parse_body(raw_body: Option<&str>) -> Map<String, Value> {
    let Some(raw) = raw_body.filter(|b| !b.trim().is_empty()) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!("Ignoring non-object JSON body of type {}", value_kind(&other));
            Map::new()
        }
        Err(e) => {
            warn!("Ignoring malformed JSON body: {}", e);
            Map::new()
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn last_path_segment(path: &str) -> Option<&str> {
    path.trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}

/// Resolves a canonical action from the inbound request.
///
/// Resolution order, first match wins:
/// 1. Last path segment equals `createBooking`.
/// 2. Non-empty `action` query parameter, taken verbatim.
/// 3. Last path segment is itself a known action.
/// 4. Any other non-empty path segment: treat as a voice webhook callback.
/// 5. An `action` field in the body.
/// 6. Default: an unannotated POST is assumed to be a voice webhook.
///
/// Pure function of the request; no side effects.
pub fn resolve(request: &InboundRequest) -> Result<ActionRequest, GatewayError> {
    let body = parse_body(request.raw_body.as_deref());
    let segment = last_path_segment(&request.path);

    let action_name: String = if segment == Some("createBooking") {
        "createBooking".to_string()
    } else if let Some(action) = request
        .query_params
        .get("action")
        .filter(|value| !value.is_empty())
    {
        action.clone()
    } else if let Some(segment) = segment.filter(|s| ActionKind::parse(s).is_some()) {
        segment.to_string()
    } else if segment.is_some() {
        "handleVapiWebhook".to_string()
    } else if let Some(action) = body.get("action").and_then(Value::as_str) {
        action.to_string()
    } else {
        "handleVapiWebhook".to_string()
    };

    let action = ActionKind::parse(&action_name).ok_or_else(|| {
        warn!("Rejecting unknown action '{}'", action_name);
        validation_error("action")
    })?;
    debug!("Resolved action {} for path {}", action.as_str(), request.path);

    // Body fields are the highest-priority data source; query parameters
    // fill in only what the body left unset.
    let mut params = body;
    for (key, value) in &request.query_params {
        if !params.contains_key(key) {
            params.insert(key.clone(), Value::String(value.clone()));
        }
    }
    params
        .entry("action".to_string())
        .or_insert_with(|| Value::String(action.as_str().to_string()));

    Ok(ActionRequest { action, params })
}
