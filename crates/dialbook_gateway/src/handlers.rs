// --- File: crates/dialbook_gateway/src/handlers.rs ---
//! The single gateway handler: every inbound request lands here, gets an
//! action resolved, and is executed against whichever providers are wired
//! in. Per-action helpers stay small; the interesting logic lives in the
//! `booking` and `webhook` modules.

use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use dialbook_common::error::{internal_error, validation_error, GatewayError};
use dialbook_common::http::{preflight_handler, IntoHttpResponse};
use dialbook_common::services::{
    CallRecord, OutboundCallRequest, ScheduleContext, SchedulingService, ServiceError, SlotQuery,
    VoiceService,
};
use dialbook_config::AppConfig;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::booking::{self, BookingOutcome};
use crate::dispatch::{resolve, ActionKind, InboundRequest};
use crate::respond;
use crate::webhook::{self, WebhookEvent};

/// Shared state handed to the gateway router.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<AppConfig>,
    pub scheduling: Option<Arc<dyn SchedulingService>>,
    pub voice: Option<Arc<dyn VoiceService>>,
}

impl GatewayState {
    fn scheduling(&self) -> Result<&dyn SchedulingService, GatewayError> {
        self.scheduling
            .as_deref()
            .ok_or_else(|| internal_error("scheduling provider is not configured"))
    }

    fn voice(&self) -> Result<&dyn VoiceService, GatewayError> {
        self.voice
            .as_deref()
            .ok_or_else(|| internal_error("voice provider is not configured"))
    }
}

/// What an action produced. Booking outcomes carry their own status
/// mapping; everything else is plain data.
enum ActionOutput {
    Booking(BookingOutcome),
    Data(Value),
}

/// Entry point for every route. Resolves the action and runs it.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    if method == Method::OPTIONS {
        return preflight_handler().await.into_response();
    }
    if method != Method::GET && method != Method::POST {
        return respond::http_response(
            405,
            json!({"success": false, "error": "method not allowed"}),
        );
    }

    let request = InboundRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query_params: serde_urlencoded::from_str::<HashMap<String, String>>(
            uri.query().unwrap_or(""),
        )
        .unwrap_or_default(),
        headers: headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        raw_body: (!body.is_empty()).then(|| body.clone()),
    };

    let resolved = match resolve(&request) {
        Ok(resolved) => resolved,
        Err(e) => return e.into_http_response(),
    };
    let request_id = uuid::Uuid::new_v4();
    info!(
        "[{}] Handling action {} for {}",
        request_id,
        resolved.action.as_str(),
        uri.path()
    );

    if resolved.action == ActionKind::HandleVapiWebhook {
        return handle_webhook(&state, request.raw_body.as_deref()).await;
    }

    match run_action(&state, resolved.action, &resolved.params).await {
        Ok(ActionOutput::Booking(outcome)) => respond::booking_http_response(&outcome),
        Ok(ActionOutput::Data(value)) => respond::http_response(200, value),
        Err(e) => e.into_http_response(),
    }
}

/// Executes one resolved non-webhook action against the providers.
async fn run_action(
    state: &GatewayState,
    action: ActionKind,
    params: &Map<String, Value>,
) -> Result<ActionOutput, GatewayError> {
    let ctx = schedule_context(params);
    match action {
        ActionKind::CreateBooking => booking::create_booking(
            state.scheduling()?,
            &ctx,
            &state.config.gateway,
            params,
        )
        .await
        .map(ActionOutput::Booking),
        ActionKind::RescheduleBooking => booking::reschedule_booking(
            state.scheduling()?,
            &ctx,
            &state.config.gateway,
            params,
        )
        .await
        .map(ActionOutput::Booking),
        ActionKind::CancelBooking => {
            let booking_id = require_param(params, "bookingId")?;
            let reason = param_str(params, "reason");
            let booking = state
                .scheduling()?
                .cancel_booking(&ctx, booking_id, reason)
                .await?;
            info!("Booking {} cancelled", booking_id);
            Ok(ActionOutput::Data(
                json!({"success": true, "booking": booking}),
            ))
        }
        ActionKind::GetBookingDetails => {
            let booking_id = require_param(params, "bookingId")?;
            let booking = state.scheduling()?.get_booking(&ctx, booking_id).await?;
            Ok(ActionOutput::Data(
                json!({"success": true, "booking": booking}),
            ))
        }
        ActionKind::GetAvailableSlots => {
            let tz = resolve_time_zone(state, params)?;
            let start = parse_date_param(params, "startDate", tz)?;
            let end = parse_date_param(params, "endDate", tz)? + Duration::days(1);
            let slots = query_slots(state, &ctx, start, end, tz).await?;
            Ok(ActionOutput::Data(json!({"success": true, "slots": slots})))
        }
        ActionKind::CheckAvailability => {
            let tz = resolve_time_zone(state, params)?;
            let start = parse_date_param(params, "startDate", tz)?;
            // Without an explicit end the check covers the following week.
            let end = match param_str(params, "endDate") {
                Some(_) => parse_date_param(params, "endDate", tz)? + Duration::days(1),
                None => start + Duration::days(7),
            };
            let slots = query_slots(state, &ctx, start, end, tz).await?;
            Ok(ActionOutput::Data(json!({
                "success": true,
                "available": !slots.is_empty(),
                "slots": slots,
            })))
        }
        ActionKind::FindAvailability => {
            let tz = resolve_time_zone(state, params)?;
            let now = Utc::now().with_timezone(&tz);
            let slots = query_slots(state, &ctx, now, now + Duration::days(7), tz).await?;
            let next: Vec<_> = slots
                .into_iter()
                .take(state.config.gateway.max_alternatives)
                .collect();
            Ok(ActionOutput::Data(json!({"success": true, "slots": next})))
        }
        ActionKind::InitializeAssistant => {
            let phone = require_param(params, "phoneNumber")?;
            let call = place_outbound_call(
                state.voice()?,
                OutboundCallRequest {
                    phone_number: phone.to_string(),
                    assistant_id: param_str(params, "assistantId").map(String::from),
                    metadata: params.get("metadata").cloned(),
                },
            )
            .await?;
            Ok(ActionOutput::Data(json!({"success": true, "call": call})))
        }
        ActionKind::TrialStarted => {
            let phone = require_param(params, "phoneNumber")?;
            if !is_plausible_phone_number(phone) {
                return Err(validation_error("phoneNumber"));
            }
            // Signup details ride along on the call for the assistant.
            let mut metadata = Map::new();
            metadata.insert("source".to_string(), json!("trial"));
            for key in ["name", "email"] {
                if let Some(value) = param_str(params, key) {
                    metadata.insert(key.to_string(), json!(value));
                }
            }
            let call = place_outbound_call(
                state.voice()?,
                OutboundCallRequest {
                    phone_number: phone.to_string(),
                    assistant_id: param_str(params, "assistantId").map(String::from),
                    metadata: Some(Value::Object(metadata)),
                },
            )
            .await?;
            info!("Trial welcome call {} placed to {}", call.id, phone);
            Ok(ActionOutput::Data(json!({"success": true, "call": call})))
        }
        // Webhooks never reach run_action; the entry handler splits them off.
        ActionKind::HandleVapiWebhook => Err(internal_error("webhook routed as plain action")),
    }
}

/// Normalizes a voice webhook and routes its function to the matching
/// action. Everything that goes back to the platform is wrapped in the
/// function-response envelope at HTTP 200; the one exception is an
/// unrecognized tool name, which is a client error.
async fn handle_webhook(state: &GatewayState, raw_body: Option<&str>) -> Response {
    let payload: Value = raw_body
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null);

    match webhook::normalize(&payload) {
        WebhookEvent::FunctionCall {
            name,
            parameters,
            call_id,
        } => {
            debug!(
                "Webhook function '{}' (call {})",
                name,
                call_id.as_deref().unwrap_or("-")
            );
            match ActionKind::parse(&name).filter(|a| *a != ActionKind::HandleVapiWebhook) {
                Some(action) => match run_action(state, action, &parameters).await {
                    Ok(ActionOutput::Booking(outcome)) => {
                        respond::voice_booking_response(&name, &outcome)
                    }
                    Ok(ActionOutput::Data(value)) => respond::voice_success(&name, value),
                    Err(e) => respond::voice_error(&name, &e),
                },
                None => {
                    warn!("Webhook names unknown function '{}'", name);
                    respond::voice_error(&name, &validation_error("function"))
                }
            }
        }
        WebhookEvent::ToolCall {
            tool, parameters, ..
        } => {
            if tool != "booking" {
                warn!("Webhook names unsupported tool '{}'", tool);
                return validation_error("tool").into_http_response();
            }
            match run_action(state, ActionKind::CreateBooking, &parameters).await {
                Ok(ActionOutput::Booking(outcome)) => {
                    respond::voice_booking_response(&tool, &outcome)
                }
                Ok(ActionOutput::Data(value)) => respond::voice_success(&tool, value),
                Err(e) => respond::voice_error(&tool, &e),
            }
        }
        WebhookEvent::Passthrough { event_type } => {
            debug!("Acknowledging passthrough event '{}'", event_type);
            respond::voice_ack(&event_type)
        }
    }
}

/// Tries the SIP trunk first, then falls back to a plain call. Each path is
/// attempted exactly once.
async fn place_outbound_call(
    voice: &dyn VoiceService,
    request: OutboundCallRequest,
) -> Result<CallRecord, ServiceError> {
    match voice.create_sip_call(request.clone()).await {
        Ok(call) => Ok(call),
        Err(e) => {
            warn!("SIP call failed ({}); falling back to a plain call", e);
            voice.create_call(request).await
        }
    }
}

fn schedule_context(params: &Map<String, Value>) -> ScheduleContext {
    ScheduleContext {
        api_key_override: param_str(params, "apiKey").map(String::from),
        event_type_id_override: param_str(params, "eventTypeId").map(String::from),
    }
}

fn param_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn require_param<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, GatewayError> {
    param_str(params, key).ok_or_else(|| validation_error(key))
}

fn resolve_time_zone(state: &GatewayState, params: &Map<String, Value>) -> Result<Tz, GatewayError> {
    let raw = param_str(params, "timeZone")
        .or_else(|| {
            state
                .config
                .schedule
                .as_ref()
                .and_then(|s| s.time_zone.as_deref())
        })
        .unwrap_or("UTC");
    raw.parse::<Tz>().map_err(|_| validation_error("timeZone"))
}

/// Accepts `YYYY-MM-DD` (start of day in the caller's zone) or a full
/// RFC 3339 timestamp.
fn parse_date_param(
    params: &Map<String, Value>,
    key: &str,
    tz: Tz,
) -> Result<DateTime<Tz>, GatewayError> {
    let raw = require_param(params, key)?;
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(start) = tz
            .from_local_datetime(&date.and_time(chrono::NaiveTime::MIN))
            .earliest()
        {
            return Ok(start);
        }
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&tz));
    }
    warn!("Unparseable {} value '{}'", key, raw);
    Err(validation_error(key))
}

async fn query_slots(
    state: &GatewayState,
    ctx: &ScheduleContext,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    tz: Tz,
) -> Result<Vec<dialbook_common::services::AvailabilitySlot>, GatewayError> {
    let query = SlotQuery {
        start: start.with_timezone(&Utc),
        end: end.with_timezone(&Utc),
        time_zone: tz.name().to_string(),
    };
    Ok(state.scheduling()?.get_available_slots(ctx, query).await?)
}

/// E.164-ish sanity check: leading `+`, then 7 to 15 digits.
fn is_plausible_phone_number(raw: &str) -> bool {
    let Some(digits) = raw.strip_prefix('+') else {
        return false;
    };
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::is_plausible_phone_number;

    #[test]
    fn phone_number_validation() {
        assert!(is_plausible_phone_number("+41791234567"));
        assert!(!is_plausible_phone_number("0791234567"));
        assert!(!is_plausible_phone_number("+41 79 123"));
        assert!(!is_plausible_phone_number("+123"));
    }
}
