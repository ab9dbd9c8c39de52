// --- File: crates/dialbook_gateway/src/respond.rs ---
//! Response formatting: the same internal result goes out in two shapes.
//!
//! HTTP callers get a plain JSON body with a real status code. The voice
//! platform insists on HTTP 200 for every webhook reply, logical errors
//! included, and reads the result from a `function_response` envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dialbook_common::error::{GatewayError, HttpStatusCode};
use dialbook_common::http::with_cors;
use serde_json::{json, Value};

use crate::booking::BookingOutcome;

/// Plain HTTP response: real status code, CORS headers, JSON body.
pub fn http_response(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    with_cors((status, Json(body)).into_response())
}

/// A booking outcome for an HTTP caller: 200 on success, 409 on conflict.
pub fn booking_http_response(outcome: &BookingOutcome) -> Response {
    let status = outcome.http_status();
    let body = serde_json::to_value(outcome).unwrap_or_else(|_| json!({"success": false}));
    http_response(status, body)
}

/// Wraps a successful function result in the voice envelope. Always 200.
pub fn voice_success(function_name: &str, result: Value) -> Response {
    voice_envelope(json!({
        "name": function_name,
        "response": result,
    }))
}

/// Wraps a failure in the voice envelope. The status stays 200 because the
/// platform treats anything else as a delivery failure and retries; the
/// logical error travels in the body for the assistant to read out.
pub fn voice_error(function_name: &str, error: &GatewayError) -> Response {
    voice_envelope(json!({
        "name": function_name,
        "error": {
            "message": error.to_string(),
            "type": error.error_type(),
            "statusCode": error.status_code(),
        },
    }))
}

/// A booking outcome for the voice caller. Conflicts keep the alternatives
/// and message inside `response` so the assistant can offer them aloud.
pub fn voice_booking_response(function_name: &str, outcome: &BookingOutcome) -> Response {
    let result = serde_json::to_value(outcome).unwrap_or_else(|_| json!({"success": false}));
    voice_success(function_name, result)
}

/// Generic acknowledgment for passthrough webhook events.
pub fn voice_ack(event_type: &str) -> Response {
    http_response(
        200,
        json!({"success": true, "received": event_type}),
    )
}

fn voice_envelope(function_response: Value) -> Response {
    http_response(
        200,
        json!({
            "response": {
                "type": "function_response",
                "function_response": function_response,
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use dialbook_common::error::validation_error;
    use dialbook_common::services::AvailabilitySlot;

    fn conflict_outcome() -> BookingOutcome {
        BookingOutcome {
            success: false,
            booking: None,
            alternative_slots: Some(vec![AvailabilitySlot {
                time: "2026-06-16T10:00:00Z".parse::<DateTime<Utc>>().unwrap(),
            }]),
            date_adjusted: false,
            original_start_time: None,
            adjusted_start_time: None,
            message: "not available".to_string(),
        }
    }

    #[test]
    fn http_conflict_uses_409() {
        let response = booking_http_response(&conflict_outcome());
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(
            response
                .headers()
                .get("Access-Control-Allow-Origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[test]
    fn voice_conflict_stays_200_and_keeps_alternatives() {
        let response = voice_booking_response("createBooking", &conflict_outcome());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn voice_error_stays_200() {
        let response = voice_error("createBooking", &validation_error("startTime"));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
