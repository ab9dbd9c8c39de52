// --- File: crates/dialbook_schedule/src/models.rs ---
//! Wire types for the scheduling provider API. Only the fields the gateway
//! consumes or produces are modelled; everything else rides along untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry in the availability response.
#[derive(Deserialize, Debug, Clone)]
pub struct SlotEntry {
    /// ISO 8601 timestamp of the bookable instant.
    pub time: String,
}

/// Availability response: slots grouped by calendar day, each day's list
/// ordered ascending by the provider.
#[derive(Deserialize, Debug, Default)]
pub struct SlotsResponse {
    #[serde(default)]
    pub slots: BTreeMap<String, Vec<SlotEntry>>,
}

/// Attendee answers submitted with a booking.
#[derive(Serialize, Debug, Clone)]
pub struct BookingResponses {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Payload for POST /bookings.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    pub event_type_id: String,
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub responses: BookingResponses,
    pub time_zone: String,
    pub language: String,
    pub metadata: serde_json::Value,
}

/// Payload for rescheduling an existing booking.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleBookingPayload {
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub time_zone: String,
}

/// Booking record as returned by the provider. Ids arrive as numbers or
/// strings depending on the endpoint, hence the untagged helper.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: BookingId,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum BookingId {
    Number(i64),
    Text(String),
}

impl BookingId {
    pub fn as_string(&self) -> String {
        match self {
            BookingId::Number(n) => n.to_string(),
            BookingId::Text(s) => s.clone(),
        }
    }
}

/// Some endpoints wrap the booking in `{ "booking": {...} }`.
#[derive(Deserialize, Debug)]
pub struct BookingEnvelope {
    pub booking: BookingRecord,
}

/// Error body shape used by the provider.
#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self, fallback: &str) -> String {
        self.message
            .or(self.error)
            .unwrap_or_else(|| fallback.to_string())
    }
}
