// --- File: crates/dialbook_common/src/services.rs ---
//! Service abstractions for external providers.
//!
//! Trait definitions for the scheduling provider and the voice platform.
//! They decouple the gateway pipeline from concrete HTTP clients, which
//! keeps the orchestrator testable with mocked providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Why a provider call failed. The orchestrator branches on this, so the
/// classification lives with the client that understands the provider's
/// error bodies, not in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Requested time already booked or otherwise unbookable.
    Conflict,
    /// Referenced resource (booking id, call id) does not exist upstream.
    NotFound,
    /// Credentials rejected.
    Auth,
    /// Any other provider-side or transport failure.
    Upstream,
}

/// Error returned by provider service operations.
#[derive(Debug, Clone, Error)]
#[error("{service} error: {message}")]
pub struct ServiceError {
    pub service: &'static str,
    pub kind: ServiceErrorKind,
    /// HTTP status from the provider when the failure came from a response.
    pub status: Option<u16>,
    pub message: String,
}

impl ServiceError {
    pub fn upstream(service: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        ServiceError {
            service,
            kind: ServiceErrorKind::Upstream,
            status,
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == ServiceErrorKind::Conflict
    }
}

impl From<ServiceError> for crate::error::GatewayError {
    fn from(err: ServiceError) -> Self {
        match err.kind {
            ServiceErrorKind::Conflict => crate::error::GatewayError::Conflict(err.message),
            ServiceErrorKind::NotFound => crate::error::GatewayError::NotFound {
                resource: err.message,
            },
            ServiceErrorKind::Auth => crate::error::GatewayError::Auth(err.message),
            ServiceErrorKind::Upstream => crate::error::GatewayError::ExternalService {
                service: err.service.to_string(),
                message: err.message,
                status: err.status,
            },
        }
    }
}

/// Per-request overrides for scheduling calls.
///
/// Callers may supply their own API key or event type; those values are
/// scoped to the single request and never written back into shared config,
/// so concurrent requests with different keys cannot interfere.
#[derive(Debug, Clone, Default)]
pub struct ScheduleContext {
    pub api_key_override: Option<String>,
    pub event_type_id_override: Option<String>,
}

/// One bookable instant, as returned by the availability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub time: DateTime<Utc>,
}

/// Availability query window.
#[derive(Debug, Clone)]
pub struct SlotQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: String,
}

/// Who the booking is for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Fields submitted to the provider when creating a booking.
#[derive(Debug, Clone)]
pub struct BookingFields {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub time_zone: String,
    pub attendee: Attendee,
    pub language: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Booking record as consumed from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderBooking {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// A trait for scheduling provider operations.
pub trait SchedulingService: Send + Sync {
    /// Query available instants within a window, ascending by time.
    fn get_available_slots(
        &self,
        ctx: &ScheduleContext,
        query: SlotQuery,
    ) -> BoxFuture<'_, Vec<AvailabilitySlot>, ServiceError>;

    /// Create a booking.
    fn create_booking(
        &self,
        ctx: &ScheduleContext,
        fields: BookingFields,
    ) -> BoxFuture<'_, ProviderBooking, ServiceError>;

    /// Move an existing booking to a new start time.
    fn reschedule_booking(
        &self,
        ctx: &ScheduleContext,
        booking_id: &str,
        new_start: DateTime<Utc>,
        new_end: Option<DateTime<Utc>>,
        time_zone: &str,
    ) -> BoxFuture<'_, ProviderBooking, ServiceError>;

    /// Cancel a booking with an optional reason.
    fn cancel_booking(
        &self,
        ctx: &ScheduleContext,
        booking_id: &str,
        reason: Option<&str>,
    ) -> BoxFuture<'_, ProviderBooking, ServiceError>;

    /// Fetch a booking by id.
    fn get_booking(
        &self,
        ctx: &ScheduleContext,
        booking_id: &str,
    ) -> BoxFuture<'_, ProviderBooking, ServiceError>;
}

/// Request to place an outbound call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundCallRequest {
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Call record as consumed from the voice platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: String,
    pub status: String,
    /// Which transport the call went out on ("sip" or "pstn").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
}

/// A trait for voice platform operations.
pub trait VoiceService: Send + Sync {
    /// Place a plain outbound call.
    fn create_call(&self, request: OutboundCallRequest) -> BoxFuture<'_, CallRecord, ServiceError>;

    /// Place an outbound call over the SIP trunk.
    fn create_sip_call(
        &self,
        request: OutboundCallRequest,
    ) -> BoxFuture<'_, CallRecord, ServiceError>;

    /// Send a message or function response into an active call.
    fn send_message(
        &self,
        call_id: &str,
        payload: serde_json::Value,
    ) -> BoxFuture<'_, (), ServiceError>;

    /// Fetch a call by id.
    fn get_call(&self, call_id: &str) -> BoxFuture<'_, CallRecord, ServiceError>;

    /// Hang up an active call.
    fn end_call(&self, call_id: &str) -> BoxFuture<'_, (), ServiceError>;
}

/// A factory for creating service instances.
///
/// Used by the backend to hand the gateway whatever providers are enabled
/// by runtime configuration.
pub trait ServiceFactory: Send + Sync {
    /// Get a scheduling service instance, if enabled.
    fn scheduling_service(&self) -> Option<Arc<dyn SchedulingService>>;

    /// Get a voice service instance, if enabled.
    fn voice_service(&self) -> Option<Arc<dyn VoiceService>>;
}
