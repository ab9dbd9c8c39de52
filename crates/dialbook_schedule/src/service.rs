// --- File: crates/dialbook_schedule/src/service.rs ---
//! HTTP client for the scheduling provider, plus the `SchedulingService`
//! implementation the gateway consumes.

use chrono::{DateTime, Utc};
use dialbook_common::services::{
    AvailabilitySlot, BookingFields, BoxFuture, ProviderBooking, ScheduleContext, SchedulingService,
    ServiceError, SlotQuery,
};
use dialbook_common::HTTP_CLIENT;
use dialbook_config::ScheduleConfig;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::error::ScheduleError;
use crate::models::{
    ApiErrorBody, BookingEnvelope, BookingRecord, BookingResponses, CreateBookingPayload,
    RescheduleBookingPayload, SlotsResponse,
};

/// Client for the scheduling provider's REST API.
///
/// Holds process-wide defaults (API key, event type). Per-request overrides
/// arrive through `ScheduleContext` and are read-only here: nothing a single
/// request supplies is ever written back into this struct.
#[derive(Clone)]
pub struct ScheduleClient {
    http: Client,
    base_url: String,
    api_key: String,
    default_event_type_id: Option<String>,
    default_time_zone: String,
    language: String,
}

impl ScheduleClient {
    pub fn new(config: &ScheduleConfig, api_key: String) -> Self {
        ScheduleClient {
            http: HTTP_CLIENT.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_event_type_id: config.event_type_id.clone(),
            default_time_zone: config
                .time_zone
                .clone()
                .unwrap_or_else(|| "UTC".to_string()),
            language: config.language.clone().unwrap_or_else(|| "en".to_string()),
        }
    }

    pub(crate) fn api_key_for<'a>(&'a self, ctx: &'a ScheduleContext) -> &'a str {
        ctx.api_key_override.as_deref().unwrap_or(&self.api_key)
    }

    pub(crate) fn event_type_for(&self, ctx: &ScheduleContext) -> Result<String, ScheduleError> {
        ctx.event_type_id_override
            .clone()
            .or_else(|| self.default_event_type_id.clone())
            .ok_or_else(|| {
                ScheduleError::ConfigError("no event type id configured or supplied".into())
            })
    }

    async fn read_api_error(response: Response) -> ScheduleError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.into_message(&text))
            .unwrap_or(text);
        ScheduleError::ApiError {
            status_code: status,
            message,
        }
    }

    /// Fetch available slots in `[start, end]`, flattened and sorted
    /// ascending by time. Entries with unparseable timestamps are dropped
    /// with a warning rather than failing the whole query.
    pub async fn fetch_slots(
        &self,
        ctx: &ScheduleContext,
        query: &SlotQuery,
    ) -> Result<Vec<AvailabilitySlot>, ScheduleError> {
        let event_type_id = self.event_type_for(ctx)?;
        let url = format!("{}/slots", self.base_url);
        debug!(
            "Querying availability: event_type={} window={}..{}",
            event_type_id, query.start, query.end
        );

        let response = self
            .http
            .get(&url)
            .query(&[
                ("apiKey", self.api_key_for(ctx)),
                ("eventTypeId", event_type_id.as_str()),
                ("startTime", query.start.to_rfc3339().as_str()),
                ("endTime", query.end.to_rfc3339().as_str()),
                ("timeZone", query.time_zone.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }

        let body: SlotsResponse = response.json().await?;
        let mut slots: Vec<AvailabilitySlot> = body
            .slots
            .into_values()
            .flatten()
            .filter_map(|entry| match DateTime::parse_from_rfc3339(&entry.time) {
                Ok(dt) => Some(AvailabilitySlot {
                    time: dt.with_timezone(&Utc),
                }),
                Err(e) => {
                    warn!("Dropping slot with unparseable time '{}': {}", entry.time, e);
                    None
                }
            })
            .collect();
        slots.sort_by_key(|slot| slot.time);
        Ok(slots)
    }

    pub async fn post_booking(
        &self,
        ctx: &ScheduleContext,
        fields: &BookingFields,
    ) -> Result<ProviderBooking, ScheduleError> {
        let event_type_id = self.event_type_for(ctx)?;
        let url = format!("{}/bookings", self.base_url);

        let payload = CreateBookingPayload {
            event_type_id,
            start: fields.start_time.to_rfc3339(),
            end: fields.end_time.map(|t| t.to_rfc3339()),
            responses: BookingResponses {
                name: fields.attendee.name.clone(),
                email: fields.attendee.email.clone(),
                phone: fields.attendee.phone.clone(),
            },
            time_zone: if fields.time_zone.is_empty() {
                self.default_time_zone.clone()
            } else {
                fields.time_zone.clone()
            },
            language: fields.language.clone().unwrap_or_else(|| self.language.clone()),
            metadata: fields.metadata.clone().unwrap_or_else(|| serde_json::json!({})),
        };

        info!("Creating booking starting at {}", payload.start);
        let response = self
            .http
            .post(&url)
            .query(&[("apiKey", self.api_key_for(ctx))])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }
        let text = response.text().await?;
        Ok(Self::parse_booking(&text)?)
    }

    pub async fn patch_booking(
        &self,
        ctx: &ScheduleContext,
        booking_id: &str,
        new_start: DateTime<Utc>,
        new_end: Option<DateTime<Utc>>,
        time_zone: &str,
    ) -> Result<ProviderBooking, ScheduleError> {
        let url = format!("{}/bookings/{}", self.base_url, booking_id);
        let payload = RescheduleBookingPayload {
            start: new_start.to_rfc3339(),
            end: new_end.map(|t| t.to_rfc3339()),
            time_zone: time_zone.to_string(),
        };

        info!("Rescheduling booking {} to {}", booking_id, payload.start);
        let response = self
            .http
            .patch(&url)
            .query(&[("apiKey", self.api_key_for(ctx))])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }
        let text = response.text().await?;
        Ok(Self::parse_booking(&text)?)
    }

    pub async fn delete_booking(
        &self,
        ctx: &ScheduleContext,
        booking_id: &str,
        reason: Option<&str>,
    ) -> Result<ProviderBooking, ScheduleError> {
        let url = format!("{}/bookings/{}/cancel", self.base_url, booking_id);
        let mut query: Vec<(&str, &str)> = vec![("apiKey", self.api_key_for(ctx))];
        if let Some(reason) = reason {
            query.push(("cancellationReason", reason));
        }

        info!("Cancelling booking {}", booking_id);
        let response = self.http.delete(&url).query(&query).send().await?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }
        // Some providers return an empty body on cancel.
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(ProviderBooking {
                id: booking_id.to_string(),
                uid: None,
                status: "CANCELLED".to_string(),
                start_time: None,
                end_time: None,
            });
        }
        Ok(Self::parse_booking(&text)?)
    }

    pub async fn fetch_booking(
        &self,
        ctx: &ScheduleContext,
        booking_id: &str,
    ) -> Result<ProviderBooking, ScheduleError> {
        let url = format!("{}/bookings/{}", self.base_url, booking_id);
        let response = self
            .http
            .get(&url)
            .query(&[("apiKey", self.api_key_for(ctx))])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::read_api_error(response).await);
        }
        let text = response.text().await?;
        Ok(Self::parse_booking(&text)?)
    }

    /// Bookings arrive bare or wrapped in `{ "booking": {...} }` depending
    /// on the endpoint.
    fn parse_booking(text: &str) -> Result<ProviderBooking, serde_json::Error> {
        let record: BookingRecord = match serde_json::from_str::<BookingRecord>(text) {
            Ok(record) => record,
            Err(_) => serde_json::from_str::<BookingEnvelope>(text)?.booking,
        };
        Ok(ProviderBooking {
            id: record.id.as_string(),
            uid: record.uid,
            status: record.status.unwrap_or_else(|| "ACCEPTED".to_string()),
            start_time: record.start_time,
            end_time: record.end_time,
        })
    }
}

impl SchedulingService for ScheduleClient {
    fn get_available_slots(
        &self,
        ctx: &ScheduleContext,
        query: SlotQuery,
    ) -> BoxFuture<'_, Vec<AvailabilitySlot>, ServiceError> {
        let ctx = ctx.clone();
        Box::pin(async move { self.fetch_slots(&ctx, &query).await.map_err(Into::into) })
    }

    fn create_booking(
        &self,
        ctx: &ScheduleContext,
        fields: BookingFields,
    ) -> BoxFuture<'_, ProviderBooking, ServiceError> {
        let ctx = ctx.clone();
        Box::pin(async move { self.post_booking(&ctx, &fields).await.map_err(Into::into) })
    }

    fn reschedule_booking(
        &self,
        ctx: &ScheduleContext,
        booking_id: &str,
        new_start: DateTime<Utc>,
        new_end: Option<DateTime<Utc>>,
        time_zone: &str,
    ) -> BoxFuture<'_, ProviderBooking, ServiceError> {
        let ctx = ctx.clone();
        let booking_id = booking_id.to_string();
        let time_zone = time_zone.to_string();
        Box::pin(async move {
            self.patch_booking(&ctx, &booking_id, new_start, new_end, &time_zone)
                .await
                .map_err(Into::into)
        })
    }

    fn cancel_booking(
        &self,
        ctx: &ScheduleContext,
        booking_id: &str,
        reason: Option<&str>,
    ) -> BoxFuture<'_, ProviderBooking, ServiceError> {
        let ctx = ctx.clone();
        let booking_id = booking_id.to_string();
        let reason = reason.map(|r| r.to_string());
        Box::pin(async move {
            self.delete_booking(&ctx, &booking_id, reason.as_deref())
                .await
                .map_err(Into::into)
        })
    }

    fn get_booking(
        &self,
        ctx: &ScheduleContext,
        booking_id: &str,
    ) -> BoxFuture<'_, ProviderBooking, ServiceError> {
        let ctx = ctx.clone();
        let booking_id = booking_id.to_string();
        Box::pin(async move {
            self.fetch_booking(&ctx, &booking_id)
                .await
                .map_err(Into::into)
        })
    }
}
