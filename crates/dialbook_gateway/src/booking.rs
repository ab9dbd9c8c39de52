// --- File: crates/dialbook_gateway/src/booking.rs ---
//! Booking orchestration: validate → repair → availability check → book,
//! with ranked alternatives on conflict.
//!
//! The repair step is deliberate best-effort recovery. Voice callers say
//! things like "March 3rd at 10" and the assistant fills in a year that may
//! already be gone; asking them to restate a corrected date mid-conversation
//! is worse than shifting the date forward and saying so in the response.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use dialbook_common::error::{validation_error, GatewayError};
use dialbook_common::services::{
    Attendee, AvailabilitySlot, BookingFields, ProviderBooking, ScheduleContext,
    SchedulingService, SlotQuery,
};
use dialbook_config::{DateRepairPolicy, GatewayConfig};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// A booking request after validation, in the caller's time zone.
#[derive(Debug, Clone)]
pub struct ValidatedBooking {
    pub event_type_id: Option<String>,
    pub start: DateTime<Tz>,
    pub end: Option<DateTime<Tz>>,
    pub time_zone: Tz,
    pub attendee: Attendee,
    pub language: Option<String>,
    pub metadata: Option<Value>,
}

/// Terminal result of one booking attempt, serialized to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<ProviderBooking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_slots: Option<Vec<AvailabilitySlot>>,
    pub date_adjusted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_start_time: Option<String>,
    pub message: String,
}

impl BookingOutcome {
    pub fn http_status(&self) -> u16 {
        if self.success {
            200
        } else {
            409
        }
    }
}

fn param_str<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn require<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, GatewayError> {
    param_str(params, key).ok_or_else(|| validation_error(key))
}

fn parse_time_zone(params: &Map<String, Value>) -> Result<Tz, GatewayError> {
    let raw = require(params, "timeZone")?;
    raw.parse::<Tz>().map_err(|_| {
        warn!("Unparseable time zone '{}'", raw);
        validation_error("timeZone")
    })
}

/// Parses a timestamp either as RFC 3339 or as a zone-less local time
/// interpreted in the caller's zone.
fn parse_instant(field: &str, raw: &str, tz: Tz) -> Result<DateTime<Tz>, GatewayError> {
    if let Ok(fixed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(fixed.with_timezone(&tz));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, format) {
            if let Some(local) = resolve_local(naive, tz) {
                return Ok(local);
            }
        }
    }
    warn!("Unparseable {} value '{}'", field, raw);
    Err(validation_error(field))
}

/// Resolves a naive local time in `tz`. Ambiguous times (DST fall-back) take
/// the earlier instant; nonexistent times (spring-forward gap) slide one hour.
fn resolve_local(naive: chrono::NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

/// Validates booking parameters in either accepted shape.
///
/// The provider-native shape (`eventTypeId`, `start`, `responses`,
/// `timeZone`) is chosen when a `responses` object is present or when
/// `start` is supplied without `startTime`; otherwise the legacy call shape
/// (`name`, `email`, `startTime`, `timeZone`) applies. The first missing
/// field names the validation error.
pub fn validate_booking_params(params: &Map<String, Value>) -> Result<ValidatedBooking, GatewayError> {
    let native_shape = params.contains_key("responses")
        || (params.contains_key("start") && !params.contains_key("startTime"));

    if native_shape {
        let event_type_id = require(params, "eventTypeId")?.to_string();
        let start_raw = require(params, "start")?.to_string();
        let responses = params
            .get("responses")
            .and_then(Value::as_object)
            .ok_or_else(|| validation_error("responses"))?;
        let tz = parse_time_zone(params)?;

        let attendee = Attendee {
            name: responses
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| validation_error("responses.name"))?
                .to_string(),
            email: responses
                .get("email")
                .and_then(Value::as_str)
                .ok_or_else(|| validation_error("responses.email"))?
                .to_string(),
            phone: responses
                .get("phone")
                .and_then(Value::as_str)
                .map(String::from),
        };
        let start = parse_instant("start", &start_raw, tz)?;
        let end = match param_str(params, "end") {
            Some(raw) => Some(parse_instant("end", raw, tz)?),
            None => None,
        };
        return Ok(ValidatedBooking {
            event_type_id: Some(event_type_id),
            start,
            end,
            time_zone: tz,
            attendee,
            language: param_str(params, "language").map(String::from),
            metadata: params.get("metadata").cloned(),
        });
    }

    let name = require(params, "name")?.to_string();
    let email = require(params, "email")?.to_string();
    let start_raw = require(params, "startTime")?.to_string();
    let tz = parse_time_zone(params)?;

    let start = parse_instant("startTime", &start_raw, tz)?;
    let end = match param_str(params, "endTime") {
        Some(raw) => Some(parse_instant("endTime", raw, tz)?),
        None => None,
    };
    Ok(ValidatedBooking {
        event_type_id: param_str(params, "eventTypeId").map(String::from),
        start,
        end,
        time_zone: tz,
        attendee: Attendee {
            name,
            email,
            phone: param_str(params, "phone").map(String::from),
        },
        language: param_str(params, "language").map(String::from),
        metadata: params.get("metadata").cloned(),
    })
}

/// Outcome of the date-repair step.
#[derive(Debug, Clone)]
pub struct RepairedTime {
    pub start: DateTime<Tz>,
    pub end: Option<DateTime<Tz>>,
    pub adjusted: bool,
    pub original_start: DateTime<Tz>,
}

/// Shifts a past start time forward instead of rejecting it.
///
/// A start in a past year keeps its month/day/time and moves to the current
/// year (one more year if that is still not in the future). A same-year past
/// time moves to tomorrow at the same hour and minute, seconds zeroed. The
/// end time, when present, is shifted by the identical offset. Future times
/// pass through untouched.
pub fn repair_start_time(
    start: DateTime<Tz>,
    end: Option<DateTime<Tz>>,
    now: DateTime<Tz>,
    policy: DateRepairPolicy,
) -> Result<RepairedTime, GatewayError> {
    if start > now {
        return Ok(RepairedTime {
            start,
            end,
            adjusted: false,
            original_start: start,
        });
    }
    if policy == DateRepairPolicy::Reject {
        warn!("Rejecting past start time {} under reject policy", start);
        return Err(validation_error("startTime"));
    }

    let tz = start.timezone();
    let repaired = if start.year() < now.year() {
        let shifted = shift_year(start, now.year(), tz);
        if shifted > now {
            shifted
        } else {
            shift_year(start, now.year() + 1, tz)
        }
    } else {
        let tomorrow = (now + Duration::days(1)).date_naive();
        let naive = tomorrow
            .and_hms_opt(start.hour(), start.minute(), 0)
            .unwrap_or_else(|| tomorrow.and_time(chrono::NaiveTime::MIN));
        resolve_local(naive, tz).unwrap_or(now + Duration::days(1))
    };

    info!(
        "Adjusted past start time {} to {}",
        start.to_rfc3339(),
        repaired.to_rfc3339()
    );
    let offset = repaired - start;
    Ok(RepairedTime {
        start: repaired,
        end: end.map(|e| e + offset),
        adjusted: true,
        original_start: start,
    })
}

/// Re-anchors a local timestamp to `year`, keeping month/day/time-of-day.
/// Feb 29 in a non-leap target year falls back to Feb 28.
fn shift_year(start: DateTime<Tz>, year: i32, tz: Tz) -> DateTime<Tz> {
    let naive = start.naive_local();
    let shifted = naive
        .with_year(year)
        .or_else(|| (naive - Duration::days(1)).with_year(year))
        .unwrap_or(naive);
    resolve_local(shifted, tz).unwrap_or(start)
}

/// Ranks candidate slots by absolute distance to the requested time,
/// earlier timestamp first on ties, truncated to `max`. Deterministic for a
/// fixed input set.
pub fn rank_alternatives(
    slots: &[AvailabilitySlot],
    requested: DateTime<Utc>,
    max: usize,
) -> Vec<AvailabilitySlot> {
    let mut ranked = slots.to_vec();
    ranked.sort_by_key(|slot| ((slot.time - requested).num_seconds().abs(), slot.time));
    ranked.truncate(max);
    ranked
}

fn slot_query(center: DateTime<Tz>, before_days: i64, after_days: i64, tz: Tz) -> SlotQuery {
    SlotQuery {
        start: (center - Duration::days(before_days)).with_timezone(&Utc),
        end: (center + Duration::days(after_days)).with_timezone(&Utc),
        time_zone: tz.name().to_string(),
    }
}

fn adjustment_note(repaired: &RepairedTime) -> String {
    if repaired.adjusted {
        format!(
            " The requested date was in the past and was moved to {}.",
            repaired.start.to_rfc3339()
        )
    } else {
        String::new()
    }
}

/// Computes ranked alternatives over the widened conflict window. When even
/// this lookup fails, the original failure is surfaced instead of being
/// masked as "no alternatives".
async fn alternatives_or_original_error(
    scheduling: &dyn SchedulingService,
    ctx: &ScheduleContext,
    gateway: &GatewayConfig,
    repaired: &RepairedTime,
    original: GatewayError,
) -> Result<Vec<AvailabilitySlot>, GatewayError> {
    let query = slot_query(
        repaired.start,
        gateway.conflict_window_before_days,
        gateway.conflict_window_after_days,
        repaired.start.timezone(),
    );
    match scheduling.get_available_slots(ctx, query).await {
        Ok(slots) => Ok(rank_alternatives(
            &slots,
            repaired.start.with_timezone(&Utc),
            gateway.max_alternatives,
        )),
        Err(e) => {
            warn!("Widened availability lookup failed: {}", e);
            Err(original)
        }
    }
}

fn conflict_outcome(repaired: &RepairedTime, alternatives: Vec<AvailabilitySlot>) -> BookingOutcome {
    let message = format!(
        "The requested time {} is not available. {} alternative time slots are offered.{}",
        repaired.start.to_rfc3339(),
        alternatives.len(),
        adjustment_note(repaired)
    );
    BookingOutcome {
        success: false,
        booking: None,
        alternative_slots: Some(alternatives),
        date_adjusted: repaired.adjusted,
        original_start_time: repaired
            .adjusted
            .then(|| repaired.original_start.to_rfc3339()),
        adjusted_start_time: repaired.adjusted.then(|| repaired.start.to_rfc3339()),
        message,
    }
}

/// Runs the full booking pipeline.
///
/// `Ok` carries both successful bookings and conflicts (the caller maps
/// `success` to the HTTP status); `Err` carries validation failures and
/// hard provider errors.
pub async fn create_booking(
    scheduling: &dyn SchedulingService,
    ctx: &ScheduleContext,
    gateway: &GatewayConfig,
    params: &Map<String, Value>,
) -> Result<BookingOutcome, GatewayError> {
    let request = validate_booking_params(params)?;
    let now = Utc::now().with_timezone(&request.time_zone);
    let repaired = repair_start_time(request.start, request.end, now, gateway.date_repair)?;
    let requested_utc = repaired.start.with_timezone(&Utc);

    // Pre-flight: is the exact requested instant in the provider's
    // availability set?
    let query = slot_query(
        repaired.start,
        gateway.availability_window_days,
        gateway.availability_window_days,
        request.time_zone,
    );
    let slots = scheduling.get_available_slots(ctx, query).await?;
    let available = slots.iter().any(|slot| slot.time == requested_utc);
    debug!(
        "Requested instant {} available: {} ({} slots in window)",
        requested_utc, available, slots.len()
    );

    if !available {
        let alternatives = alternatives_or_original_error(
            scheduling,
            ctx,
            gateway,
            &repaired,
            GatewayError::Conflict("requested time is not available".into()),
        )
        .await?;
        return Ok(conflict_outcome(&repaired, alternatives));
    }

    let fields = BookingFields {
        start_time: requested_utc,
        end_time: repaired.end.map(|e| e.with_timezone(&Utc)),
        time_zone: request.time_zone.name().to_string(),
        attendee: request.attendee.clone(),
        language: request.language.clone(),
        metadata: request.metadata.clone(),
    };
    match scheduling.create_booking(ctx, fields).await {
        Ok(booking) => {
            info!("Booking {} created for {}", booking.id, requested_utc);
            Ok(BookingOutcome {
                success: true,
                booking: Some(booking),
                alternative_slots: None,
                date_adjusted: repaired.adjusted,
                original_start_time: repaired
                    .adjusted
                    .then(|| repaired.original_start.to_rfc3339()),
                adjusted_start_time: repaired.adjusted.then(|| repaired.start.to_rfc3339()),
                message: format!(
                    "Booking confirmed for {}.{}",
                    repaired.start.to_rfc3339(),
                    adjustment_note(&repaired)
                ),
            })
        }
        // The provider can report a conflict the pre-flight missed (a race
        // with another booking). Same recovery as a pre-flight miss.
        Err(e) if e.is_conflict() => {
            let original: GatewayError = e.into();
            let alternatives =
                alternatives_or_original_error(scheduling, ctx, gateway, &repaired, original)
                    .await?;
            Ok(conflict_outcome(&repaired, alternatives))
        }
        Err(e) => Err(e.into()),
    }
}

/// Moves an existing booking to a new start time, running the same
/// validation and date repair as booking creation.
pub async fn reschedule_booking(
    scheduling: &dyn SchedulingService,
    ctx: &ScheduleContext,
    gateway: &GatewayConfig,
    params: &Map<String, Value>,
) -> Result<BookingOutcome, GatewayError> {
    let booking_id = require(params, "bookingId")?.to_string();
    let tz = parse_time_zone(params)?;
    let start_raw = param_str(params, "newStartTime")
        .or_else(|| param_str(params, "startTime"))
        .ok_or_else(|| validation_error("newStartTime"))?
        .to_string();
    let start = parse_instant("newStartTime", &start_raw, tz)?;
    let end = match param_str(params, "newEndTime") {
        Some(raw) => Some(parse_instant("newEndTime", raw, tz)?),
        None => None,
    };

    let now = Utc::now().with_timezone(&tz);
    let repaired = repair_start_time(start, end, now, gateway.date_repair)?;
    let new_start = repaired.start.with_timezone(&Utc);
    let new_end = repaired.end.map(|e| e.with_timezone(&Utc));

    match scheduling
        .reschedule_booking(ctx, &booking_id, new_start, new_end, tz.name())
        .await
    {
        Ok(booking) => {
            info!("Booking {} rescheduled to {}", booking_id, new_start);
            Ok(BookingOutcome {
                success: true,
                booking: Some(booking),
                alternative_slots: None,
                date_adjusted: repaired.adjusted,
                original_start_time: repaired
                    .adjusted
                    .then(|| repaired.original_start.to_rfc3339()),
                adjusted_start_time: repaired.adjusted.then(|| repaired.start.to_rfc3339()),
                message: format!(
                    "Booking rescheduled to {}.{}",
                    repaired.start.to_rfc3339(),
                    adjustment_note(&repaired)
                ),
            })
        }
        Err(e) if e.is_conflict() => {
            let original: GatewayError = e.into();
            let alternatives =
                alternatives_or_original_error(scheduling, ctx, gateway, &repaired, original)
                    .await?;
            Ok(conflict_outcome(&repaired, alternatives))
        }
        Err(e) => Err(e.into()),
    }
}
