#[cfg(test)]
mod tests {
    use crate::booking::{
        create_booking, rank_alternatives, repair_start_time, reschedule_booking,
        validate_booking_params,
    };
    use crate::test_support::MockScheduler;
    use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
    use chrono_tz::Tz;
    use dialbook_common::error::{GatewayError, HttpStatusCode};
    use dialbook_common::services::{
        AvailabilitySlot, ProviderBooking, ScheduleContext, ServiceError, ServiceErrorKind,
    };
    use dialbook_config::{DateRepairPolicy, GatewayConfig};
    use serde_json::{json, Map, Value};

    fn zone() -> Tz {
        "Europe/Zurich".parse().unwrap()
    }

    fn slot(rfc3339: &str) -> AvailabilitySlot {
        AvailabilitySlot {
            time: rfc3339.parse::<DateTime<Utc>>().unwrap(),
        }
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn future_start() -> String {
        (Utc::now() + Duration::days(30))
            .with_timezone(&zone())
            .to_rfc3339()
    }

    fn booked(id: &str) -> ProviderBooking {
        ProviderBooking {
            id: id.to_string(),
            uid: None,
            status: "ACCEPTED".to_string(),
            start_time: None,
            end_time: None,
        }
    }

    // --- validation ---

    #[test]
    fn legacy_shape_reports_first_missing_field() {
        let p = params(json!({"email": "ada@example.com"}));
        match validate_booking_params(&p) {
            Err(GatewayError::Validation { field }) => assert_eq!(field, "name"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn native_shape_is_selected_by_responses_key() {
        let p = params(json!({
            "eventTypeId": "42",
            "start": future_start(),
            "responses": {"name": "Ada", "email": "ada@example.com"},
            "timeZone": "Europe/Zurich"
        }));
        let validated = validate_booking_params(&p).unwrap();
        assert_eq!(validated.event_type_id.as_deref(), Some("42"));
        assert_eq!(validated.attendee.name, "Ada");
    }

    #[test]
    fn bad_time_zone_names_the_field() {
        let p = params(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "startTime": "2030-06-01T10:00:00",
            "timeZone": "Mars/Olympus"
        }));
        match validate_booking_params(&p) {
            Err(GatewayError::Validation { field }) => assert_eq!(field, "timeZone"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn zoneless_start_is_interpreted_in_the_caller_zone() {
        let p = params(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "startTime": "2030-06-01T10:00:00",
            "timeZone": "Europe/Zurich"
        }));
        let validated = validate_booking_params(&p).unwrap();
        assert_eq!(validated.start.hour(), 10);
        assert_eq!(validated.start.timezone(), zone());
    }

    // --- date repair ---

    #[test]
    fn past_year_is_shifted_to_current_year_same_month_day_time() {
        let tz = zone();
        let now = tz.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let start = tz.with_ymd_and_hms(2023, 9, 3, 10, 30, 0).unwrap();
        let repaired =
            repair_start_time(start, None, now, DateRepairPolicy::ShiftForward).unwrap();
        assert!(repaired.adjusted);
        assert_eq!(repaired.start.year(), 2026);
        assert_eq!(repaired.start.month(), 9);
        assert_eq!(repaired.start.day(), 3);
        assert_eq!(repaired.start.hour(), 10);
        assert_eq!(repaired.start.minute(), 30);
    }

    #[test]
    fn past_year_still_past_after_shift_gets_one_more_year() {
        let tz = zone();
        let now = tz.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let start = tz.with_ymd_and_hms(2023, 2, 1, 9, 0, 0).unwrap();
        let repaired =
            repair_start_time(start, None, now, DateRepairPolicy::ShiftForward).unwrap();
        assert_eq!(repaired.start.year(), 2027);
        assert_eq!(repaired.start.month(), 2);
    }

    #[test]
    fn earlier_today_becomes_tomorrow_same_hour_minute() {
        let tz = zone();
        let now = tz.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let start = tz.with_ymd_and_hms(2026, 6, 15, 9, 45, 17).unwrap();
        let repaired =
            repair_start_time(start, None, now, DateRepairPolicy::ShiftForward).unwrap();
        assert!(repaired.adjusted);
        assert_eq!(repaired.start.day(), 16);
        assert_eq!(repaired.start.hour(), 9);
        assert_eq!(repaired.start.minute(), 45);
        assert_eq!(repaired.start.second(), 0);
    }

    #[test]
    fn end_time_shifts_by_the_same_offset() {
        let tz = zone();
        let now = tz.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let start = tz.with_ymd_and_hms(2026, 6, 15, 9, 0, 0).unwrap();
        let end = Some(tz.with_ymd_and_hms(2026, 6, 15, 10, 0, 0).unwrap());
        let repaired =
            repair_start_time(start, end, now, DateRepairPolicy::ShiftForward).unwrap();
        assert_eq!(
            repaired.end.unwrap() - repaired.start,
            Duration::hours(1)
        );
    }

    #[test]
    fn future_start_passes_through_untouched() {
        let tz = zone();
        let now = tz.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let start = tz.with_ymd_and_hms(2026, 7, 1, 10, 0, 0).unwrap();
        let repaired =
            repair_start_time(start, None, now, DateRepairPolicy::ShiftForward).unwrap();
        assert!(!repaired.adjusted);
        assert_eq!(repaired.start, start);
    }

    #[test]
    fn reject_policy_turns_past_start_into_validation_error() {
        let tz = zone();
        let now = tz.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap();
        let start = tz.with_ymd_and_hms(2026, 6, 15, 9, 0, 0).unwrap();
        match repair_start_time(start, None, now, DateRepairPolicy::Reject) {
            Err(GatewayError::Validation { field }) => assert_eq!(field, "startTime"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    // --- alternative ranking ---

    #[test]
    fn alternatives_rank_by_distance_then_earlier_time() {
        // 10:00 is 15 minutes away; 09:00 and 11:30 are both 75 minutes
        // away, so the earlier one wins the tie.
        let slots = vec![
            slot("2026-06-16T09:00:00Z"),
            slot("2026-06-16T10:00:00Z"),
            slot("2026-06-16T11:30:00Z"),
        ];
        let requested = "2026-06-16T10:15:00Z".parse::<DateTime<Utc>>().unwrap();
        let ranked = rank_alternatives(&slots, requested, 2);
        assert_eq!(ranked[0], slot("2026-06-16T10:00:00Z"));
        assert_eq!(ranked[1], slot("2026-06-16T09:00:00Z"));
    }

    #[test]
    fn equidistant_slots_prefer_the_earlier_one() {
        let slots = vec![slot("2026-06-16T11:00:00Z"), slot("2026-06-16T09:00:00Z")];
        let requested = "2026-06-16T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let ranked = rank_alternatives(&slots, requested, 5);
        assert_eq!(ranked[0], slot("2026-06-16T09:00:00Z"));
    }

    #[test]
    fn ranking_truncates_to_the_configured_maximum() {
        let slots: Vec<_> = (0..10)
            .map(|i| AvailabilitySlot {
                time: "2026-06-16T08:00:00Z".parse::<DateTime<Utc>>().unwrap()
                    + Duration::hours(i),
            })
            .collect();
        let requested = "2026-06-16T08:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(rank_alternatives(&slots, requested, 5).len(), 5);
    }

    #[test]
    fn empty_candidate_set_yields_empty_alternatives() {
        let requested = "2026-06-16T08:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert!(rank_alternatives(&[], requested, 5).is_empty());
    }

    // --- orchestration ---

    fn create_params(start: &str) -> Map<String, Value> {
        params(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "startTime": start,
            "timeZone": "Europe/Zurich"
        }))
    }

    #[tokio::test]
    async fn available_slot_is_booked() {
        let start = future_start();
        let start_utc = start.parse::<DateTime<Utc>>().unwrap();
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_get_available_slots()
            .times(1)
            .returning(move |_, _| {
                let slots = vec![AvailabilitySlot { time: start_utc }];
                Box::pin(async move { Ok(slots) })
            });
        scheduler
            .expect_create_booking()
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(booked("b-1")) }));

        let outcome = create_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &create_params(&start),
        )
        .await
        .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.http_status(), 200);
        assert_eq!(outcome.booking.unwrap().id, "b-1");
        assert!(!outcome.date_adjusted);
        assert!(outcome.alternative_slots.is_none());
    }

    #[tokio::test]
    async fn unavailable_slot_yields_conflict_with_ranked_alternatives() {
        let start = future_start();
        let start_utc = start.parse::<DateTime<Utc>>().unwrap();
        let mut scheduler = MockScheduler::new();
        // Pre-flight window has other slots but not the requested instant;
        // the widened lookup returns the candidate set to rank.
        scheduler
            .expect_get_available_slots()
            .times(2)
            .returning(move |_, _| {
                let slots = vec![
                    AvailabilitySlot {
                        time: start_utc + Duration::hours(2),
                    },
                    AvailabilitySlot {
                        time: start_utc + Duration::hours(1),
                    },
                ];
                Box::pin(async move { Ok(slots) })
            });
        scheduler.expect_create_booking().times(0);

        let outcome = create_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &create_params(&start),
        )
        .await
        .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.http_status(), 409);
        let alternatives = outcome.alternative_slots.unwrap();
        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[0].time, start_utc + Duration::hours(1));
        assert!(!outcome.message.is_empty());
    }

    #[tokio::test]
    async fn provider_conflict_on_create_is_recovered_with_alternatives() {
        let start = future_start();
        let start_utc = start.parse::<DateTime<Utc>>().unwrap();
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_get_available_slots()
            .times(2)
            .returning(move |_, _| {
                let slots = vec![AvailabilitySlot { time: start_utc }];
                Box::pin(async move { Ok(slots) })
            });
        scheduler.expect_create_booking().times(1).returning(|_, _| {
            Box::pin(async {
                Err(ServiceError {
                    service: "scheduler",
                    kind: ServiceErrorKind::Conflict,
                    status: Some(400),
                    message: "already booked".into(),
                })
            })
        });

        let outcome = create_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &create_params(&start),
        )
        .await
        .unwrap();
        assert!(!outcome.success);
        assert!(outcome.alternative_slots.is_some());
    }

    #[tokio::test]
    async fn failed_widened_lookup_surfaces_the_original_conflict() {
        let start = future_start();
        let mut scheduler = MockScheduler::new();
        let mut calls = 0;
        scheduler
            .expect_get_available_slots()
            .times(2)
            .returning(move |_, _| {
                calls += 1;
                if calls == 1 {
                    Box::pin(async { Ok(Vec::new()) })
                } else {
                    Box::pin(async {
                        Err(ServiceError::upstream("scheduler", Some(503), "down"))
                    })
                }
            });
        scheduler.expect_create_booking().times(0);

        let err = create_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &create_params(&start),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn non_conflict_provider_error_propagates_with_its_status() {
        let start = future_start();
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_get_available_slots()
            .times(1)
            .returning(|_, _| {
                Box::pin(async { Err(ServiceError::upstream("scheduler", Some(502), "bad gateway")) })
            });

        let err = create_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &create_params(&start),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn validation_failure_makes_no_provider_calls() {
        let scheduler = MockScheduler::new();
        let err = create_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &params(json!({"name": "Ada"})),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn reschedule_repairs_a_past_start_before_calling_the_provider() {
        let tz = zone();
        let past = tz.with_ymd_and_hms(2020, 3, 1, 14, 0, 0).unwrap();
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_reschedule_booking()
            .times(1)
            .returning(|_, _, new_start, _, _| {
                // The provider must never see the past instant.
                assert!(new_start > Utc::now());
                Box::pin(async { Ok(booked("b-3")) })
            });

        let outcome = reschedule_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &params(json!({
                "bookingId": "b-3",
                "newStartTime": past.to_rfc3339(),
                "timeZone": "Europe/Zurich"
            })),
        )
        .await
        .unwrap();
        assert!(outcome.success);
        assert!(outcome.date_adjusted);
        assert!(outcome.original_start_time.is_some());
    }

    #[tokio::test]
    async fn reschedule_conflict_is_recovered_with_alternatives() {
        let start = future_start();
        let start_utc = start.parse::<DateTime<Utc>>().unwrap();
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_reschedule_booking()
            .times(1)
            .returning(|_, _, _, _, _| {
                Box::pin(async {
                    Err(ServiceError {
                        service: "scheduler",
                        kind: ServiceErrorKind::Conflict,
                        status: Some(400),
                        message: "already booked".into(),
                    })
                })
            });
        scheduler
            .expect_get_available_slots()
            .times(1)
            .returning(move |_, _| {
                let slots = vec![AvailabilitySlot {
                    time: start_utc + Duration::hours(1),
                }];
                Box::pin(async move { Ok(slots) })
            });

        let outcome = reschedule_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &params(json!({
                "bookingId": "b-3",
                "newStartTime": start,
                "timeZone": "Europe/Zurich"
            })),
        )
        .await
        .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.http_status(), 409);
        assert_eq!(outcome.alternative_slots.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reschedule_without_booking_id_is_a_validation_error() {
        let scheduler = MockScheduler::new();
        let err = reschedule_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &params(json!({"newStartTime": future_start(), "timeZone": "Europe/Zurich"})),
        )
        .await
        .unwrap_err();
        match err {
            GatewayError::Validation { field } => assert_eq!(field, "bookingId"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn adjusted_date_is_reported_in_the_outcome() {
        let tz = zone();
        let past = tz.with_ymd_and_hms(2020, 6, 1, 10, 0, 0).unwrap();
        let mut scheduler = MockScheduler::new();
        scheduler
            .expect_get_available_slots()
            .returning(move |_, query| {
                // Make whatever instant falls mid-window available so the
                // repaired time books successfully.
                let mid = query.start + (query.end - query.start) / 2;
                let slots = vec![AvailabilitySlot { time: mid }];
                Box::pin(async move { Ok(slots) })
            });
        scheduler
            .expect_create_booking()
            .returning(|_, _| Box::pin(async { Ok(booked("b-2")) }));

        let outcome = create_booking(
            &scheduler,
            &ScheduleContext::default(),
            &GatewayConfig::default(),
            &create_params(&past.to_rfc3339()),
        )
        .await
        .unwrap();
        // Whether the repaired instant matched the mocked slot or not, the
        // adjustment must be visible.
        assert!(outcome.date_adjusted);
        assert!(outcome.original_start_time.is_some());
        assert!(outcome.adjusted_start_time.is_some());
    }
}
