// --- File: crates/dialbook_gateway/src/test_support.rs ---
//! Mock providers shared by the unit and router tests.

use chrono::{DateTime, Utc};
use dialbook_common::services::{
    AvailabilitySlot, BookingFields, BoxFuture, CallRecord, OutboundCallRequest, ProviderBooking,
    ScheduleContext, SchedulingService, ServiceError, SlotQuery, VoiceService,
};
use mockall::mock;

mock! {
    pub Scheduler {}
    impl SchedulingService for Scheduler {
        fn get_available_slots<'a>(
            &'a self,
            ctx: &ScheduleContext,
            query: SlotQuery,
        ) -> BoxFuture<'a, Vec<AvailabilitySlot>, ServiceError>;
        fn create_booking<'a>(
            &'a self,
            ctx: &ScheduleContext,
            fields: BookingFields,
        ) -> BoxFuture<'a, ProviderBooking, ServiceError>;
        fn reschedule_booking<'a>(
            &'a self,
            ctx: &ScheduleContext,
            booking_id: &str,
            new_start: DateTime<Utc>,
            new_end: Option<DateTime<Utc>>,
            time_zone: &str,
        ) -> BoxFuture<'a, ProviderBooking, ServiceError>;
        fn cancel_booking<'a, 'b>(
            &'a self,
            ctx: &ScheduleContext,
            booking_id: &str,
            reason: Option<&'b str>,
        ) -> BoxFuture<'a, ProviderBooking, ServiceError>;
        fn get_booking<'a>(
            &'a self,
            ctx: &ScheduleContext,
            booking_id: &str,
        ) -> BoxFuture<'a, ProviderBooking, ServiceError>;
    }
}

mock! {
    pub Voice {}
    impl VoiceService for Voice {
        fn create_call<'a>(
            &'a self,
            request: OutboundCallRequest,
        ) -> BoxFuture<'a, CallRecord, ServiceError>;
        fn create_sip_call<'a>(
            &'a self,
            request: OutboundCallRequest,
        ) -> BoxFuture<'a, CallRecord, ServiceError>;
        fn send_message<'a>(
            &'a self,
            call_id: &str,
            payload: serde_json::Value,
        ) -> BoxFuture<'a, (), ServiceError>;
        fn get_call<'a>(&'a self, call_id: &str) -> BoxFuture<'a, CallRecord, ServiceError>;
        fn end_call<'a>(&'a self, call_id: &str) -> BoxFuture<'a, (), ServiceError>;
    }
}
