#[cfg(test)]
mod tests {
    use crate::service::ScheduleClient;
    use dialbook_common::services::{ScheduleContext, SlotQuery};
    use dialbook_config::ScheduleConfig;

    fn test_client(event_type_id: Option<&str>) -> ScheduleClient {
        ScheduleClient::new(
            &ScheduleConfig {
                base_url: "https://scheduler.test/v1/".into(),
                event_type_id: event_type_id.map(String::from),
                time_zone: Some("Europe/Zurich".into()),
                language: Some("en".into()),
            },
            "default-key".into(),
        )
    }

    #[test]
    fn context_overrides_take_priority_over_defaults() {
        let client = test_client(Some("2171540"));
        let ctx = ScheduleContext {
            api_key_override: Some("caller-key".into()),
            event_type_id_override: Some("999".into()),
        };
        assert_eq!(client.api_key_for(&ctx), "caller-key");
        assert_eq!(client.event_type_for(&ctx).unwrap(), "999");

        // A second, override-free context against the same client still
        // sees the process defaults: overrides never leak across requests.
        let plain = ScheduleContext::default();
        assert_eq!(client.api_key_for(&plain), "default-key");
        assert_eq!(client.event_type_for(&plain).unwrap(), "2171540");
    }

    #[tokio::test]
    async fn missing_event_type_everywhere_is_a_config_error() {
        let client = test_client(None);
        let query = SlotQuery {
            start: chrono::Utc::now(),
            end: chrono::Utc::now(),
            time_zone: "UTC".into(),
        };
        let err = client
            .fetch_slots(&ScheduleContext::default(), &query)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("event type"));
    }
}
