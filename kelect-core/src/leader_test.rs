#[cfg(test)]
mod tests {
    use crate::test_utils::{at, members};
    use crate::types::LeaderInfo;

    fn led_by(leader: Option<&str>) -> LeaderInfo {
        LeaderInfo::new(
            "orders",
            leader.map(str::to_string),
            Some(at("2024-03-05T07:08:09Z")),
            members(&["pod-a", "pod-b"]),
        )
    }

    #[test]
    fn test_empty_leader() {
        assert!(led_by(None).has_empty_leader());
        assert!(led_by(Some("")).has_empty_leader());
        assert!(!led_by(Some("pod-a")).has_empty_leader());
    }

    #[test]
    fn test_valid_leader_requires_membership() {
        assert!(led_by(Some("pod-a")).has_valid_leader());
        assert!(!led_by(Some("pod-z")).has_valid_leader());
        assert!(!led_by(Some("")).has_valid_leader());
        assert!(!led_by(None).has_valid_leader());
    }

    #[test]
    fn test_is_leader() {
        let info = led_by(Some("pod-a"));
        assert!(info.is_leader("pod-a"));
        assert!(!info.is_leader("pod-b"));
        assert!(!led_by(None).is_leader("pod-a"));
    }

    #[test]
    fn test_time_elapsed_uses_last_seen() {
        let info = led_by(Some("pod-a"));

        assert!(!info.is_time_elapsed_seconds(at("2024-03-05T07:08:18Z"), 10));
        assert!(info.is_time_elapsed_seconds(at("2024-03-05T07:08:19Z"), 10));

        // A later heartbeat pushes the window forward
        let renewed = info.with_renew_timestamp(Some(at("2024-03-05T07:08:15Z")));
        assert_eq!(renewed.last_seen(), Some(at("2024-03-05T07:08:15Z")));
        assert!(!renewed.is_time_elapsed_seconds(at("2024-03-05T07:08:19Z"), 10));
    }

    #[test]
    fn test_unknown_timestamp_counts_as_elapsed() {
        let info = LeaderInfo::new("orders", Some("pod-a".to_string()), None, members(&["pod-a"]));
        assert!(info.is_time_elapsed_seconds(at("2024-03-05T07:08:09Z"), 3600));
    }

    #[test]
    fn test_huge_window_never_elapses() {
        let info = led_by(Some("pod-a"));
        assert!(!info.is_time_elapsed_seconds(at("2024-03-05T07:08:09Z"), i64::MAX));
    }

    #[test]
    fn test_expiry_needs_a_duration() {
        let info = led_by(Some("pod-a"));
        assert!(!info.is_expired(at("2099-01-01T00:00:00Z")));

        let info = info.with_lease_duration(Some(15));
        assert!(!info.is_expired(at("2024-03-05T07:08:20Z")));
        assert!(info.is_expired(at("2024-03-05T07:08:24Z")));
    }

    #[test]
    fn test_leader_info_serializes_camel_case() {
        let info = led_by(Some("pod-a")).with_lease_duration(Some(15));
        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(json["leader"], "pod-a");
        assert_eq!(json["leaseDurationSeconds"], 15);
        assert_eq!(json["acquireTimestamp"], "2024-03-05T07:08:09Z");
        assert_eq!(json["members"], serde_json::json!(["pod-a", "pod-b"]));
    }
}
