#[cfg(test)]
mod tests {
    use crate::backend::{LeaseBackend, LeaseResourceType};
    use crate::backend_key_value::{leader_key, KeyValueLeaseBackend};
    use crate::backend_structured::StructuredLeaseBackend;
    use crate::error::LeaseError;
    use crate::infrastructure::{compare_and_swap, ResourceStore};
    use crate::infrastructure_in_memory::InMemoryResourceStore;
    use crate::test_utils::{at, members};
    use crate::types::{ConfigMap, LeaderInfo, Lease, LeaseRecord, LeaseSpec, ObjectMeta, ResourceKind};

    fn claim(leader: &str) -> LeaderInfo {
        LeaderInfo::new(
            "orders",
            Some(leader.to_string()),
            Some(at("2024-03-05T07:08:09Z")),
            members(&["pod-a", "pod-b"]),
        )
        .with_lease_duration(Some(15))
    }

    #[test]
    fn test_backend_for_resource_type() {
        let key_value = LeaseBackend::for_resource_type(LeaseResourceType::ConfigMap);
        let structured = LeaseBackend::for_resource_type(LeaseResourceType::Lease);

        assert_eq!(key_value, LeaseBackend::KeyValue(KeyValueLeaseBackend));
        assert_eq!(structured, LeaseBackend::Structured(StructuredLeaseBackend));
        assert_eq!(key_value.resource_type(), LeaseResourceType::ConfigMap);
        assert_eq!(structured.resource_type(), LeaseResourceType::Lease);
        assert_eq!(LeaseResourceType::default(), LeaseResourceType::Lease);
    }

    #[test]
    fn test_resource_type_from_str() {
        for value in ["ConfigMap", "configmap", "config-map", "CONFIG_MAP"] {
            assert_eq!(value.parse::<LeaseResourceType>().unwrap(), LeaseResourceType::ConfigMap);
        }
        for value in ["Lease", "lease", "LEASE"] {
            assert_eq!(value.parse::<LeaseResourceType>().unwrap(), LeaseResourceType::Lease);
        }

        let err = "secret".parse::<LeaseResourceType>().unwrap_err();
        assert!(matches!(err, LeaseError::InvalidConfig(_)));
        assert_eq!(err.reason(), "invalid_config");
    }

    #[test]
    fn test_resource_type_display_matches_kind() {
        assert_eq!(LeaseResourceType::ConfigMap.to_string(), "ConfigMap");
        assert_eq!(LeaseResourceType::Lease.to_string(), "Lease");
        assert_eq!(LeaseResourceType::Lease.resource_kind(), ResourceKind::Lease);
    }

    #[test]
    fn test_decode_absent_record_for_both_backends() {
        let pool = members(&["pod-a"]);
        for backend in [
            LeaseBackend::for_resource_type(LeaseResourceType::ConfigMap),
            LeaseBackend::for_resource_type(LeaseResourceType::Lease),
        ] {
            let info = backend.decode_leader_info(None, &pool, "orders");
            assert_eq!(info, LeaderInfo::empty("orders", pool.clone()));
        }
    }

    #[test]
    fn test_decode_foreign_record_kind_is_empty() {
        let lease = LeaseRecord::from(Lease {
            metadata: ObjectMeta::new("default", "leaders-orders"),
            spec: LeaseSpec {
                holder_identity: Some("pod-a".to_string()),
                ..LeaseSpec::default()
            },
        });
        let backend = LeaseBackend::KeyValue(KeyValueLeaseBackend);

        let info = backend.decode_leader_info(Some(&lease), &members(&["pod-a"]), "orders");
        assert!(info.has_empty_leader());
    }

    #[test]
    fn test_operations_reject_foreign_record_kind() {
        let store = InMemoryResourceStore::new();
        let backend = LeaseBackend::Structured(StructuredLeaseBackend);
        let config_map = KeyValueLeaseBackend
            .create_new_lease_resource(&store, "default", "leaders", &claim("pod-a"), at("2024-03-05T07:08:09Z"))
            .unwrap();

        let err = backend
            .optimistic_acquire_leadership(&store, config_map.into(), &claim("pod-b"), at("2024-03-05T07:09:00Z"))
            .unwrap_err();
        assert!(matches!(
            err,
            LeaseError::RecordKindMismatch {
                expected: ResourceKind::Lease,
                found: ResourceKind::ConfigMap,
            }
        ));
    }

    #[test]
    fn test_round_trip_through_enum() {
        let pool = members(&["pod-a", "pod-b"]);
        for resource_type in [LeaseResourceType::ConfigMap, LeaseResourceType::Lease] {
            let store = InMemoryResourceStore::new();
            let backend = LeaseBackend::for_resource_type(resource_type);

            backend
                .create_new_lease_resource(&store, "default", "leaders", &claim("pod-a"), at("2024-03-05T07:08:09Z"))
                .unwrap();
            let fetched = backend
                .fetch_lease_resource(&store, "default", "leaders", "orders")
                .unwrap()
                .expect("record exists");
            assert_eq!(fetched.kind(), resource_type.resource_kind());

            let acquired = backend
                .optimistic_acquire_leadership(&store, fetched, &claim("pod-b"), at("2024-03-05T07:09:00Z"))
                .unwrap();
            let info = backend.decode_leader_info(Some(&acquired), &pool, "orders");
            assert!(info.is_leader("pod-b"), "{} backend", resource_type);
            assert!(info.has_valid_leader());

            let released = backend
                .optimistic_delete_leader_info(&store, acquired, "orders")
                .unwrap();
            let info = backend.decode_leader_info(Some(&released), &pool, "orders");
            assert!(info.has_empty_leader(), "{} backend", resource_type);
        }
    }

    #[test]
    fn test_compare_and_swap_requires_version_token() {
        let store = InMemoryResourceStore::new();
        let record = LeaseRecord::from(ConfigMap {
            metadata: ObjectMeta::new("default", "leaders"),
            ..ConfigMap::default()
        });

        let err = compare_and_swap(&store, record).unwrap_err();
        assert!(matches!(err, LeaseError::MissingVersionToken { ref name } if name == "leaders"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_compare_and_swap_bumps_version() {
        let store = InMemoryResourceStore::new();
        let created = store
            .create(
                "default",
                ConfigMap {
                    metadata: ObjectMeta::new("default", "leaders"),
                    ..ConfigMap::default()
                }
                .into(),
            )
            .unwrap();
        let before = created.version_token().map(str::to_owned);

        let mut config_map = ConfigMap::try_from(created).unwrap();
        config_map.data.insert(leader_key("orders"), "pod-a".to_string());
        let updated = compare_and_swap(&store, config_map.into()).unwrap();

        assert_ne!(updated.version_token().map(str::to_owned), before);
    }

    #[test]
    fn test_record_json_shape() {
        let store = InMemoryResourceStore::new();
        let record = LeaseBackend::Structured(StructuredLeaseBackend)
            .create_new_lease_resource(&store, "default", "leaders-orders", &claim("pod-a"), at("2024-03-05T07:08:09Z"))
            .unwrap();

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "Lease");
        assert_eq!(json["metadata"]["name"], "leaders-orders");
        assert_eq!(json["metadata"]["resourceVersion"], "1");
        assert_eq!(json["metadata"]["labels"]["provider"], "kelect");
        assert_eq!(json["spec"]["holderIdentity"], "pod-a");
        assert_eq!(json["spec"]["renewTime"], "2024-03-05T07:08:09.000000Z");
        assert_eq!(json["spec"]["leaseDurationSeconds"], 15);
        assert_eq!(json["spec"]["leaseTransitions"], 0);

        let decoded: LeaseRecord = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, record);
    }
}
