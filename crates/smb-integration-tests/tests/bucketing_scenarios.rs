//! End-to-end scenarios: write-side assignment followed by a read-side merge.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::BTreeMap;

use smb_core::{BucketMetadata, Error, Key, KeyType, MergePlan};
use smb_test_utils::{DescriptorFactory, assert_incompatible, init_test_logging, user_record};

/// Buckets `records` under `metadata`, returning keys per bucket.
fn write_dataset(
    metadata: &BucketMetadata,
    records: &[serde_json::Value],
) -> BTreeMap<u32, Vec<Key>> {
    let mut buckets: BTreeMap<u32, Vec<Key>> = BTreeMap::new();
    for record in records {
        let key = metadata.extract_key(record).unwrap();
        let id = metadata.assign(&key);
        buckets.entry(id.bucket).or_default().push(key);
    }
    buckets
}

fn users(countries: &[&str]) -> Vec<serde_json::Value> {
    countries
        .iter()
        .enumerate()
        .map(|(i, c)| user_record(&format!("user{i}"), 20, c))
        .collect()
}

#[test]
fn merge_join_finds_every_matching_key_in_its_group() {
    init_test_logging();
    let factory = DescriptorFactory::by_key("location.currentCountry");
    let left = factory.layout(4, 2);
    let right = factory.layout(16, 3);

    let countries = ["US", "CN", "MX", "FR", "DE", "JP", "BR", "IN", "US", "CN"];
    let left_data = write_dataset(&left, &users(&countries));
    let right_data = write_dataset(&right, &users(&countries[..6]));

    let plan = MergePlan::plan(&[&left, &right]).unwrap();
    assert_eq!(plan.fan_in(), vec![1, 4]);

    for group in plan.groups() {
        let left_keys: Vec<&Key> = group.sources[0]
            .buckets
            .buckets()
            .filter_map(|b| left_data.get(&b))
            .flatten()
            .collect();
        let right_keys: Vec<&Key> = group.sources[1]
            .buckets
            .buckets()
            .filter_map(|b| right_data.get(&b))
            .flatten()
            .collect();
        // Every right key whose value appears on the left must be in this group.
        for key in &right_keys {
            let on_left = left_data.values().flatten().any(|k| k == *key);
            assert_eq!(on_left, left_keys.contains(key), "key {key}");
        }
    }
}

#[test]
fn reader_validates_placement() {
    let metadata = DescriptorFactory::by_key("user").layout(8, 1);
    let assigner = metadata.assigner();
    let data = write_dataset(&metadata, &users(&["US", "CN", "MX"]));
    for (bucket, keys) in &data {
        for key in keys {
            assert!(assigner.validate_placement(key, *bucket));
        }
    }
}

#[test]
fn malformed_record_fails_without_assignment() {
    let metadata = DescriptorFactory::by_key("location.city").buckets(4);
    let record = user_record("a", 1, "US");
    let err = metadata.assign_record(&record).unwrap_err();
    assert!(matches!(err, Error::KeyNotFound { ref segment, .. } if segment == "city"));
    assert!(err.is_record_error());
}

#[test]
fn incompatible_sources_have_no_merge_plan() {
    let by_country = DescriptorFactory::by_key("location.currentCountry").buckets(4);
    let by_age = DescriptorFactory::by_key("age")
        .key_type(KeyType::Int64)
        .buckets(4);
    assert_eq!(assert_incompatible(&by_country, &by_age).len(), 2);
    assert!(MergePlan::plan(&[&by_country, &by_age]).is_none());
}

#[test]
fn legacy_and_current_descriptors_interoperate() {
    let factory = DescriptorFactory::by_key("age").key_type(KeyType::Int32);
    let legacy = factory.legacy(2, 1);
    let current = factory.layout(8, 4);
    let text = legacy.to_canonical_string().unwrap();
    let decoded = BucketMetadata::from_canonical_str(&text).unwrap();
    assert_eq!(decoded.version(), 0);
    assert!(decoded.is_partition_compatible(&current));
    assert_eq!(decoded.partitioning_id(), current.partitioning_id());
}
