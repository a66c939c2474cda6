//! Contract tests for descriptor compatibility and key extraction.

use serde_json::json;
use smb_core::prelude::*;
use smb_core::{CURRENT_VERSION, DEFAULT_FILENAME_PREFIX};

fn metadata(num_buckets: u32, key_type: KeyType, key_field: &str) -> BucketMetadata {
    BucketMetadata::new(
        num_buckets,
        1,
        key_type,
        HashType::Murmur3_32,
        key_field,
        DEFAULT_FILENAME_PREFIX,
    )
    .expect("valid descriptor")
}

#[test]
fn test_different_key_fields_are_incompatible() {
    let country = metadata(2, KeyType::String, "favorite_country");
    let color = metadata(2, KeyType::String, "favorite_color");
    assert!(!country.is_partition_compatible(&color));
    assert!(!color.is_partition_compatible(&country));
}

#[test]
fn test_different_bucket_counts_are_compatible() {
    let two = metadata(2, KeyType::String, "favorite_color");
    let four = metadata(4, KeyType::String, "favorite_color");
    assert!(two.is_partition_compatible(&four));
    assert!(four.is_partition_compatible(&two));
}

#[test]
fn test_different_key_types_are_incompatible() {
    let string = metadata(4, KeyType::String, "favorite_color");
    let long = metadata(4, KeyType::Int64, "favorite_color");
    assert!(!string.is_partition_compatible(&long));
    assert!(!long.is_partition_compatible(&string));
}

#[test]
fn test_nested_key_extraction() {
    let record = json!({
        "user": "Alice",
        "age": 10,
        "location": {
            "currentCountry": "US",
            "prevCountries": ["CN", "MX"]
        }
    });

    let age = metadata(1, KeyType::Int32, "age");
    assert_eq!(age.extract_key(&record).unwrap(), Key::Int32(10));

    let country = metadata(1, KeyType::String, "location.currentCountry");
    assert_eq!(country.extract_key(&record).unwrap(), Key::from("US"));
}

#[test]
fn test_descriptor_round_trip_and_default_version() {
    let original = metadata(1, KeyType::String, "favorite_color");
    assert_eq!(original.version(), CURRENT_VERSION);
    let text = original.to_canonical_string().unwrap();
    let decoded = BucketMetadata::from_canonical_str(&text).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn test_merge_plan_between_compatible_layouts() {
    let small = metadata(2, KeyType::String, "favorite_color");
    let large = metadata(8, KeyType::String, "favorite_color");
    let plan = MergePlan::plan(&[&small, &large]).unwrap();
    assert_eq!(plan.target_buckets(), 2);
    let group = plan.bucket_group(0).unwrap();
    let buckets: Vec<u32> = group.sources[1].buckets.buckets().collect();
    assert_eq!(buckets, vec![0, 2, 4, 6]);
}

#[test]
fn test_records_in_merged_buckets_agree() {
    // A key's bucket in the small layout is its bucket in the large layout
    // reduced modulo the small count.
    let small = metadata(4, KeyType::String, "user");
    let large = metadata(32, KeyType::String, "user");
    for name in ["Alice", "Bob", "Carol", "Dave", "Eve", "Mallory"] {
        let record = json!({ "user": name });
        let a = small.assign_record(&record).unwrap().bucket;
        let b = large.assign_record(&record).unwrap().bucket;
        assert_eq!(b % 4, a, "key {name}");
    }
}
