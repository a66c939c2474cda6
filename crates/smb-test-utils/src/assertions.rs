//! Custom assertion helpers for integration tests.

use smb_core::{BucketMetadata, Mismatch, deserialize, serialize};

/// Asserts that two descriptors are partition compatible, in both directions.
///
/// # Panics
///
/// Panics if either direction reports a mismatch.
pub fn assert_compatible(left: &BucketMetadata, right: &BucketMetadata) {
    let report = left.compatibility(right);
    assert!(
        report.is_compatible(),
        "Expected compatible descriptors, got mismatches: {:?}",
        report.mismatches()
    );
    assert!(
        right.is_partition_compatible(left),
        "Compatibility should be symmetric"
    );
}

/// Asserts that two descriptors are incompatible and returns the reported mismatches.
///
/// # Panics
///
/// Panics if the descriptors are compatible or the answer is not symmetric.
pub fn assert_incompatible(left: &BucketMetadata, right: &BucketMetadata) -> Vec<Mismatch> {
    let report = left.compatibility(right);
    assert!(
        !report.is_compatible(),
        "Expected incompatible descriptors: {left} vs {right}"
    );
    assert!(
        !right.is_partition_compatible(left),
        "Compatibility should be symmetric"
    );
    report.mismatches().to_vec()
}

/// Asserts that a descriptor survives serialization unchanged, and that
/// re-serializing the decoded copy yields identical text.
///
/// # Panics
///
/// Panics if encoding or decoding fails, or either comparison differs.
pub fn assert_round_trips(metadata: &BucketMetadata) {
    let text = serialize(metadata).expect("descriptor should serialize");
    let decoded = deserialize(&text).expect("descriptor should deserialize");
    assert_eq!(&decoded, metadata, "Round trip changed the descriptor");
    assert_eq!(
        serialize(&decoded).expect("descriptor should serialize"),
        text,
        "Re-serialization is not byte-identical"
    );
}
