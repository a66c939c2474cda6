//! Partition compatibility between descriptors.
//!
//! Two datasets can be merge-joined bucket by bucket iff they hash the same key
//! the same way: equal hash type, equal key field, equal key type, and bucket
//! counts that divide one another. Shard counts and filename prefixes never
//! matter. Bucket counts are powers of two, so the last condition always holds
//! for validated descriptors; it is still reported if violated.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

use crate::hash::HashType;
use crate::key::KeyType;
use crate::metadata::BucketMetadata;

/// One reason two descriptors cannot be merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Mismatch {
    /// Different hash functions.
    HashType {
        /// Left descriptor's hash type.
        left: HashType,
        /// Right descriptor's hash type.
        right: HashType,
    },
    /// Different key field paths.
    KeyField {
        /// Left descriptor's key field.
        left: String,
        /// Right descriptor's key field.
        right: String,
    },
    /// Different key types.
    KeyType {
        /// Left descriptor's key type.
        left: KeyType,
        /// Right descriptor's key type.
        right: KeyType,
    },
    /// Bucket counts that do not divide one another.
    BucketRatio {
        /// Left descriptor's bucket count.
        left: u32,
        /// Right descriptor's bucket count.
        right: u32,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashType { left, right } => write!(f, "hashType differs: {left} vs {right}"),
            Self::KeyField { left, right } => write!(f, "keyField differs: '{left}' vs '{right}'"),
            Self::KeyType { left, right } => write!(f, "keyClass differs: {left} vs {right}"),
            Self::BucketRatio { left, right } => {
                write!(f, "bucket counts {left} and {right} are not multiples")
            }
        }
    }
}

/// Every mismatch between two descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    left_buckets: u32,
    right_buckets: u32,
    mismatches: Vec<Mismatch>,
}

impl CompatibilityReport {
    /// Returns true if no mismatch was found.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Returns the mismatches in field order.
    #[must_use]
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Returns how many buckets of the larger layout make up one bucket of the
    /// smaller layout, or `None` if the descriptors are incompatible.
    #[must_use]
    pub fn rebucket_ratio(&self) -> Option<u32> {
        if !self.is_compatible() {
            return None;
        }
        let (small, large) = if self.left_buckets <= self.right_buckets {
            (self.left_buckets, self.right_buckets)
        } else {
            (self.right_buckets, self.left_buckets)
        };
        Some(large / small)
    }
}

/// Compares two descriptors field by field.
#[must_use]
pub fn compatibility(left: &BucketMetadata, right: &BucketMetadata) -> CompatibilityReport {
    let mut mismatches = Vec::new();
    if left.hash_type() != right.hash_type() {
        mismatches.push(Mismatch::HashType {
            left: left.hash_type(),
            right: right.hash_type(),
        });
    }
    if left.key_field() != right.key_field() {
        mismatches.push(Mismatch::KeyField {
            left: left.key_field().to_string(),
            right: right.key_field().to_string(),
        });
    }
    if left.key_type() != right.key_type() {
        mismatches.push(Mismatch::KeyType {
            left: left.key_type(),
            right: right.key_type(),
        });
    }
    let (small, large) = (
        left.num_buckets().min(right.num_buckets()),
        left.num_buckets().max(right.num_buckets()),
    );
    if small == 0 || large % small != 0 {
        mismatches.push(Mismatch::BucketRatio {
            left: left.num_buckets(),
            right: right.num_buckets(),
        });
    }

    for mismatch in &mismatches {
        tracing::debug!(%mismatch, "descriptors are not partition compatible");
    }

    CompatibilityReport {
        left_buckets: left.num_buckets(),
        right_buckets: right.num_buckets(),
        mismatches,
    }
}

/// Returns true if datasets written under `left` and `right` can be merge-joined.
#[must_use]
pub fn is_partition_compatible(left: &BucketMetadata, right: &BucketMetadata) -> bool {
    compatibility(left, right).is_compatible()
}

impl BucketMetadata {
    /// Compares this descriptor with `other`. See [`compatibility`].
    #[must_use]
    pub fn compatibility(&self, other: &Self) -> CompatibilityReport {
        compatibility(self, other)
    }

    /// Returns true if this descriptor is partition compatible with `other`.
    #[must_use]
    pub fn is_partition_compatible(&self, other: &Self) -> bool {
        is_partition_compatible(self, other)
    }

    /// Returns the identifier shared by every descriptor this one is compatible with.
    #[must_use]
    pub fn partitioning_id(&self) -> PartitioningId {
        let key_field = self.key_field().as_str();
        PartitioningId::derive(self.hash_type(), self.key_type(), key_field)
    }
}

/// Stable identifier of a partitioning scheme, independent of bucket and shard counts.
///
/// Format: `smb_` followed by 16 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PartitioningId(String);

impl PartitioningId {
    /// Derives the id from the fields that decide compatibility.
    ///
    /// Each field is hashed as a big-endian u32 length followed by its UTF-8 bytes,
    /// so field boundaries cannot collide.
    #[must_use]
    pub fn derive(hash_type: HashType, key_type: KeyType, key_field: &str) -> Self {
        let mut hasher = Sha256::new();
        for part in [hash_type.as_str(), key_type.as_str(), key_field] {
            let len = u32::try_from(part.len()).unwrap_or(u32::MAX);
            hasher.update(len.to_be_bytes());
            hasher.update(part.as_bytes());
        }
        let digest = hex::encode(hasher.finalize());
        Self(format!("smb_{}", &digest[..16]))
    }

    /// Returns the id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitioningId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DEFAULT_FILENAME_PREFIX;

    fn descriptor(
        buckets: u32,
        key_type: KeyType,
        hash_type: HashType,
        key_field: &str,
    ) -> BucketMetadata {
        BucketMetadata::new(
            buckets,
            1,
            key_type,
            hash_type,
            key_field,
            DEFAULT_FILENAME_PREFIX,
        )
        .unwrap()
    }

    fn color(buckets: u32) -> BucketMetadata {
        let murmur = HashType::Murmur3_32;
        descriptor(buckets, KeyType::String, murmur, "favorite_color")
    }

    fn color_as(key_type: KeyType, buckets: u32) -> BucketMetadata {
        let murmur = HashType::Murmur3_32;
        descriptor(buckets, key_type, murmur, "favorite_color")
    }

    #[test]
    fn different_key_fields_are_incompatible() {
        let murmur = HashType::Murmur3_32;
        let country = descriptor(2, KeyType::String, murmur, "favorite_country");
        let report = compatibility(&country, &color(2));
        assert!(!report.is_compatible());
        assert_eq!(
            report.mismatches(),
            &[Mismatch::KeyField {
                left: "favorite_country".into(),
                right: "favorite_color".into(),
            }]
        );
        assert_eq!(report.rebucket_ratio(), None);
    }

    #[test]
    fn bucket_count_differences_are_compatible() {
        let report = compatibility(&color(2), &color(4));
        assert!(report.is_compatible());
        assert_eq!(report.rebucket_ratio(), Some(2));
        let same = compatibility(&color(4), &color(4));
        assert_eq!(same.rebucket_ratio(), Some(1));
    }

    #[test]
    fn different_key_types_are_incompatible() {
        let long = color_as(KeyType::Int64, 4);
        assert!(!color(4).is_partition_compatible(&long));
        assert!(!long.is_partition_compatible(&color(4)));
    }

    #[test]
    fn different_hash_types_are_incompatible() {
        let wide = HashType::Murmur3_128;
        let other = descriptor(4, KeyType::String, wide, "favorite_color");
        let report = color(4).compatibility(&other);
        assert!(matches!(report.mismatches(), [Mismatch::HashType { .. }]));
    }

    #[test]
    fn shards_and_prefix_are_ignored() {
        let other = BucketMetadata::new(
            8,
            5,
            KeyType::String,
            HashType::Murmur3_32,
            "favorite_color",
            "part",
        )
        .unwrap();
        assert!(is_partition_compatible(&color(2), &other));
    }

    #[test]
    fn reports_every_mismatch() {
        let other = descriptor(2, KeyType::Int32, HashType::Murmur3_128, "age");
        assert_eq!(compatibility(&color(4), &other).mismatches().len(), 3);
    }

    #[test]
    fn partitioning_id_tracks_compatibility() {
        let id = color(2).partitioning_id();
        assert!(id.as_str().starts_with("smb_"));
        assert_eq!(id.as_str().len(), 20);
        assert_eq!(id, color(16).partitioning_id());
        assert_ne!(id, color_as(KeyType::Int64, 2).partitioning_id());
    }

    #[test]
    fn mismatch_serializes_with_kind_tag() {
        let json = serde_json::to_value(Mismatch::KeyType {
            left: KeyType::String,
            right: KeyType::Int64,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "keyType", "left": "string", "right": "int64"})
        );
    }
}
