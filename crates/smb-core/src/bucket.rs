//! Bucket and shard assignment.
//!
//! `bucket = hash & (num_buckets - 1)`. Because bucket counts are powers of two,
//! the bucket of a key under `2^m` buckets is the bucket under `2^n` buckets
//! (`n > m`) reduced modulo `2^m`. That is the re-bucketing property: bucket `i`
//! of the smaller layout is exactly the union of buckets `{ j : j mod 2^m == i }`
//! of the larger one.
//!
//! Shards subdivide a bucket for write parallelism only. The shard is taken from
//! the hash bits above the bucket mask, so it is deterministic per key and never
//! influences which bucket a key belongs to.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::hash::HashType;
use crate::key::Key;
use crate::metadata::BucketMetadata;
use crate::record::StructuredRecord;

/// Concrete coordinates of a record within a bucketed dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketShardId {
    /// Bucket index in `[0, num_buckets)`.
    pub bucket: u32,
    /// Shard index in `[0, num_shards)`.
    pub shard: u32,
}

impl fmt::Display for BucketShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bucket-{:05}/shard-{:05}", self.bucket, self.shard)
    }
}

/// Routes keys to `(bucket, shard)` for one descriptor.
///
/// Holds only copies of the descriptor's counts and hash type, so it is `Copy`
/// and can be handed to any number of worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketAssigner {
    hash_type: HashType,
    num_buckets: u32,
    num_shards: u32,
}

impl BucketAssigner {
    /// Creates an assigner for raw counts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] unless `num_buckets` is a power of two
    /// and `num_shards` is at least one.
    pub fn new(hash_type: HashType, num_buckets: u32, num_shards: u32) -> Result<Self> {
        validate_counts(num_buckets, num_shards)?;
        Ok(Self {
            hash_type,
            num_buckets,
            num_shards,
        })
    }

    /// Creates the assigner described by `metadata`.
    #[must_use]
    pub fn for_metadata(metadata: &BucketMetadata) -> Self {
        // Counts were validated when the descriptor was built.
        Self {
            hash_type: metadata.hash_type(),
            num_buckets: metadata.num_buckets(),
            num_shards: metadata.num_shards(),
        }
    }

    /// Returns the number of buckets.
    #[must_use]
    pub const fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    /// Returns the number of shards per bucket.
    #[must_use]
    pub const fn num_shards(&self) -> u32 {
        self.num_shards
    }

    /// Hashes a key's encoded bytes.
    #[must_use]
    pub fn hash_key(&self, key: &Key) -> u32 {
        self.hash_type.hash(&key.encode())
    }

    /// Maps a hash value to its bucket.
    #[must_use]
    pub const fn bucket_for_hash(&self, hash: u32) -> u32 {
        hash & (self.num_buckets - 1)
    }

    /// Maps a hash value to its shard within the bucket.
    #[must_use]
    pub const fn shard_for_hash(&self, hash: u32) -> u32 {
        (hash >> self.num_buckets.trailing_zeros()) % self.num_shards
    }

    /// Assigns `key` to its bucket and shard.
    #[must_use]
    pub fn assign(&self, key: &Key) -> BucketShardId {
        let hash = self.hash_key(key);
        BucketShardId {
            bucket: self.bucket_for_hash(hash),
            shard: self.shard_for_hash(hash),
        }
    }

    /// Returns true if `key` belongs in `bucket`.
    ///
    /// Readers use this to validate placement; it never re-routes.
    #[must_use]
    pub fn validate_placement(&self, key: &Key, bucket: u32) -> bool {
        self.bucket_for_hash(self.hash_key(key)) == bucket
    }
}

impl BucketMetadata {
    /// Returns the assigner for this descriptor.
    #[must_use]
    pub fn assigner(&self) -> BucketAssigner {
        BucketAssigner::for_metadata(self)
    }

    /// Assigns an already extracted key.
    #[must_use]
    pub fn assign(&self, key: &Key) -> BucketShardId {
        self.assigner().assign(key)
    }

    /// Extracts the key from `record` and assigns it.
    ///
    /// # Errors
    ///
    /// Propagates extraction failures ([`Error::KeyNotFound`], [`Error::KeyTypeMismatch`]).
    pub fn assign_record<R: StructuredRecord>(&self, record: &R) -> Result<BucketShardId> {
        let key = self.extract_key(record)?;
        Ok(self.assign(&key))
    }
}

/// Buckets of a larger layout that together hold one bucket of a smaller layout.
///
/// Bucket `i` of a `from`-bucket layout is the buckets `i, i + from, i + 2 * from, ...`
/// of a `to`-bucket layout. The group is stored as that arithmetic progression, so
/// it costs the same for 2 buckets as for 2^31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BucketGroup {
    first: u32,
    stride: u32,
    count: u32,
}

impl BucketGroup {
    /// Lists shown in full by `Display`; longer groups print as a range.
    const DISPLAY_LIMIT: u32 = 16;

    /// Returns the lowest bucket in the group.
    #[must_use]
    pub const fn first(&self) -> u32 {
        self.first
    }

    /// Returns the distance between consecutive buckets (the smaller bucket count).
    #[must_use]
    pub const fn stride(&self) -> u32 {
        self.stride
    }

    /// Returns how many buckets the group holds (the fan-in).
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Returns the highest bucket in the group.
    #[must_use]
    pub const fn last(&self) -> u32 {
        self.first + (self.count - 1) * self.stride
    }

    /// Returns true if `bucket` is part of the group.
    #[must_use]
    pub const fn contains(&self, bucket: u32) -> bool {
        bucket >= self.first && bucket <= self.last() && (bucket - self.first) % self.stride == 0
    }

    /// Iterates the bucket indices in ascending order.
    pub fn buckets(self) -> impl Iterator<Item = u32> {
        (0..self.count).map(move |i| self.first + i * self.stride)
    }
}

impl fmt::Display for BucketGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count > Self::DISPLAY_LIMIT {
            let (first, last) = (self.first, self.last());
            return write!(f, "{first}..={last} step {}", self.stride);
        }
        for (i, bucket) in self.buckets().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{bucket}")?;
        }
        Ok(())
    }
}

/// Returns the buckets of a `to_buckets` layout that together hold bucket `bucket`
/// of a `from_buckets` layout.
///
/// # Errors
///
/// Returns [`Error::InvalidConfiguration`] if either count is not a power of two,
/// `to_buckets < from_buckets`, or `bucket` is out of range.
pub fn rebucket_group(bucket: u32, from_buckets: u32, to_buckets: u32) -> Result<BucketGroup> {
    validate_counts(from_buckets, 1)?;
    validate_counts(to_buckets, 1)?;
    if to_buckets < from_buckets {
        return Err(Error::invalid_config(format!(
            "cannot fan in from {from_buckets} buckets to fewer ({to_buckets})"
        )));
    }
    if bucket >= from_buckets {
        return Err(Error::invalid_config(format!(
            "bucket {bucket} out of range for {from_buckets} buckets"
        )));
    }
    Ok(BucketGroup {
        first: bucket,
        stride: from_buckets,
        count: to_buckets / from_buckets,
    })
}

pub(crate) fn validate_counts(num_buckets: u32, num_shards: u32) -> Result<()> {
    if !num_buckets.is_power_of_two() {
        return Err(Error::invalid_config(format!(
            "numBuckets must be a power of two >= 1, got {num_buckets}"
        )));
    }
    if num_shards == 0 {
        return Err(Error::invalid_config("numShards must be >= 1, got 0"));
    }
    Ok(())
}
