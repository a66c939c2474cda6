//! # smb-core
//!
//! Partitioning core for sort-merge bucketed (SMB) datasets.
//!
//! A dataset is split into a power-of-two number of buckets by hashing a key
//! taken from each record; each bucket may be further split into shards. A small
//! versioned descriptor records how that was done, so that two datasets bucketed
//! the same way can later be joined bucket by bucket without a shuffle.
//!
//! - **Key extraction**: resolve a dotted field path inside a structured record
//! - **Key encoding and hashing**: fixed bytes per key type, Murmur3 over them
//! - **Bucket assignment**: `(bucket, shard)` from the hash
//! - **Descriptors**: [`BucketMetadata`], versioned canonical JSON
//! - **Compatibility**: whether two descriptors can be merge-joined, and how
//!
//! ## Example
//!
//! ```rust
//! use smb_core::prelude::*;
//! use serde_json::json;
//!
//! let metadata = BucketMetadata::builder()
//!     .num_buckets(16)
//!     .num_shards(4)
//!     .key_field("location.currentCountry")
//!     .key_type(KeyType::String)
//!     .build()
//!     .unwrap();
//!
//! let record = json!({"user": "Alice", "location": {"currentCountry": "US"}});
//! let id = metadata.assign_record(&record).unwrap();
//! assert!(id.bucket < 16 && id.shard < 4);
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod bucket;
pub mod canonical_json;
pub mod compat;
pub mod error;
pub mod extract;
pub mod hash;
pub mod key;
pub mod merge;
pub mod metadata;
pub mod observability;
pub mod path;
pub mod record;
pub mod version;

/// Prelude module for convenient imports.
///
/// ```rust
/// use smb_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bucket::{BucketAssigner, BucketGroup, BucketShardId, rebucket_group};
    pub use crate::compat::{CompatibilityReport, Mismatch, PartitioningId};
    pub use crate::error::{Error, Result};
    pub use crate::extract::KeyExtractor;
    pub use crate::hash::HashType;
    pub use crate::key::{Key, KeyType};
    pub use crate::merge::{MergeGroup, MergePlan, SourceGroup};
    pub use crate::metadata::{BucketMetadata, DisplayItem, DisplayValue};
    pub use crate::path::FieldPath;
    pub use crate::record::{ScalarRef, StructuredRecord};
}

// Re-export key types at crate root for ergonomics
pub use bucket::{BucketAssigner, BucketGroup, BucketShardId, rebucket_group};
pub use compat::{
    CompatibilityReport, Mismatch, PartitioningId, compatibility, is_partition_compatible,
};
pub use error::{Error, Result};
pub use extract::KeyExtractor;
pub use hash::HashType;
pub use key::{Key, KeyType};
pub use merge::{MergeGroup, MergePlan, SourceGroup};
pub use metadata::{
    BucketMetadata, BucketMetadataBuilder, DEFAULT_FILENAME_PREFIX, DisplayItem, DisplayValue,
};
pub use observability::{LogFormat, init_logging};
pub use path::FieldPath;
pub use record::{ScalarRef, StructuredRecord};
pub use version::{CURRENT_VERSION, FormatVersion, VersionRegistry, deserialize, serialize};
