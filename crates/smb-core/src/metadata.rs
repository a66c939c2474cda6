//! The bucketing descriptor: how one dataset was partitioned.
//!
//! A [`BucketMetadata`] is immutable once built. Evolving a dataset's layout
//! (doubling the bucket count, changing the key) means building a new descriptor
//! for a new dataset generation.
//!
//! # Example
//!
//! ```rust
//! use smb_core::{BucketMetadata, KeyType};
//!
//! let metadata = BucketMetadata::builder()
//!     .num_buckets(8)
//!     .num_shards(2)
//!     .key_field("location.currentCountry")
//!     .key_type(KeyType::String)
//!     .build()
//!     .unwrap();
//!
//! let text = metadata.to_canonical_string().unwrap();
//! assert_eq!(BucketMetadata::from_canonical_str(&text).unwrap(), metadata);
//! ```

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::bucket::validate_counts;
use crate::error::{Error, Result};
use crate::extract::{KeyExtractor, extract_at};
use crate::hash::HashType;
use crate::key::{Key, KeyType};
use crate::path::FieldPath;
use crate::record::StructuredRecord;
use crate::version::{self, VersionRegistry};

/// Filename prefix used when none is configured.
pub const DEFAULT_FILENAME_PREFIX: &str = "bucket";

/// Versioned record of a dataset's partitioning configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketMetadata {
    version: u32,
    num_buckets: u32,
    num_shards: u32,
    hash_type: HashType,
    key_field: FieldPath,
    key_type: KeyType,
    filename_prefix: String,
}

/// Raw field values shared by the builder and the version decoders.
pub(crate) struct MetadataParts<'a> {
    pub(crate) version: u32,
    pub(crate) num_buckets: u32,
    pub(crate) num_shards: u32,
    pub(crate) hash_type: HashType,
    pub(crate) key_field: &'a str,
    pub(crate) key_type: KeyType,
    pub(crate) filename_prefix: &'a str,
}

impl BucketMetadata {
    /// Starts building a descriptor.
    #[must_use]
    pub fn builder() -> BucketMetadataBuilder {
        BucketMetadataBuilder::default()
    }

    /// Builds a current-version descriptor from all partitioning fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if any value violates the descriptor invariants.
    pub fn new(
        num_buckets: u32,
        num_shards: u32,
        key_type: KeyType,
        hash_type: HashType,
        key_field: &str,
        filename_prefix: &str,
    ) -> Result<Self> {
        Self::builder()
            .num_buckets(num_buckets)
            .num_shards(num_shards)
            .key_type(key_type)
            .hash_type(hash_type)
            .key_field(key_field)
            .filename_prefix(filename_prefix)
            .build()
    }

    /// Validates invariants that hold for every version.
    pub(crate) fn from_parts(parts: &MetadataParts<'_>) -> Result<Self> {
        validate_counts(parts.num_buckets, parts.num_shards)?;
        let key_field = FieldPath::parse(parts.key_field)?;
        if parts.filename_prefix.is_empty() {
            return Err(Error::invalid_config("filenamePrefix must not be empty"));
        }
        Ok(Self {
            version: parts.version,
            num_buckets: parts.num_buckets,
            num_shards: parts.num_shards,
            hash_type: parts.hash_type,
            key_field,
            key_type: parts.key_type,
            filename_prefix: parts.filename_prefix.to_string(),
        })
    }

    /// Returns the format version this descriptor is stamped with.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the bucket count (a power of two).
    #[must_use]
    pub const fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    /// Returns the shard count per bucket.
    #[must_use]
    pub const fn num_shards(&self) -> u32 {
        self.num_shards
    }

    /// Returns the hash function identifier.
    #[must_use]
    pub const fn hash_type(&self) -> HashType {
        self.hash_type
    }

    /// Returns the key field path.
    #[must_use]
    pub const fn key_field(&self) -> &FieldPath {
        &self.key_field
    }

    /// Returns the key type.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Returns the filename prefix tag.
    #[must_use]
    pub fn filename_prefix(&self) -> &str {
        &self.filename_prefix
    }

    /// Returns an extractor for this descriptor's key.
    #[must_use]
    pub fn extractor(&self) -> KeyExtractor {
        KeyExtractor::new(self.key_field.clone(), self.key_type)
    }

    /// Extracts this descriptor's key from `record`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] or [`Error::KeyTypeMismatch`].
    pub fn extract_key<R: StructuredRecord>(&self, record: &R) -> Result<Key> {
        extract_at(&self.key_field, self.key_type, record)
    }

    /// Serializes to the canonical text form of the stamped version.
    ///
    /// # Errors
    ///
    /// See [`VersionRegistry::encode`].
    pub fn to_canonical_string(&self) -> Result<String> {
        version::serialize(self)
    }

    /// Parses the canonical text form.
    ///
    /// # Errors
    ///
    /// See [`VersionRegistry::decode`].
    pub fn from_canonical_str(text: &str) -> Result<Self> {
        version::deserialize(text)
    }

    /// Returns the named attributes exposed to display and debugging tools.
    #[must_use]
    pub fn display_data(&self) -> Vec<DisplayItem> {
        vec![
            DisplayItem::int("numBuckets", self.num_buckets),
            DisplayItem::int("numShards", self.num_shards),
            DisplayItem::int("version", self.version),
            DisplayItem::text("keyField", self.key_field.as_str()),
            DisplayItem::text("keyClass", self.key_type.as_str()),
            DisplayItem::text("hashType", self.hash_type.as_str()),
            DisplayItem::text("keyCoder", self.key_type.encoder_id()),
        ]
    }
}

impl fmt::Display for BucketMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string().map_err(|_| fmt::Error)?)
    }
}

impl FromStr for BucketMetadata {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_canonical_str(s)
    }
}

/// Builder for [`BucketMetadata`].
#[derive(Debug, Clone)]
pub struct BucketMetadataBuilder {
    version: Option<u32>,
    num_buckets: u32,
    num_shards: u32,
    hash_type: HashType,
    key_field: Option<String>,
    key_type: Option<KeyType>,
    filename_prefix: String,
}

impl Default for BucketMetadataBuilder {
    fn default() -> Self {
        Self {
            version: None,
            num_buckets: 1,
            num_shards: 1,
            hash_type: HashType::default(),
            key_field: None,
            key_type: None,
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }
}

impl BucketMetadataBuilder {
    /// Pins the format version instead of stamping the current one.
    #[must_use]
    pub const fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the bucket count. Must be a power of two.
    #[must_use]
    pub const fn num_buckets(mut self, num_buckets: u32) -> Self {
        self.num_buckets = num_buckets;
        self
    }

    /// Sets the shard count per bucket.
    #[must_use]
    pub const fn num_shards(mut self, num_shards: u32) -> Self {
        self.num_shards = num_shards;
        self
    }

    /// Sets the hash function.
    #[must_use]
    pub const fn hash_type(mut self, hash_type: HashType) -> Self {
        self.hash_type = hash_type;
        self
    }

    /// Sets the dotted key field path.
    #[must_use]
    pub fn key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = Some(key_field.into());
        self
    }

    /// Sets the key type.
    #[must_use]
    pub const fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = Some(key_type);
        self
    }

    /// Sets the filename prefix tag.
    #[must_use]
    pub fn filename_prefix(mut self, filename_prefix: impl Into<String>) -> Self {
        self.filename_prefix = filename_prefix.into();
        self
    }

    /// Validates and builds the descriptor.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfiguration`] if the key field or key type is unset, the
    ///   bucket count is not a power of two, the shard count is zero, the path or
    ///   prefix is empty, or a value cannot be expressed in the pinned version.
    /// - [`Error::UnsupportedVersion`] if the pinned version is not registered.
    pub fn build(self) -> Result<BucketMetadata> {
        let registry = VersionRegistry::global();
        let version = self.version.unwrap_or_else(|| registry.current_version());
        let key_field = self
            .key_field
            .ok_or_else(|| Error::invalid_config("keyField is required"))?;
        let key_type = self
            .key_type
            .ok_or_else(|| Error::invalid_config("keyClass is required"))?;

        let format = registry.format(u64::from(version))?;
        let metadata = BucketMetadata::from_parts(&MetadataParts {
            version,
            num_buckets: self.num_buckets,
            num_shards: self.num_shards,
            hash_type: self.hash_type,
            key_field: &key_field,
            key_type,
            filename_prefix: &self.filename_prefix,
        })?;
        format.check(&metadata)?;
        Ok(metadata)
    }
}

/// A typed attribute value for display tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    /// Integer attribute.
    Int(u64),
    /// Text attribute.
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One named, read-only attribute of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayItem {
    /// Attribute name.
    pub key: &'static str,
    /// Attribute value.
    pub value: DisplayValue,
}

impl DisplayItem {
    fn int(key: &'static str, value: u32) -> Self {
        Self {
            key,
            value: DisplayValue::Int(u64::from(value)),
        }
    }

    fn text(key: &'static str, value: &str) -> Self {
        Self {
            key,
            value: DisplayValue::Text(value.to_string()),
        }
    }
}
