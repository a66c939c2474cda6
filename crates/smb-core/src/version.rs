//! Descriptor format versions and the process-wide registry.
//!
//! Every format rule that depends on the stamped `version` lives in this file.
//! A [`FormatVersion`] declares the fields its stamp requires plus the functions
//! that encode and decode them; the [`VersionRegistry`] maps stamps to formats.
//! Registered versions stay decodable forever, and unknown stamps are rejected
//! instead of being parsed on a best-effort basis.
//!
//! | Version | Fields                                                                          |
//! |---------|---------------------------------------------------------------------------------|
//! | 0       | version, numBuckets, numShards, hashType, keyField, keyClass (prefix implied)   |
//! | 1       | version 0 fields + filenamePrefix                                               |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::canonical_json::to_canonical_string;
use crate::error::{Error, Result};
use crate::hash::HashType;
use crate::key::KeyType;
use crate::metadata::{BucketMetadata, DEFAULT_FILENAME_PREFIX, MetadataParts};

/// Version stamped on descriptors that do not pin one.
pub const CURRENT_VERSION: u32 = 1;

static GLOBAL: OnceLock<VersionRegistry> = OnceLock::new();

/// Encoding and decoding rules for one descriptor version.
#[derive(Debug, Clone, Copy)]
pub struct FormatVersion {
    version: u32,
    required_fields: &'static [&'static str],
    encode: fn(&BucketMetadata) -> Result<String>,
    decode: fn(Value) -> Result<BucketMetadata>,
    check: fn(&BucketMetadata) -> Result<()>,
}

impl FormatVersion {
    /// Returns the version stamp.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the top-level fields a descriptor with this stamp must carry.
    #[must_use]
    pub const fn required_fields(&self) -> &'static [&'static str] {
        self.required_fields
    }

    /// Checks that `metadata` is expressible under this version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when a field value has no encoding here.
    pub fn check(&self, metadata: &BucketMetadata) -> Result<()> {
        (self.check)(metadata)
    }
}

/// Maps version stamps to their [`FormatVersion`].
///
/// Built once and read-only afterwards; lookups take no locks.
#[derive(Debug)]
pub struct VersionRegistry {
    formats: BTreeMap<u32, FormatVersion>,
    current: u32,
}

impl VersionRegistry {
    /// Returns the process-wide registry, building it on first use.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::standard)
    }

    /// Builds the registry of every version this library can read.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            formats: [v0::FORMAT, v1::FORMAT]
                .into_iter()
                .map(|format| (format.version, format))
                .collect(),
            current: CURRENT_VERSION,
        }
    }

    /// Builds a registry from explicit formats, e.g. a reader pinned to older stamps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if a version is registered twice or
    /// `current` is not among `formats`.
    pub fn from_formats(formats: &[FormatVersion], current: u32) -> Result<Self> {
        let mut map = BTreeMap::new();
        for format in formats {
            if map.insert(format.version, *format).is_some() {
                return Err(Error::invalid_config(format!(
                    "version {} registered twice",
                    format.version
                )));
            }
        }
        if !map.contains_key(&current) {
            return Err(Error::invalid_config(format!(
                "current version {current} is not registered"
            )));
        }
        Ok(Self {
            formats: map,
            current,
        })
    }

    /// Returns the version written when none is pinned.
    #[must_use]
    pub const fn current_version(&self) -> u32 {
        self.current
    }

    /// Returns every registered version in ascending order.
    #[must_use]
    pub fn versions(&self) -> Vec<u32> {
        self.formats.keys().copied().collect()
    }

    /// Looks up the format for a stamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] if the stamp is not registered.
    pub fn format(&self, version: u64) -> Result<&FormatVersion> {
        u32::try_from(version)
            .ok()
            .and_then(|v| self.formats.get(&v))
            .ok_or_else(|| Error::UnsupportedVersion {
                version,
                supported: self.versions(),
            })
    }

    /// Encodes `metadata` under its own stamped version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedVersion`] if the stamp is unknown to this registry,
    /// or [`Error::Serialization`] if canonical encoding fails.
    pub fn encode(&self, metadata: &BucketMetadata) -> Result<String> {
        let format = self.format(u64::from(metadata.version()))?;
        format.check(metadata)?;
        (format.encode)(metadata)
    }

    /// Decodes a descriptor, dispatching on its `version` field.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedDescriptor`] if the text is not a JSON object, `version` is
    ///   missing or not a non-negative integer, a required field is missing or
    ///   unparseable, or the decoded values violate descriptor invariants.
    /// - [`Error::UnsupportedVersion`] if the stamp is not registered.
    pub fn decode(&self, text: &str) -> Result<BucketMetadata> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| Error::malformed(format!("descriptor is not valid JSON: {e}")))?;
        let version = value
            .as_object()
            .ok_or_else(|| Error::malformed("descriptor must be a JSON object"))?
            .get("version")
            .ok_or_else(|| Error::malformed("missing required field 'version'"))?
            .as_u64()
            .ok_or_else(|| Error::malformed("'version' must be a non-negative integer"))?;

        let format = self.format(version)?;
        let metadata = (format.decode)(value)?;
        format.check(&metadata).map_err(into_malformed)?;

        if metadata.version() == self.current {
            tracing::debug!(
                version = metadata.version(),
                key_field = %metadata.key_field(),
                num_buckets = metadata.num_buckets(),
                "decoded bucket descriptor"
            );
        } else {
            tracing::warn!(
                version = metadata.version(),
                current = self.current,
                key_field = %metadata.key_field(),
                "decoded bucket descriptor written under a legacy format version"
            );
        }
        Ok(metadata)
    }
}

/// Serializes `metadata` with the process-wide registry.
///
/// # Errors
///
/// See [`VersionRegistry::encode`].
pub fn serialize(metadata: &BucketMetadata) -> Result<String> {
    VersionRegistry::global().encode(metadata)
}

/// Deserializes a descriptor with the process-wide registry.
///
/// # Errors
///
/// See [`VersionRegistry::decode`].
pub fn deserialize(text: &str) -> Result<BucketMetadata> {
    VersionRegistry::global().decode(text)
}

/// Corrupt values in a stored descriptor are a malformed descriptor, not a caller mistake.
fn into_malformed(err: Error) -> Error {
    match err {
        Error::InvalidConfiguration { message } => Error::MalformedDescriptor { message },
        other => other,
    }
}

fn wire_error(version: u32, err: &serde_json::Error) -> Error {
    Error::malformed(format!("version {version} descriptor: {err}"))
}

mod v0 {
    use super::{
        BucketMetadata, DEFAULT_FILENAME_PREFIX, Deserialize, Error, FormatVersion, HashType,
        KeyType, MetadataParts, Result, Serialize, Value, into_malformed, to_canonical_string,
        wire_error,
    };

    pub(super) const FORMAT: FormatVersion = FormatVersion {
        version: 0,
        required_fields: &[
            "version",
            "numBuckets",
            "numShards",
            "hashType",
            "keyField",
            "keyClass",
        ],
        encode,
        decode,
        check,
    };

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Wire {
        version: u32,
        num_buckets: u32,
        num_shards: u32,
        hash_type: HashType,
        key_field: String,
        key_class: KeyType,
    }

    fn encode(metadata: &BucketMetadata) -> Result<String> {
        let wire = Wire {
            version: metadata.version(),
            num_buckets: metadata.num_buckets(),
            num_shards: metadata.num_shards(),
            hash_type: metadata.hash_type(),
            key_field: metadata.key_field().to_string(),
            key_class: metadata.key_type(),
        };
        Ok(to_canonical_string(&wire)?)
    }

    fn decode(value: Value) -> Result<BucketMetadata> {
        let wire: Wire = serde_json::from_value(value).map_err(|e| wire_error(0, &e))?;
        BucketMetadata::from_parts(&MetadataParts {
            version: wire.version,
            num_buckets: wire.num_buckets,
            num_shards: wire.num_shards,
            hash_type: wire.hash_type,
            key_field: &wire.key_field,
            key_type: wire.key_class,
            filename_prefix: DEFAULT_FILENAME_PREFIX,
        })
        .map_err(into_malformed)
    }

    fn check(metadata: &BucketMetadata) -> Result<()> {
        if metadata.filename_prefix() == DEFAULT_FILENAME_PREFIX {
            Ok(())
        } else {
            Err(Error::invalid_config(format!(
                "version 0 cannot record filenamePrefix '{}' (only '{DEFAULT_FILENAME_PREFIX}')",
                metadata.filename_prefix()
            )))
        }
    }
}

mod v1 {
    use super::{
        BucketMetadata, Deserialize, FormatVersion, HashType, KeyType, MetadataParts, Result,
        Serialize, Value, into_malformed, to_canonical_string, wire_error,
    };

    pub(super) const FORMAT: FormatVersion = FormatVersion {
        version: 1,
        required_fields: &[
            "version",
            "numBuckets",
            "numShards",
            "hashType",
            "keyField",
            "keyClass",
            "filenamePrefix",
        ],
        encode,
        decode,
        check,
    };

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Wire {
        version: u32,
        num_buckets: u32,
        num_shards: u32,
        hash_type: HashType,
        key_field: String,
        key_class: KeyType,
        filename_prefix: String,
    }

    fn encode(metadata: &BucketMetadata) -> Result<String> {
        let wire = Wire {
            version: metadata.version(),
            num_buckets: metadata.num_buckets(),
            num_shards: metadata.num_shards(),
            hash_type: metadata.hash_type(),
            key_field: metadata.key_field().to_string(),
            key_class: metadata.key_type(),
            filename_prefix: metadata.filename_prefix().to_string(),
        };
        Ok(to_canonical_string(&wire)?)
    }

    fn decode(value: Value) -> Result<BucketMetadata> {
        let wire: Wire = serde_json::from_value(value).map_err(|e| wire_error(1, &e))?;
        BucketMetadata::from_parts(&MetadataParts {
            version: wire.version,
            num_buckets: wire.num_buckets,
            num_shards: wire.num_shards,
            hash_type: wire.hash_type,
            key_field: &wire.key_field,
            key_type: wire.key_class,
            filename_prefix: &wire.filename_prefix,
        })
        .map_err(into_malformed)
    }

    // Every validated descriptor has a version 1 encoding.
    #[allow(clippy::unnecessary_wraps)]
    fn check(_metadata: &BucketMetadata) -> Result<()> {
        Ok(())
    }
}
