//! Pre-built descriptors and records for common test scenarios.

use serde_json::{Value, json};
use smb_core::{BucketMetadata, DEFAULT_FILENAME_PREFIX, HashType, KeyType};

/// Builds descriptors that share a key and differ only in layout.
#[derive(Debug, Clone)]
pub struct DescriptorFactory {
    key_field: String,
    key_type: KeyType,
    hash_type: HashType,
    filename_prefix: String,
}

impl DescriptorFactory {
    /// Creates a factory for a string key at `key_field`.
    pub fn by_key(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            key_type: KeyType::String,
            hash_type: HashType::Murmur3_32,
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
        }
    }

    /// Sets the key type.
    #[must_use]
    pub fn key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    /// Sets the hash type.
    #[must_use]
    pub fn hash_type(mut self, hash_type: HashType) -> Self {
        self.hash_type = hash_type;
        self
    }

    /// Sets the filename prefix.
    #[must_use]
    pub fn filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    /// Builds a one-shard descriptor with `num_buckets` buckets.
    pub fn buckets(&self, num_buckets: u32) -> BucketMetadata {
        self.layout(num_buckets, 1)
    }

    /// Builds a descriptor with the given layout.
    pub fn layout(&self, num_buckets: u32, num_shards: u32) -> BucketMetadata {
        BucketMetadata::new(
            num_buckets,
            num_shards,
            self.key_type,
            self.hash_type,
            &self.key_field,
            &self.filename_prefix,
        )
        .expect("factory descriptor should be valid")
    }

    /// Builds a version 0 descriptor with the given layout.
    pub fn legacy(&self, num_buckets: u32, num_shards: u32) -> BucketMetadata {
        BucketMetadata::builder()
            .version(0)
            .num_buckets(num_buckets)
            .num_shards(num_shards)
            .hash_type(self.hash_type)
            .key_field(self.key_field.as_str())
            .key_type(self.key_type)
            .build()
            .expect("factory descriptor should be valid")
    }
}

/// A user record with a nested location, as a JSON row.
pub fn user_record(user: &str, age: i64, country: &str) -> Value {
    json!({
        "user": user,
        "age": age,
        "location": {
            "currentCountry": country,
            "prevCountries": ["CN", "MX"]
        }
    })
}

/// The canonical example user: Alice, 10, currently in the US.
pub fn alice() -> Value {
    user_record("Alice", 10, "US")
}

/// A user record as a schema-typed Avro value, with the location behind a nullable union.
#[cfg(feature = "avro")]
pub fn avro_user_record(user: &str, age: i32, country: &str) -> apache_avro::types::Value {
    use apache_avro::types::Value as AvroValue;

    AvroValue::Record(vec![
        ("user".into(), AvroValue::String(user.into())),
        ("age".into(), AvroValue::Int(age)),
        (
            "location".into(),
            AvroValue::Union(
                1,
                Box::new(AvroValue::Record(vec![
                    ("currentCountry".into(), AvroValue::String(country.into())),
                    (
                        "prevCountries".into(),
                        AvroValue::Array(vec![
                            AvroValue::String("CN".into()),
                            AvroValue::String("MX".into()),
                        ]),
                    ),
                ])),
            ),
        ),
    ])
}
