//! All-or-nothing key extraction from structured records.

use crate::error::{Error, Result};
use crate::key::{Key, KeyType};
use crate::path::FieldPath;
use crate::record::{ScalarRef, StructuredRecord};

/// Resolves a field path against a record and converts the leaf to a typed key.
///
/// Pure: the result depends only on `(record, path, key_type)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExtractor {
    path: FieldPath,
    key_type: KeyType,
}

impl KeyExtractor {
    /// Creates an extractor for `path` producing keys of `key_type`.
    #[must_use]
    pub const fn new(path: FieldPath, key_type: KeyType) -> Self {
        Self { path, key_type }
    }

    /// Returns the configured path.
    #[must_use]
    pub const fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the configured key type.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Extracts the key from `record`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] naming the first segment that does not resolve
    /// (absent, or its parent is not a container), and [`Error::KeyTypeMismatch`]
    /// when the leaf cannot be read as the configured key type.
    pub fn extract<R: StructuredRecord>(&self, record: &R) -> Result<Key> {
        extract_at(&self.path, self.key_type, record)
    }
}

pub(crate) fn extract_at<R: StructuredRecord>(
    path: &FieldPath,
    key_type: KeyType,
    record: &R,
) -> Result<Key> {
    let mut node = record;
    for segment in path.segments() {
        node = node
            .field(segment)
            .ok_or_else(|| Error::key_not_found(path, segment.as_str()))?;
    }
    convert(path, key_type, node.scalar())
}

fn convert(path: &FieldPath, key_type: KeyType, leaf: ScalarRef<'_>) -> Result<Key> {
    let mismatch = |found: &str| Error::key_type_mismatch(path, key_type, found);
    match (key_type, leaf) {
        (KeyType::String, ScalarRef::Str(s)) => Ok(Key::String(s.to_string())),
        (KeyType::Int64, ScalarRef::Int(n)) => Ok(Key::Int64(n)),
        (KeyType::Int32, ScalarRef::Int(n)) => i32::try_from(n)
            .map(Key::Int32)
            .map_err(|_| mismatch(&format!("int {n} outside the int32 range"))),
        (KeyType::Bytes, ScalarRef::Bytes(b)) => Ok(Key::Bytes(b.to_vec())),
        (_, other) => Err(mismatch(other.kind())),
    }
}
