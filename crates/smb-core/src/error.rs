//! Error types and result aliases for the partitioning core.
//!
//! Every failure here is definite and synchronous. Nothing retries or degrades:
//! a failure means either a malformed input record or an incompatible/corrupt
//! descriptor, and the calling pipeline decides what to do about it.

use std::fmt;

use crate::key::KeyType;

/// The result type used throughout `smb-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in partitioning operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A segment of the key field path is absent from the record.
    #[error("key not found: segment '{segment}' of path '{path}'")]
    KeyNotFound {
        /// The full configured field path.
        path: String,
        /// The first segment that could not be resolved.
        segment: String,
    },

    /// The leaf value exists but cannot be read as the configured key type.
    #[error("key type mismatch at '{path}': expected {expected}, found {found}")]
    KeyTypeMismatch {
        /// The full configured field path.
        path: String,
        /// The key type the descriptor requires.
        expected: KeyType,
        /// A short description of what was found at the leaf.
        found: String,
    },

    /// The descriptor carries a version stamp that is not registered.
    #[error("unsupported descriptor version {version} (supported: {supported:?})")]
    UnsupportedVersion {
        /// The stamped version.
        version: u64,
        /// Versions known to the registry.
        supported: Vec<u32>,
    },

    /// A required field is missing or unparseable for the stamped version.
    #[error("malformed descriptor: {message}")]
    MalformedDescriptor {
        /// Description of what is wrong with the descriptor.
        message: String,
    },

    /// A descriptor was constructed with values that violate its invariants.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the violated invariant.
        message: String,
    },

    /// Canonical encoding of a descriptor failed.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },
}

impl Error {
    /// Creates a key-not-found error for `segment` within `path`.
    #[must_use]
    pub fn key_not_found(path: impl fmt::Display, segment: impl Into<String>) -> Self {
        Self::KeyNotFound {
            path: path.to_string(),
            segment: segment.into(),
        }
    }

    /// Creates a key type mismatch error.
    #[must_use]
    pub fn key_type_mismatch(
        path: impl fmt::Display,
        expected: KeyType,
        found: impl Into<String>,
    ) -> Self {
        Self::KeyTypeMismatch {
            path: path.to_string(),
            expected,
            found: found.into(),
        }
    }

    /// Creates a malformed descriptor error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Returns true for failures caused by the input record rather than the descriptor.
    #[must_use]
    pub const fn is_record_error(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. } | Self::KeyTypeMismatch { .. })
    }
}

impl From<crate::canonical_json::CanonicalJsonError> for Error {
    fn from(err: crate::canonical_json::CanonicalJsonError) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_errors_are_classified() {
        assert!(Error::key_not_found("a.b", "b").is_record_error());
        assert!(Error::key_type_mismatch("a", KeyType::Int64, "string").is_record_error());
        assert!(!Error::malformed("missing numBuckets").is_record_error());
        assert!(!Error::invalid_config("numBuckets must be a power of two").is_record_error());
    }

    #[test]
    fn messages_name_the_path() {
        let err = Error::key_not_found("location.currentCountry", "currentCountry");
        assert_eq!(
            err.to_string(),
            "key not found: segment 'currentCountry' of path 'location.currentCountry'"
        );

        let err = Error::key_type_mismatch("age", KeyType::String, "int");
        assert_eq!(
            err.to_string(),
            "key type mismatch at 'age': expected string, found int"
        );
    }
}
