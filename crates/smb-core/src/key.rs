//! Key types, key values, and the key encoding that feeds the hash.
//!
//! The key type set is closed. Each type has exactly one encoder, and the
//! encoded bytes are what every implementation hashes, so the encodings below
//! are part of the on-disk contract:
//!
//! ```text
//! key type  tag       encoder    bytes
//! string    "string"  utf8       raw UTF-8, no length prefix
//! int32     "int32"   varint32   LEB128 of the 32-bit two's-complement bits (1-5 bytes)
//! int64     "int64"   varint64   LEB128 of the 64-bit two's-complement bits (1-10 bytes)
//! bytes     "bytes"   raw        the bytes as-is
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The logical type an extracted key must decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// UTF-8 text.
    String,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Opaque byte string.
    Bytes,
}

impl KeyType {
    /// All key types, in tag order.
    pub const ALL: [Self; 4] = [Self::String, Self::Int32, Self::Int64, Self::Bytes];

    /// Parses a key type tag using case-insensitive matching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when `raw` is unknown or empty.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "bytes" => Ok(Self::Bytes),
            other => Err(Error::invalid_config(format!(
                "unknown key type '{other}'; expected one of: string, int32, int64, bytes"
            ))),
        }
    }

    /// Returns the canonical tag written as `keyClass`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Bytes => "bytes",
        }
    }

    /// Returns the identifier of the encoder used for keys of this type.
    #[must_use]
    pub const fn encoder_id(self) -> &'static str {
        match self {
            Self::String => "utf8",
            Self::Int32 => "varint32",
            Self::Int64 => "varint64",
            Self::Bytes => "raw",
        }
    }

    /// Parses a textual key into a key of this type.
    ///
    /// Integers are decimal; bytes are base64url without padding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyTypeMismatch`] when `text` is not a valid literal for this type.
    pub fn parse_key(self, text: &str) -> Result<Key> {
        let mismatch = || Error::key_type_mismatch("<literal>", self, format!("'{text}'"));
        match self {
            Self::String => Ok(Key::String(text.to_string())),
            Self::Int32 => text.trim().parse().map(Key::Int32).map_err(|_| mismatch()),
            Self::Int64 => text.trim().parse().map(Key::Int64).map_err(|_| mismatch()),
            Self::Bytes => URL_SAFE_NO_PAD
                .decode(text.trim())
                .map(Key::Bytes)
                .map_err(|_| mismatch()),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for KeyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KeyType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// An extracted key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// UTF-8 text key.
    String(String),
    /// 32-bit integer key.
    Int32(i32),
    /// 64-bit integer key.
    Int64(i64),
    /// Byte string key.
    Bytes(Vec<u8>),
}

impl Key {
    /// Returns the type of this key.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        match self {
            Self::String(_) => KeyType::String,
            Self::Int32(_) => KeyType::Int32,
            Self::Int64(_) => KeyType::Int64,
            Self::Bytes(_) => KeyType::Bytes,
        }
    }

    /// Encodes the key into the bytes that are hashed.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::String(s) => s.as_bytes().to_vec(),
            Self::Int32(n) => {
                #[allow(clippy::cast_sign_loss)]
                let bits = *n as u32;
                let mut out = Vec::with_capacity(5);
                write_varint(u64::from(bits), &mut out);
                out
            }
            Self::Int64(n) => {
                #[allow(clippy::cast_sign_loss)]
                let bits = *n as u64;
                let mut out = Vec::with_capacity(10);
                write_varint(bits, &mut out);
                out
            }
            Self::Bytes(b) => b.clone(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int32(n) => write!(f, "{n}"),
            Self::Int64(n) => write!(f, "{n}"),
            Self::Bytes(b) => f.write_str(&URL_SAFE_NO_PAD.encode(b)),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Self::Int32(n)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Self::Int64(n)
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

/// Unsigned LEB128: seven bits per byte, low group first, high bit marks continuation.
#[allow(clippy::cast_possible_truncation)]
fn write_varint(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push(((value & 0x7f) as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_types_case_insensitively() {
        assert_eq!(KeyType::parse("STRING").unwrap(), KeyType::String);
        assert_eq!(KeyType::parse(" Int32 ").unwrap(), KeyType::Int32);
        assert_eq!(KeyType::parse("int64").unwrap(), KeyType::Int64);
        assert_eq!(KeyType::parse("Bytes").unwrap(), KeyType::Bytes);
        assert!(matches!(
            KeyType::parse("float"),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn tags_round_trip() {
        for key_type in KeyType::ALL {
            assert_eq!(KeyType::parse(key_type.as_str()).unwrap(), key_type);
        }
    }

    #[test]
    fn serializes_as_tag() {
        let json = serde_json::to_string(&KeyType::Int64).unwrap();
        assert_eq!(json, r#""int64""#);
        let back: KeyType = serde_json::from_str(r#""INT64""#).unwrap();
        assert_eq!(back, KeyType::Int64);
        assert!(serde_json::from_str::<KeyType>(r#""uuid""#).is_err());
    }

    #[test]
    fn string_keys_encode_as_raw_utf8() {
        assert_eq!(Key::from("US").encode(), b"US".to_vec());
        assert_eq!(Key::from("").encode(), Vec::<u8>::new());
        assert_eq!(Key::from("é").encode(), vec![0xc3, 0xa9]);
    }

    #[test]
    fn int32_keys_encode_as_varint() {
        assert_eq!(Key::Int32(0).encode(), vec![0x00]);
        assert_eq!(Key::Int32(10).encode(), vec![0x0a]);
        assert_eq!(Key::Int32(127).encode(), vec![0x7f]);
        assert_eq!(Key::Int32(128).encode(), vec![0x80, 0x01]);
        assert_eq!(Key::Int32(300).encode(), vec![0xac, 0x02]);
        assert_eq!(Key::Int32(-1).encode(), vec![0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn int64_keys_encode_as_varint() {
        assert_eq!(Key::Int64(10).encode(), vec![0x0a]);
        assert_eq!(Key::Int64(300).encode(), vec![0xac, 0x02]);
        assert_eq!(
            Key::Int64(-1).encode(),
            vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
        );
        // Same value, different width: the encodings differ for negatives only.
        assert_eq!(Key::Int64(10).encode(), Key::Int32(10).encode());
        assert_ne!(Key::Int64(-1).encode(), Key::Int32(-1).encode());
    }

    #[test]
    fn parses_textual_keys() {
        assert_eq!(KeyType::String.parse_key("US").unwrap(), Key::from("US"));
        assert_eq!(KeyType::Int32.parse_key("42").unwrap(), Key::Int32(42));
        assert_eq!(KeyType::Int64.parse_key("-7").unwrap(), Key::Int64(-7));
        assert_eq!(
            KeyType::Bytes.parse_key("AQID").unwrap(),
            Key::Bytes(vec![1, 2, 3])
        );
        assert!(KeyType::Int32.parse_key("4294967296").is_err());
        assert!(KeyType::Int64.parse_key("ten").is_err());
    }

    #[test]
    fn display_matches_parse_key() {
        let keys = [
            Key::from("Alice"),
            Key::Int32(-5),
            Key::Int64(i64::MAX),
            Key::Bytes(vec![0, 255, 16]),
        ];
        for key in keys {
            let text = key.to_string();
            assert_eq!(key.key_type().parse_key(&text).unwrap(), key);
        }
    }
}
