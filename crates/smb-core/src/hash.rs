//! Named, deterministic hash functions over encoded key bytes.
//!
//! The hash output decides which bucket a record lands in, and datasets written
//! by different processes or implementations must agree on it. Both algorithms
//! are therefore implemented here over plain byte slices with fixed seed 0 and
//! explicit little-endian block reads, independent of platform word size.
//!
//! | Identifier    | Algorithm                | 32-bit output                          |
//! |---------------|--------------------------|----------------------------------------|
//! | `MURMUR3_32`  | `MurmurHash3` `x86_32`   | the hash                               |
//! | `MURMUR3_128` | `MurmurHash3` `x64_128`  | low 32 bits of the first 64-bit half   |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Identifies the hashing algorithm a dataset was bucketed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashType {
    /// `MurmurHash3` `x86_32`, seed 0.
    #[default]
    Murmur3_32,
    /// `MurmurHash3` `x64_128`, seed 0, truncated to 32 bits.
    Murmur3_128,
}

impl HashType {
    /// All supported hash types.
    pub const ALL: [Self; 2] = [Self::Murmur3_32, Self::Murmur3_128];

    /// Parses a hash type identifier using case-insensitive matching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when `raw` is unknown.
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MURMUR3_32" => Ok(Self::Murmur3_32),
            "MURMUR3_128" => Ok(Self::Murmur3_128),
            other => Err(Error::invalid_config(format!(
                "unknown hash type '{other}'; expected one of: MURMUR3_32, MURMUR3_128"
            ))),
        }
    }

    /// Returns the identifier written as `hashType`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Murmur3_32 => "MURMUR3_32",
            Self::Murmur3_128 => "MURMUR3_128",
        }
    }

    /// Hashes encoded key bytes to 32 bits.
    #[must_use]
    pub fn hash(self, bytes: &[u8]) -> u32 {
        match self {
            Self::Murmur3_32 => murmur3_32(bytes, 0),
            Self::Murmur3_128 => {
                let [b0, b1, b2, b3, ..] = murmur3_128(bytes, 0).0.to_le_bytes();
                u32::from_le_bytes([b0, b1, b2, b3])
            }
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for HashType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HashType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

const C1_32: u32 = 0xcc9e_2d51;
const C2_32: u32 = 0x1b87_3593;

/// `MurmurHash3` `x86_32`.
#[must_use]
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let mut h = seed;
    let mut blocks = data.chunks_exact(4);

    for block in blocks.by_ref() {
        let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        h ^= mix_k1_32(k);
        h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (i, byte) in tail.iter().enumerate() {
            k |= u32::from(*byte) << (8 * i);
        }
        h ^= mix_k1_32(k);
    }

    // Length is mixed modulo 2^32, as every implementation does.
    #[allow(clippy::cast_possible_truncation)]
    let len = data.len() as u32;
    fmix32(h ^ len)
}

const fn mix_k1_32(k: u32) -> u32 {
    k.wrapping_mul(C1_32).rotate_left(15).wrapping_mul(C2_32)
}

const fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^ (h >> 16)
}

const C1_128: u64 = 0x87c3_7b91_1142_53d5;
const C2_128: u64 = 0x4cf5_ad43_2745_937f;

/// `MurmurHash3` `x64_128`, returned as its two 64-bit halves `(h1, h2)`.
#[must_use]
pub fn murmur3_128(data: &[u8], seed: u32) -> (u64, u64) {
    let mut h1 = u64::from(seed);
    let mut h2 = u64::from(seed);
    let mut blocks = data.chunks_exact(16);

    for block in blocks.by_ref() {
        let k1 = read_u64_le(&block[..8]);
        let k2 = read_u64_le(&block[8..]);

        h1 ^= mix_k1_128(k1);
        h1 = h1
            .rotate_left(27)
            .wrapping_add(h2)
            .wrapping_mul(5)
            .wrapping_add(0x52dc_e729);

        h2 ^= mix_k2_128(k2);
        h2 = h2
            .rotate_left(31)
            .wrapping_add(h1)
            .wrapping_mul(5)
            .wrapping_add(0x3849_5ab5);
    }

    let tail = blocks.remainder();
    if tail.len() > 8 {
        h2 ^= mix_k2_128(read_u64_le(&tail[8..]));
    }
    if !tail.is_empty() {
        h1 ^= mix_k1_128(read_u64_le(&tail[..tail.len().min(8)]));
    }

    let len = data.len() as u64;
    h1 ^= len;
    h2 ^= len;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    (h1, h2)
}

/// Reads up to eight bytes as a little-endian integer, zero-padding the high end.
fn read_u64_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, byte)| acc | (u64::from(*byte) << (8 * i)))
}

const fn mix_k1_128(k: u64) -> u64 {
    k.wrapping_mul(C1_128).rotate_left(31).wrapping_mul(C2_128)
}

const fn mix_k2_128(k: u64) -> u64 {
    k.wrapping_mul(C2_128).rotate_left(33).wrapping_mul(C1_128)
}

const fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^ (k >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOX: &[u8] = b"The quick brown fox jumps over the lazy dog";

    #[test]
    fn murmur3_32_reference_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"", 1), 0x514e_28b7);
        assert_eq!(murmur3_32(b"", 0xffff_ffff), 0x81f1_6f39);
        assert_eq!(murmur3_32(&[0, 0, 0, 0], 0), 0x2362_f9de);
        assert_eq!(murmur3_32(b"aaaa", 0x9747_b28c), 0x5a97_808a);
        assert_eq!(murmur3_32(b"Hello, world!", 0x9747_b28c), 0x2488_4cba);
        assert_eq!(murmur3_32(b"abc", 0), 0xb3dd_93fa);
        assert_eq!(murmur3_32(b"hello", 0), 0x248b_fa47);
        assert_eq!(murmur3_32(FOX, 0), 0x2e4f_f723);
    }

    #[test]
    fn murmur3_128_reference_vectors() {
        assert_eq!(murmur3_128(b"", 0), (0, 0));
        assert_eq!(
            murmur3_128(FOX, 0),
            (0xe34b_bc7b_bc07_1b6c, 0x7a43_3ca9_c49a_9347)
        );
    }

    #[test]
    fn murmur3_128_hash_is_first_four_output_bytes() {
        // Output bytes 6c1b07bc... read little-endian.
        assert_eq!(HashType::Murmur3_128.hash(FOX), 0xbc07_1b6c);
    }

    #[test]
    fn tail_lengths_are_all_covered() {
        // Every tail length 0..16 must hash without panicking and distinctly.
        let data: Vec<u8> = (0u8..32).collect();
        let mut seen = std::collections::HashSet::new();
        for len in 0..=data.len() {
            let slice = &data[..len];
            let pair = (murmur3_32(slice, 0), murmur3_128(slice, 0));
            assert!(seen.insert(pair));
        }
    }

    #[test]
    fn parses_identifiers() {
        let narrow = HashType::parse("murmur3_32").unwrap();
        assert_eq!(narrow, HashType::Murmur3_32);
        let wide = HashType::parse("MURMUR3_128").unwrap();
        assert_eq!(wide, HashType::Murmur3_128);
        assert!(HashType::parse("md5").is_err());
        assert_eq!(HashType::default(), HashType::Murmur3_32);
    }

    #[test]
    fn serializes_as_identifier() {
        let json = serde_json::to_string(&HashType::Murmur3_128).unwrap();
        assert_eq!(json, r#""MURMUR3_128""#);
        let back: HashType = serde_json::from_str(r#""MURMUR3_32""#).unwrap();
        assert_eq!(back, HashType::Murmur3_32);
    }
}
