use crate::error::HashParseError;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length in bytes of a SHA-256 digest.
pub const DIGEST_LENGTH: usize = 32;

/// A SHA-256 digest.
///
/// Equality, ordering and map hashing are byte-exact. The hex form is always
/// 64 characters; decoding accepts both cases, encoding emits lower case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; DIGEST_LENGTH]);

impl ContentHash {
    /// Parses a 64-character hex string.
    pub fn from_hex(hex_string: &str) -> Result<Self, HashParseError> {
        if hex_string.len() != 2 * DIGEST_LENGTH {
            return Err(HashParseError::InvalidLength(hex_string.len()));
        }

        let mut bytes = [0u8; DIGEST_LENGTH];
        hex::decode_to_slice(hex_string, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Hashes the whole input.
    pub fn digest(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Hashes the first `length` bytes of `data`.
    ///
    /// The permutation cracker uses this to skip the trailing (withheld)
    /// character of a candidate without copying it.
    pub fn of_prefix(data: &[u8], length: usize) -> Self {
        Self::digest(&data[..length.min(data.len())])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DigestVisitor;

        impl Visitor<'_> for DigestVisitor {
            type Value = ContentHash;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 64-character SHA-256 hex string or 32 raw bytes")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ContentHash, E> {
                ContentHash::from_hex(value).map_err(E::custom)
            }

            fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<ContentHash, E> {
                let bytes: [u8; DIGEST_LENGTH] = value
                    .try_into()
                    .map_err(|_| E::invalid_length(value.len(), &self))?;
                Ok(ContentHash(bytes))
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_str(DigestVisitor)
        } else {
            deserializer.deserialize_bytes(DigestVisitor)
        }
    }
}
