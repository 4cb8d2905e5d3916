//! Content hashes identifying changes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Error returned when parsing a textual change hash.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashParseError {
    #[error("change hash must be {expected} hex characters, got {got}")]
    BadLength { expected: usize, got: usize },
    #[error("change hash contains a non-hex character")]
    BadDigit,
}

/// SHA-256 content hash of a change.
///
/// Hashes are the identity of a change: dependency edges in the history DAG
/// are hash references, and the document frontier ("heads") is a set of
/// hashes. Rendered as 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeHash(pub [u8; 32]);

impl ChangeHash {
    /// Hex length of the textual form.
    pub const HEX_LEN: usize = 64;

    /// Hash a byte buffer.
    #[must_use]
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        ChangeHash(hasher.finalize().into())
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for ChangeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChangeHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChangeHash({})", self)
    }
}

impl std::str::FromStr for ChangeHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::HEX_LEN {
            return Err(HashParseError::BadLength {
                expected: Self::HEX_LEN,
                got: s.len(),
            });
        }
        let mut bytes = [0u8; 32];
        for (i, pair) in s.as_bytes().chunks_exact(2).enumerate() {
            let hi = hex_digit(pair[0]).ok_or(HashParseError::BadDigit)?;
            let lo = hex_digit(pair[1]).ok_or(HashParseError::BadDigit)?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(ChangeHash(bytes))
    }
}

impl From<[u8; 32]> for ChangeHash {
    #[inline]
    fn from(bytes: [u8; 32]) -> Self {
        ChangeHash(bytes)
    }
}

impl Serialize for ChangeHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChangeHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
