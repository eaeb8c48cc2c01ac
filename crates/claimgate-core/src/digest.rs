//! # Digests — Fixed-Size SHA-256 Values
//!
//! Defines `Digest`, the 32-byte value used for leaves, tree nodes, roots,
//! and commitments, together with the hex helpers every fixed-size
//! identifier in the workspace shares.
//!
//! The all-zero digest is reserved: a zero root or zero commitment is never
//! accepted by the engine.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::error::EncodingError;

/// A 32-byte SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// The reserved all-zero digest.
    pub const ZERO: Digest = Digest([0u8; 32]);

    /// Wrap raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash arbitrary bytes with SHA-256.
    pub fn sha256(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the reserved zero digest.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Render as lowercase hex (64 chars, no prefix).
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    /// Parse from 64 hex chars, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
        Ok(Self(hex_to_array(s)?))
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest(0x{})", self.to_hex())
    }
}

impl std::str::FromStr for Digest {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Hex helpers
// ---------------------------------------------------------------------------

/// Encode bytes as lowercase hex.
pub fn bytes_to_hex(b: &[u8]) -> String {
    b.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Decode a hex string (optional `0x` prefix) into exactly `N` bytes.
pub fn hex_to_array<const N: usize>(s: &str) -> Result<[u8; N], EncodingError> {
    let trimmed = s.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if hex.len() != N * 2 {
        return Err(EncodingError::InvalidLength {
            expected: N * 2,
            actual: hex.len(),
        });
    }
    let mut out = [0u8; N];
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let pair = std::str::from_utf8(chunk)
            .map_err(|_| EncodingError::InvalidHex { position: i * 2 })?;
        out[i] = u8::from_str_radix(pair, 16)
            .map_err(|_| EncodingError::InvalidHex { position: i * 2 })?;
    }
    Ok(out)
}
