//! # Identity Newtypes
//!
//! Newtype wrappers for every identifier that crosses the protocol
//! boundary. You cannot pass a `DomainId` where a `ResourceId` is expected,
//! and a `Label` is validated once at construction.
//!
//! All fixed-size identifiers serialize as `0x`-prefixed lowercase hex.

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::{bytes_to_hex, hex_to_array, Digest};
use crate::error::EncodingError;

/// Maximum label length in bytes. The encoding prefixes labels with a
/// `u16` length, and registries cap labels well below that.
pub const MAX_LABEL_LEN: usize = 255;

macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Byte width of this identifier.
            pub const LEN: usize = $len;

            /// Access the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Whether every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Parse from hex, with or without a `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, EncodingError> {
                Ok(Self(hex_to_array(s)?))
            }

            /// Render as `0x`-prefixed lowercase hex.
            pub fn to_hex(&self) -> String {
                format!("0x{}", bytes_to_hex(&self.0))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl std::str::FromStr for $name {
            type Err = EncodingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_id!(
    /// A 20-byte account identity (the holder of an entitlement, a domain
    /// owner, or the engine operator).
    HolderId,
    20
);

fixed_id!(
    /// A 32-byte identifier of a parent resource under which sub-resources
    /// are distributed.
    DomainId,
    32
);

fixed_id!(
    /// A 32-byte identifier of a created sub-resource.
    ResourceId,
    32
);

fixed_id!(
    /// The 32-byte secret blinding a commitment. Must stay private until
    /// the claim is revealed.
    Nonce,
    32
);

impl Nonce {
    /// Draw a fresh nonce from the thread-local CSPRNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl ResourceId {
    /// Derive the identifier of `label` under `parent`:
    /// `SHA256(parent ‖ SHA256(label))`.
    pub fn derive(parent: &DomainId, label: &Label) -> Self {
        let label_hash = Digest::sha256(label.as_str().as_bytes());
        let mut input = Vec::with_capacity(64);
        input.extend_from_slice(parent.as_bytes());
        input.extend_from_slice(label_hash.as_bytes());
        Self(Digest::sha256(&input).0)
    }
}

/// A validated sub-resource label.
///
/// Rules: non-empty, at most [`MAX_LABEL_LEN`] bytes, no `.` separator,
/// no control characters, no leading or trailing whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Validate and wrap a label.
    pub fn new(s: impl Into<String>) -> Result<Self, EncodingError> {
        let s = s.into();
        let reason = if s.is_empty() {
            Some("label must not be empty")
        } else if s.len() > MAX_LABEL_LEN {
            Some("label exceeds 255 bytes")
        } else if s.contains('.') {
            Some("label must not contain '.'")
        } else if s.chars().any(char::is_control) {
            Some("label must not contain control characters")
        } else if s.trim() != s {
            Some("label must not have surrounding whitespace")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(EncodingError::InvalidLabel { label: s, reason }),
            None => Ok(Self(s)),
        }
    }

    /// Access the label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Label::new(s).map_err(serde::de::Error::custom)
    }
}
