//! # Canonical Encoding — Leaf, Node, and Commitment Hashes
//!
//! The single definition of the byte layouts hashed by the tree builder and
//! by the claim verifier. Both sides import these functions; neither side
//! assembles preimage bytes on its own.
//!
//! ## Layout (version 1)
//!
//! Domain-separated SHA-256, one tag byte per hash kind:
//!
//! ```text
//! leaf       = SHA256(0x00 ‖ ver ‖ holder[20] ‖ u16be(len) ‖ label ‖ u64be(expiry))
//! node       = SHA256(0x01 ‖ min(a, b) ‖ max(a, b))
//! commitment = SHA256(0x02 ‖ ver ‖ holder[20] ‖ u16be(len) ‖ label ‖ u64be(expiry) ‖ nonce[32])
//! ```
//!
//! The tag bytes keep a leaf from ever being reinterpreted as an interior
//! node (second-preimage on the tree) or as a commitment. The label length
//! prefix removes concatenation ambiguity between label and expiry.
//! Sorting the node inputs means a proof is a bare list of siblings with no
//! left/right flags.

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::identity::{HolderId, Label, Nonce};

/// Version byte mixed into leaf and commitment preimages.
pub const ENCODING_VERSION: u8 = 1;

const LEAF_TAG: u8 = 0x00;
const NODE_TAG: u8 = 0x01;
const COMMITMENT_TAG: u8 = 0x02;

/// One entitlement: `holder` may claim `label` with the given `expiry`
/// (Unix seconds).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitlementRecord {
    /// Account entitled to the claim.
    pub holder: HolderId,
    /// Sub-resource label to be created.
    pub label: Label,
    /// Expiry of the created sub-resource, Unix seconds.
    pub expiry: u64,
}

impl EntitlementRecord {
    /// Construct a record.
    pub fn new(holder: HolderId, label: Label, expiry: u64) -> Self {
        Self {
            holder,
            label,
            expiry,
        }
    }

    /// The leaf digest of this record.
    pub fn leaf(&self) -> Digest {
        leaf_hash(&self.holder, &self.label, self.expiry)
    }

    /// The commitment digest for claiming this record with `nonce`.
    pub fn commitment(&self, nonce: &Nonce) -> Digest {
        commitment_hash(&self.holder, &self.label, self.expiry, nonce)
    }
}

fn push_claim_fields(buf: &mut Vec<u8>, holder: &HolderId, label: &Label, expiry: u64) {
    let text = label.as_str().as_bytes();
    // Label construction caps length at 255 bytes.
    let len = u16::try_from(text.len()).unwrap_or(u16::MAX);
    buf.extend_from_slice(holder.as_bytes());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(text);
    buf.extend_from_slice(&expiry.to_be_bytes());
}

/// Compute the leaf digest for `(holder, label, expiry)`.
pub fn leaf_hash(holder: &HolderId, label: &Label, expiry: u64) -> Digest {
    let mut buf = Vec::with_capacity(2 + 20 + 2 + label.as_str().len() + 8);
    buf.push(LEAF_TAG);
    buf.push(ENCODING_VERSION);
    push_claim_fields(&mut buf, holder, label, expiry);
    Digest::sha256(&buf)
}

/// Compute the parent of two sibling digests. Order-insensitive.
pub fn node_hash(a: &Digest, b: &Digest) -> Digest {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = Vec::with_capacity(65);
    buf.push(NODE_TAG);
    buf.extend_from_slice(lo.as_bytes());
    buf.extend_from_slice(hi.as_bytes());
    Digest::sha256(&buf)
}

/// Compute the blinding commitment for a claim.
pub fn commitment_hash(holder: &HolderId, label: &Label, expiry: u64, nonce: &Nonce) -> Digest {
    let mut buf = Vec::with_capacity(2 + 20 + 2 + label.as_str().len() + 8 + 32);
    buf.push(COMMITMENT_TAG);
    buf.push(ENCODING_VERSION);
    push_claim_fields(&mut buf, holder, label, expiry);
    buf.extend_from_slice(nonce.as_bytes());
    Digest::sha256(&buf)
}
