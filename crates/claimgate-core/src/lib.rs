//! # claimgate-core — Foundational Types for Claimgate
//!
//! This crate is the bedrock of the Claimgate workspace. It defines the
//! identifiers, digests, timestamps, and error taxonomy used by every other
//! crate, plus the one canonical byte encoding that the off-chain tree
//! builder and the on-ledger verifier both consume.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `HolderId`, `DomainId`,
//!    `ResourceId`, `Nonce`, `Label` — fixed-size or validated newtypes.
//!    No bare byte arrays or strings cross crate boundaries.
//!
//! 2. **One encoding module.** `encoding::leaf_hash()`, `node_hash()` and
//!    `commitment_hash()` are defined here and nowhere else. A builder that
//!    hashes leaves differently from the verifier silently invalidates every
//!    proof, so the byte layout lives in exactly one place.
//!
//! 3. **Classified errors.** `ClaimError` carries one variant per failure
//!    class so callers can tell "retry later" from "not eligible" from
//!    "already settled".
//!
//! 4. **UTC-only timestamps** with an injectable `Clock`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `claimgate-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use digest::Digest;
pub use encoding::{commitment_hash, leaf_hash, node_hash, EntitlementRecord, ENCODING_VERSION};
pub use error::{ClaimError, EncodingError, Recovery};
pub use identity::{DomainId, HolderId, Label, Nonce, ResourceId};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
