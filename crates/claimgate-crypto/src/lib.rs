//! # claimgate-crypto — Entitlement Tree Builder
//!
//! Builds the Merkle commitment over a set of entitlement records and
//! serves per-record membership proofs:
//!
//! - **Leaves** come from `claimgate_core::encoding::leaf_hash()`, the same
//!   function the claim verifier uses.
//! - **Interior nodes** hash each sibling pair in sorted order, so the root
//!   does not depend on input order and proofs carry no position bits.
//! - **Verification** folds a proof back to a root with no tree access.
//!
//! ## Crate Policy
//!
//! - Depends only on `claimgate-core` internally.
//! - No mocking of hashing in tests; all tests use real SHA-256.

pub mod merkle;

pub use merkle::{
    compute_root, verify_proof, EntitlementTree, ProofBundle, TreeError, TreeManifest,
    TreeManifestEntry, MAX_PROOF_LEN,
};
