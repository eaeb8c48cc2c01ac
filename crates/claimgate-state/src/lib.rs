//! # claimgate-state — Claim Ledger State
//!
//! Holds every piece of mutable state the authorization engine guards:
//!
//! - **Commitments** (`commitment.rs`): blinded claim intents keyed by
//!   commitment digest, each with the time it was recorded. A commitment is
//!   revealable once the reveal delay has elapsed and is consumed on use.
//!
//! - **Domains** (`domain.rs`): per-parent configuration: root, label,
//!   owner, active flag, capacity, and claimed count.
//!
//! - **Ledger** (`ledger.rs`): the domain map plus the platform-wide
//!   claimed-leaf and claimed-holder sets, with an all-or-nothing
//!   `record_claim` and its compensating `revert_claim`.
//!
//! - **Claim state** (`claim.rs`): the per-(domain, leaf) lifecycle
//!   `Unclaimed → Committed → Claimed`.
//!
//! - **Audit** (`audit.rs`): append-only record of accepted transitions.
//!
//! ## Design
//!
//! Nothing in this crate locks. Every type is a plain keyed store that
//! assumes exclusive `&mut` access; the engine serializes transitions by
//! owning the whole state behind one mutex. Every fallible mutation checks
//! first and writes last, so an `Err` never leaves a partial write.

pub mod audit;
pub mod claim;
pub mod commitment;
pub mod domain;
pub mod ledger;

pub use audit::{AuditKind, AuditLog, AuditRecord};
pub use claim::ClaimState;
pub use commitment::CommitmentStore;
pub use domain::{DomainConfig, DomainParams};
pub use ledger::{ClaimLedger, ClaimReceipt};
