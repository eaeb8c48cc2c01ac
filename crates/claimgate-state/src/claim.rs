//! # Claim Lifecycle
//!
//! Per (domain, leaf):
//!
//! ```text
//! Unclaimed ──commit──▶ Committed ──claim──▶ Claimed (terminal)
//!                           │
//!                           └── rejected claim: state unchanged,
//!                               caller may re-commit and retry
//! ```
//!
//! A rejected claim mutates nothing, so "Rejected" is an outcome reported
//! to the caller rather than a stored state.

use serde::{Deserialize, Serialize};

/// The observable claim state of one leaf under one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimState {
    /// No pending commitment and not yet redeemed.
    Unclaimed,
    /// A commitment for this leaf is pending reveal.
    Committed,
    /// The leaf has been redeemed (terminal).
    Claimed,
}

impl ClaimState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Claimed)
    }
}

impl std::fmt::Display for ClaimState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unclaimed => "UNCLAIMED",
            Self::Committed => "COMMITTED",
            Self::Claimed => "CLAIMED",
        };
        f.write_str(s)
    }
}
