//! # Domain Configuration
//!
//! One `DomainConfig` per parent resource. It pins the entitlement root the
//! claims are checked against and tracks how many of the allowed claims
//! have been made.
//!
//! ## Lifecycle
//!
//! ```text
//! (absent) ──initialize──▶ Active ──deactivate──▶ Inactive
//!                            ▲                        │
//!                            └──activate / initialize─┘
//! ```
//!
//! An active configuration cannot be re-initialized. An inactive one may be
//! re-initialized with a new root; its claimed count carries over, since
//! claimed leaves and holders stay claimed platform-wide.

use serde::{Deserialize, Serialize};

use claimgate_core::{ClaimError, Digest, HolderId, Label, Timestamp};

/// Parameters supplied when initializing a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainParams {
    /// Entitlement tree root.
    pub root: Digest,
    /// Human-readable label of the parent resource.
    pub label: Label,
    /// Maximum number of claims.
    pub total_allowed: u64,
}

impl DomainParams {
    /// Reject a zero root or zero capacity.
    pub fn validate(&self) -> Result<(), ClaimError> {
        if self.root.is_zero() {
            return Err(ClaimError::Validation("root must be non-zero".to_string()));
        }
        if self.total_allowed == 0 {
            return Err(ClaimError::Validation(
                "total allowed must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Claim configuration for one parent resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Entitlement tree root claims are verified against.
    pub root: Digest,
    /// Human-readable label of the parent resource.
    pub label: Label,
    /// Who initialized the domain; may toggle it.
    pub owner: HolderId,
    /// Whether claims are accepted.
    pub active: bool,
    /// Maximum number of claims.
    pub total_allowed: u64,
    /// Claims made so far.
    pub claimed: u64,
    /// When the current root was installed.
    pub initialized_at: Timestamp,
}

impl DomainConfig {
    /// A fresh, active configuration.
    pub fn new(params: DomainParams, owner: HolderId, now: Timestamp) -> Self {
        Self {
            root: params.root,
            label: params.label,
            owner,
            active: true,
            total_allowed: params.total_allowed,
            claimed: 0,
            initialized_at: now,
        }
    }

    /// Claims still available.
    pub fn remaining(&self) -> u64 {
        self.total_allowed.saturating_sub(self.claimed)
    }

    /// Whether the claimed count has reached capacity.
    pub fn is_exhausted(&self) -> bool {
        self.claimed >= self.total_allowed
    }
}
