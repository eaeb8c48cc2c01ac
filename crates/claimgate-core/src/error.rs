//! # Error Types — Classified Failure Taxonomy
//!
//! Defines the error types used throughout Claimgate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every `ClaimError` aborts its operation with no partial state change.
//! - The core never retries. Each variant maps to a [`Recovery`] so the
//!   caller can pick the right action: wait and reveal again, re-derive and
//!   re-commit, or stop because the claim is already settled.

use thiserror::Error;

/// Top-level error type for commit, claim, and administrative transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// Malformed input: zero root, zero capacity, zero commitment,
    /// malformed identifier or label.
    #[error("validation error: {0}")]
    Validation(String),

    /// Caller or engine is not permitted to perform the transition:
    /// inactive domain, paused engine, missing ownership or delegation.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// Reveal attempted before the delay elapsed, or without a commitment.
    #[error("timing error: {0}")]
    Timing(String),

    /// Ledger already records the outcome: leaf or holder claimed,
    /// commitment already present, capacity exhausted.
    #[error("state error: {0}")]
    State(String),

    /// Merkle membership proof does not reproduce the domain root.
    #[error("proof error: {0}")]
    Proof(String),

    /// The registrar failed or reported data that forbids the claim.
    #[error("upstream error: {0}")]
    Upstream(String),
}

/// How a caller should react to a [`ClaimError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Wait for the reveal delay and submit the same claim again.
    RetryLater,
    /// The request cannot succeed as submitted; re-derive inputs and re-commit.
    NotEligible,
    /// The claim (or its commitment) is already recorded.
    AlreadySettled,
    /// An external collaborator failed; the ledger is unchanged.
    Upstream,
}

impl ClaimError {
    /// Classify the error for caller-side recovery.
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::Timing(_) => Recovery::RetryLater,
            Self::Validation(_) | Self::Authorization(_) | Self::Proof(_) => {
                Recovery::NotEligible
            }
            Self::State(_) => Recovery::AlreadySettled,
            Self::Upstream(_) => Recovery::Upstream,
        }
    }

    /// Short class label, used as a metrics and log field.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Authorization(_) => "authorization",
            Self::Timing(_) => "timing",
            Self::State(_) => "state",
            Self::Proof(_) => "proof",
            Self::Upstream(_) => "upstream",
        }
    }
}

/// Error decoding a fixed-size value or label.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Hex string has the wrong number of characters.
    #[error("expected {expected} hex chars, got {actual}")]
    InvalidLength {
        /// Expected hex length.
        expected: usize,
        /// Actual hex length.
        actual: usize,
    },

    /// Non-hex character encountered.
    #[error("invalid hex at position {position}")]
    InvalidHex {
        /// Byte offset into the hex string.
        position: usize,
    },

    /// Label fails the sub-resource label rules.
    #[error("invalid label {label:?}: {reason}")]
    InvalidLabel {
        /// The rejected label.
        label: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl From<EncodingError> for ClaimError {
    fn from(e: EncodingError) -> Self {
        ClaimError::Validation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_classification() {
        assert_eq!(ClaimError::Timing("x".into()).recovery(), Recovery::RetryLater);
        assert_eq!(ClaimError::Proof("x".into()).recovery(), Recovery::NotEligible);
        assert_eq!(
            ClaimError::State("x".into()).recovery(),
            Recovery::AlreadySettled
        );
        assert_eq!(ClaimError::Upstream("x".into()).recovery(), Recovery::Upstream);
    }

    #[test]
    fn test_encoding_error_maps_to_validation() {
        let err: ClaimError = EncodingError::InvalidHex { position: 4 }.into();
        assert!(matches!(err, ClaimError::Validation(_)));
        assert_eq!(err.class(), "validation");
    }

    #[test]
    fn test_display_includes_class() {
        let err = ClaimError::Authorization("engine paused".into());
        assert_eq!(err.to_string(), "authorization error: engine paused");
    }
}
