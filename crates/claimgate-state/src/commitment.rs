//! # Commitment Store
//!
//! Records blinded claim intents. A claimant first submits
//! `commitment_hash(holder, label, expiry, nonce)`; only after the reveal
//! delay may they submit the parameters themselves. An observer who sees
//! the commitment learns nothing usable until the nonce is revealed, and by
//! then the claimant's commitment is already the oldest.
//!
//! ## Rules
//!
//! - `commit` rejects the zero digest and rejects resubmission of an
//!   existing digest. The original timestamp is never overwritten, so a
//!   replayed commit cannot reset or extend anyone's delay.
//! - `can_reveal` is true iff the record exists and
//!   `now - committed_at >= reveal_delay`. The delay is a floor, not a
//!   ceiling; a commitment stays revealable until consumed or pruned.
//! - `consume` deletes the record. It is called exactly once per
//!   successful claim.

use std::collections::HashMap;

use claimgate_core::{ClaimError, Digest, Timestamp};

/// Keyed store of pending commitments.
#[derive(Debug, Clone)]
pub struct CommitmentStore {
    reveal_delay_secs: u64,
    entries: HashMap<Digest, Timestamp>,
}

impl CommitmentStore {
    /// Create an empty store with the given reveal delay.
    pub fn new(reveal_delay_secs: u64) -> Self {
        Self {
            reveal_delay_secs,
            entries: HashMap::new(),
        }
    }

    /// The configured reveal delay in seconds.
    pub fn reveal_delay_secs(&self) -> u64 {
        self.reveal_delay_secs
    }

    /// Record `commitment` at `now`.
    pub fn commit(&mut self, commitment: Digest, now: Timestamp) -> Result<(), ClaimError> {
        if commitment.is_zero() {
            return Err(ClaimError::Validation(
                "commitment must be non-zero".to_string(),
            ));
        }
        if let Some(existing) = self.entries.get(&commitment) {
            return Err(ClaimError::State(format!(
                "commitment {commitment} already recorded at {existing}"
            )));
        }
        self.entries.insert(commitment, now);
        Ok(())
    }

    /// When `commitment` was recorded, if it is pending.
    pub fn timestamp(&self, commitment: &Digest) -> Option<Timestamp> {
        self.entries.get(commitment).copied()
    }

    /// Whether `commitment` exists and its delay has elapsed at `now`.
    pub fn can_reveal(&self, commitment: &Digest, now: Timestamp) -> bool {
        self.check_reveal(commitment, now).is_ok()
    }

    /// Like [`can_reveal`](Self::can_reveal), but explains a refusal.
    /// Returns the commit timestamp on success.
    pub fn check_reveal(
        &self,
        commitment: &Digest,
        now: Timestamp,
    ) -> Result<Timestamp, ClaimError> {
        let committed_at = self.entries.get(commitment).ok_or_else(|| {
            ClaimError::Timing(format!("no pending commitment {commitment}"))
        })?;
        let elapsed = now.secs_since(committed_at);
        if elapsed < self.reveal_delay_secs {
            return Err(ClaimError::Timing(format!(
                "commitment {commitment} revealable in {}s",
                self.reveal_delay_secs - elapsed
            )));
        }
        Ok(*committed_at)
    }

    /// Delete `commitment`, returning when it was recorded.
    pub fn consume(&mut self, commitment: &Digest) -> Option<Timestamp> {
        self.entries.remove(commitment)
    }

    /// Reinstate a consumed commitment with its original timestamp.
    /// Only used to roll back a claim whose external step failed. A
    /// re-commit of the same digest made in the meantime is overwritten.
    pub fn restore(&mut self, commitment: Digest, committed_at: Timestamp) {
        self.entries.insert(commitment, committed_at);
    }

    /// Drop every commitment older than `max_age_secs` at `now`.
    /// Returns how many were removed.
    pub fn prune(&mut self, now: Timestamp, max_age_secs: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, committed_at| now.secs_since(committed_at) <= max_age_secs);
        before - self.entries.len()
    }

    /// Number of pending commitments.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no commitments are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
