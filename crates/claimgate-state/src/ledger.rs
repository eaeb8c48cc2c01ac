//! # Claim Ledger
//!
//! The keyed store of domain configurations and the platform-wide
//! claimed-leaf and claimed-holder sets.
//!
//! ## Security Invariants
//!
//! - A leaf redeems at most once, across all domains.
//! - A holder redeems at most once, across all domains.
//! - A domain's claimed count never exceeds its total allowed.
//!
//! `record_claim` re-checks all three immediately before writing and writes
//! all three together, so it behaves as a compare-and-set even if a caller
//! skipped the individual `ensure_*` checks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use claimgate_core::{ClaimError, Digest, DomainId, HolderId, Timestamp};

use crate::domain::{DomainConfig, DomainParams};

/// What a successful `record_claim` wrote. Passed back to `revert_claim`
/// when the external step of a claim fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// Domain the claim counted against.
    pub domain: DomainId,
    /// Redeeming holder.
    pub holder: HolderId,
    /// Redeemed leaf.
    pub leaf: Digest,
}

/// Domain configurations plus claimed sets.
#[derive(Debug, Clone, Default)]
pub struct ClaimLedger {
    domains: HashMap<DomainId, DomainConfig>,
    /// Leaf → domain it was redeemed under.
    claimed_leaves: HashMap<Digest, DomainId>,
    /// Holder → leaf they redeemed.
    claimed_holders: HashMap<HolderId, Digest>,
}

impl ClaimLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Domains ──────────────────────────────────────────────────────

    /// Install a configuration for `id`.
    ///
    /// Rejects invalid parameters and re-initialization of an active
    /// domain. Re-initializing an inactive domain installs the new root and
    /// capacity, keeps the claimed count, and reactivates it.
    pub fn initialize_domain(
        &mut self,
        id: DomainId,
        params: DomainParams,
        owner: HolderId,
        now: Timestamp,
    ) -> Result<&DomainConfig, ClaimError> {
        params.validate()?;
        if id.is_zero() {
            return Err(ClaimError::Validation(
                "domain id must be non-zero".to_string(),
            ));
        }

        let claimed = match self.domains.get(&id) {
            Some(existing) if existing.active => {
                return Err(ClaimError::State(format!(
                    "domain {id} is already initialized and active"
                )));
            }
            Some(existing) => {
                if params.total_allowed < existing.claimed {
                    return Err(ClaimError::Validation(format!(
                        "total allowed {} is below the {} claims already made",
                        params.total_allowed, existing.claimed
                    )));
                }
                existing.claimed
            }
            None => 0,
        };

        let mut config = DomainConfig::new(params, owner, now);
        config.claimed = claimed;
        self.domains.insert(id, config);
        self.domains
            .get(&id)
            .ok_or_else(|| ClaimError::State(format!("domain {id} vanished during insert")))
    }

    /// Look up a domain configuration.
    pub fn domain(&self, id: &DomainId) -> Option<&DomainConfig> {
        self.domains.get(id)
    }

    /// Number of configured domains.
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// The configuration of `id`, provided it exists and is active.
    pub fn require_active(&self, id: &DomainId) -> Result<&DomainConfig, ClaimError> {
        match self.domains.get(id) {
            Some(cfg) if cfg.active => Ok(cfg),
            Some(_) => Err(ClaimError::Authorization(format!("domain {id} is inactive"))),
            None => Err(ClaimError::Authorization(format!(
                "domain {id} is not configured"
            ))),
        }
    }

    /// Switch a domain on or off.
    pub fn set_active(&mut self, id: &DomainId, active: bool) -> Result<(), ClaimError> {
        let cfg = self.domains.get_mut(id).ok_or_else(|| {
            ClaimError::Authorization(format!("domain {id} is not configured"))
        })?;
        cfg.active = active;
        Ok(())
    }

    // ── Claimed sets ─────────────────────────────────────────────────

    /// Whether `leaf` has been redeemed.
    pub fn is_leaf_claimed(&self, leaf: &Digest) -> bool {
        self.claimed_leaves.contains_key(leaf)
    }

    /// Whether `holder` has redeemed anything.
    pub fn is_holder_claimed(&self, holder: &HolderId) -> bool {
        self.claimed_holders.contains_key(holder)
    }

    /// The domain `leaf` was redeemed under, if any.
    pub fn claimed_domain_of(&self, leaf: &Digest) -> Option<DomainId> {
        self.claimed_leaves.get(leaf).copied()
    }

    /// The leaf `holder` redeemed, if any.
    pub fn claimed_leaf_of(&self, holder: &HolderId) -> Option<Digest> {
        self.claimed_holders.get(holder).copied()
    }

    /// Fail if `holder` has already redeemed.
    pub fn ensure_holder_unclaimed(&self, holder: &HolderId) -> Result<(), ClaimError> {
        if self.is_holder_claimed(holder) {
            return Err(ClaimError::State(format!("holder {holder} has already claimed")));
        }
        Ok(())
    }

    /// Fail if `leaf` has already been redeemed.
    pub fn ensure_leaf_unclaimed(&self, leaf: &Digest) -> Result<(), ClaimError> {
        if self.is_leaf_claimed(leaf) {
            return Err(ClaimError::State(format!("leaf {leaf} has already been claimed")));
        }
        Ok(())
    }

    /// Fail if `domain` has no capacity left.
    pub fn ensure_capacity(&self, domain: &DomainId) -> Result<(), ClaimError> {
        let cfg = self.domains.get(domain).ok_or_else(|| {
            ClaimError::Authorization(format!("domain {domain} is not configured"))
        })?;
        if cfg.is_exhausted() {
            return Err(ClaimError::State(format!(
                "domain {domain} has reached its limit of {} claims",
                cfg.total_allowed
            )));
        }
        Ok(())
    }

    /// Mark `leaf` and `holder` claimed and count the claim against
    /// `domain`. All-or-nothing.
    pub fn record_claim(
        &mut self,
        domain: DomainId,
        holder: HolderId,
        leaf: Digest,
    ) -> Result<ClaimReceipt, ClaimError> {
        self.ensure_holder_unclaimed(&holder)?;
        self.ensure_leaf_unclaimed(&leaf)?;
        self.ensure_capacity(&domain)?;

        let cfg = self.domains.get_mut(&domain).ok_or_else(|| {
            ClaimError::Authorization(format!("domain {domain} is not configured"))
        })?;
        cfg.claimed += 1;
        self.claimed_leaves.insert(leaf, domain);
        self.claimed_holders.insert(holder, leaf);

        Ok(ClaimReceipt {
            domain,
            holder,
            leaf,
        })
    }

    /// Undo exactly the writes of `receipt`.
    pub fn revert_claim(&mut self, receipt: &ClaimReceipt) {
        if self.claimed_leaves.get(&receipt.leaf) == Some(&receipt.domain) {
            self.claimed_leaves.remove(&receipt.leaf);
        }
        if self.claimed_holders.get(&receipt.holder) == Some(&receipt.leaf) {
            self.claimed_holders.remove(&receipt.holder);
        }
        if let Some(cfg) = self.domains.get_mut(&receipt.domain) {
            cfg.claimed = cfg.claimed.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimgate_core::Label;

    const OWNER: HolderId = HolderId([0xaa; 20]);

    fn params(total: u64) -> DomainParams {
        DomainParams {
            root: Digest([7; 32]),
            label: Label::new("example").unwrap(),
            total_allowed: total,
        }
    }

    fn ledger_with(id: DomainId, total: u64) -> ClaimLedger {
        let mut ledger = ClaimLedger::new();
        ledger
            .initialize_domain(id, params(total), OWNER, Timestamp::now())
            .unwrap();
        ledger
    }

    #[test]
    fn test_initialize_and_lookup() {
        let id = DomainId([1; 32]);
        let ledger = ledger_with(id, 5);
        let cfg = ledger.domain(&id).unwrap();
        assert_eq!(cfg.owner, OWNER);
        assert_eq!(cfg.total_allowed, 5);
        assert!(ledger.require_active(&id).is_ok());
        assert_eq!(ledger.domain_count(), 1);
    }

    #[test]
    fn test_reinitialize_active_rejected() {
        let id = DomainId([1; 32]);
        let mut ledger = ledger_with(id, 5);
        let err = ledger
            .initialize_domain(id, params(9), OWNER, Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, ClaimError::State(_)));
        assert_eq!(ledger.domain(&id).unwrap().total_allowed, 5);
    }

    #[test]
    fn test_reinitialize_inactive_keeps_claimed_count() {
        let id = DomainId([1; 32]);
        let mut ledger = ledger_with(id, 5);
        ledger
            .record_claim(id, HolderId([1; 20]), Digest([1; 32]))
            .unwrap();
        ledger.set_active(&id, false).unwrap();

        let mut next = params(3);
        next.root = Digest([8; 32]);
        ledger
            .initialize_domain(id, next, OWNER, Timestamp::now())
            .unwrap();
        let cfg = ledger.domain(&id).unwrap();
        assert!(cfg.active);
        assert_eq!(cfg.root, Digest([8; 32]));
        assert_eq!(cfg.claimed, 1);
    }

    #[test]
    fn test_zero_domain_id_rejected() {
        let mut ledger = ClaimLedger::new();
        let err = ledger
            .initialize_domain(DomainId([0; 32]), params(1), OWNER, Timestamp::now())
            .unwrap_err();
        assert!(matches!(err, ClaimError::Validation(_)));
    }

    #[test]
    fn test_inactive_domain_not_claimable() {
        let id = DomainId([1; 32]);
        let mut ledger = ledger_with(id, 5);
        ledger.set_active(&id, false).unwrap();
        assert!(matches!(
            ledger.require_active(&id),
            Err(ClaimError::Authorization(_))
        ));
        assert!(matches!(
            ledger.require_active(&DomainId([2; 32])),
            Err(ClaimError::Authorization(_))
        ));
    }

    #[test]
    fn test_leaf_and_holder_redeem_once() {
        let id = DomainId([1; 32]);
        let mut ledger = ledger_with(id, 5);
        let h1 = HolderId([1; 20]);
        let h2 = HolderId([2; 20]);
        let l1 = Digest([1; 32]);
        let l2 = Digest([2; 32]);

        ledger.record_claim(id, h1, l1).unwrap();
        assert!(matches!(
            ledger.record_claim(id, h2, l1),
            Err(ClaimError::State(_))
        ));
        assert!(matches!(
            ledger.record_claim(id, h1, l2),
            Err(ClaimError::State(_))
        ));
        assert_eq!(ledger.domain(&id).unwrap().claimed, 1);
        assert_eq!(ledger.claimed_leaf_of(&h1), Some(l1));
        assert_eq!(ledger.claimed_domain_of(&l1), Some(id));
        assert!(!ledger.is_holder_claimed(&h2));
        assert!(!ledger.is_leaf_claimed(&l2));
    }

    #[test]
    fn test_capacity_enforced() {
        let id = DomainId([1; 32]);
        let mut ledger = ledger_with(id, 1);
        ledger
            .record_claim(id, HolderId([1; 20]), Digest([1; 32]))
            .unwrap();
        let err = ledger
            .record_claim(id, HolderId([2; 20]), Digest([2; 32]))
            .unwrap_err();
        assert!(matches!(err, ClaimError::State(_)));
        assert!(!ledger.is_holder_claimed(&HolderId([2; 20])));
    }

    #[test]
    fn test_revert_undoes_only_its_writes() {
        let id = DomainId([1; 32]);
        let mut ledger = ledger_with(id, 5);
        let kept = ledger
            .record_claim(id, HolderId([1; 20]), Digest([1; 32]))
            .unwrap();
        let reverted = ledger
            .record_claim(id, HolderId([2; 20]), Digest([2; 32]))
            .unwrap();
        ledger.revert_claim(&reverted);

        assert!(ledger.is_leaf_claimed(&kept.leaf));
        assert!(ledger.is_holder_claimed(&kept.holder));
        assert!(!ledger.is_leaf_claimed(&reverted.leaf));
        assert!(!ledger.is_holder_claimed(&reverted.holder));
        assert_eq!(ledger.domain(&id).unwrap().claimed, 1);
    }
}
