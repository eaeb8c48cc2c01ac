//! # Authorization Engine
//!
//! Owns the commitment store, the claim ledger, and the audit log, and
//! drives every transition over them.
//!
//! ## Claim Check Order
//!
//! A claim is evaluated in this order. The first failing check aborts the
//! claim and nothing is written.
//!
//! 1. Engine not paused, domain active, engine delegated by the parent owner.
//! 2. Caller has not already claimed.
//! 3. Requested expiry does not exceed the parent's expiry.
//! 4. The recomputed commitment exists and its reveal delay has elapsed.
//! 5. The commitment is consumed (single use).
//! 6. The recomputed leaf has not been claimed.
//! 7. The proof reproduces the domain root.
//! 8. Leaf, holder and claimed count are recorded; capacity is enforced here.
//! 9. The registrar creates the sub-resource.
//!
//! Steps 1 to 8 run under the ledger lock. Consumption (5) is applied
//! together with the writes of step 8 so that a failure in 6 or 7 leaves
//! the commitment in place. Step 9 runs after the lock is released; if it
//! fails, the writes of 5 and 8 are undone.
//!
//! The proof is folded before the lock is taken, and only the resulting
//! root is compared under it. A proof longer than [`MAX_PROOF_LEN`] is never
//! hashed and fails step 7 with a validation error.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use claimgate_core::{
    ClaimError, Clock, Digest, DomainId, EntitlementRecord, HolderId, Label, Nonce, ResourceId,
    SystemClock, Timestamp,
};
use claimgate_crypto::{compute_root, verify_proof, MAX_PROOF_LEN};
use claimgate_state::{
    AuditKind, AuditLog, AuditRecord, ClaimLedger, ClaimReceipt, ClaimState, CommitmentStore,
    DomainConfig, DomainParams,
};

use crate::config::{ConfigError, EngineConfig};
use crate::registrar::{CreateRequest, Registrar, RegistrarError};

const COMMITS_TOTAL: &str = "claimgate_commits_total";
const CLAIMS_TOTAL: &str = "claimgate_claims_total";
const CLAIM_REJECTIONS_TOTAL: &str = "claimgate_claim_rejections_total";

/// The reveal half of a commit-reveal claim. The caller is the holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Parent resource to claim under.
    pub domain: DomainId,
    /// Requested sub-resource label.
    pub label: Label,
    /// Requested expiry, Unix seconds.
    pub expiry: u64,
    /// Nonce the commitment was blinded with.
    pub nonce: Nonce,
    /// Sibling path from the leaf to the domain root.
    pub proof: Vec<Digest>,
}

/// A successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimOutcome {
    /// The created sub-resource.
    pub resource: ResourceId,
    /// Parent resource.
    pub domain: DomainId,
    /// The claimant.
    pub holder: HolderId,
    /// The redeemed leaf.
    pub leaf: Digest,
}

#[derive(Debug)]
struct EngineState {
    owner: HolderId,
    paused: bool,
    commitments: CommitmentStore,
    ledger: ClaimLedger,
    audit: AuditLog,
}

impl EngineState {
    fn record(
        &mut self,
        kind: AuditKind,
        actor: HolderId,
        domain: Option<DomainId>,
        digest: Option<Digest>,
        timestamp: Timestamp,
    ) {
        self.audit.push(AuditRecord {
            kind,
            actor,
            domain,
            digest,
            timestamp,
        });
    }

    fn require_owner(&self, caller: &HolderId) -> Result<(), ClaimError> {
        if *caller != self.owner {
            return Err(ClaimError::Authorization(format!(
                "{caller} is not the engine owner"
            )));
        }
        Ok(())
    }
}

/// Commit-reveal claim authorization over a set of parent domains.
///
/// ## Thread Safety
///
/// All ledger state sits behind one `parking_lot::Mutex`; every method takes
/// `&self` and the engine can be shared across threads in an `Arc`. No
/// registrar call is made while the lock is held.
pub struct AuthorizationEngine {
    /// The account the engine acts as toward the registrar.
    identity: HolderId,
    config: EngineConfig,
    registrar: Arc<dyn Registrar>,
    clock: Arc<dyn Clock>,
    state: Mutex<EngineState>,
}

impl std::fmt::Debug for AuthorizationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationEngine")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AuthorizationEngine {
    /// Create an engine reading wall-clock time.
    pub fn new(
        identity: HolderId,
        owner: HolderId,
        config: EngineConfig,
        registrar: Arc<dyn Registrar>,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(identity, owner, config, registrar, Arc::new(SystemClock))
    }

    /// Create an engine reading time from `clock`.
    pub fn with_clock(
        identity: HolderId,
        owner: HolderId,
        config: EngineConfig,
        registrar: Arc<dyn Registrar>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = EngineState {
            owner,
            paused: false,
            commitments: CommitmentStore::new(config.reveal_delay_secs),
            ledger: ClaimLedger::new(),
            audit: match config.audit_capacity {
                Some(capacity) => {
                    AuditLog::bounded(usize::try_from(capacity).unwrap_or(usize::MAX))
                }
                None => AuditLog::new(),
            },
        };
        Ok(Self {
            identity,
            config,
            registrar,
            clock,
            state: Mutex::new(state),
        })
    }

    // ── Commit / claim ───────────────────────────────────────────────

    /// Record a blinded commitment for `caller`.
    ///
    /// The commitment is opaque here; its parameters are only checked when
    /// revealed by [`claim`](Self::claim).
    pub fn commit(&self, caller: HolderId, commitment: Digest) -> Result<(), ClaimError> {
        let result = self.try_commit(caller, commitment);
        match &result {
            Ok(()) => {
                metrics::counter!(COMMITS_TOTAL).increment(1);
                tracing::info!(holder = %caller, commitment = %commitment, "commitment recorded");
            }
            Err(e) => {
                tracing::warn!(holder = %caller, class = e.class(), error = %e, "commit rejected");
            }
        }
        result
    }

    fn try_commit(&self, caller: HolderId, commitment: Digest) -> Result<(), ClaimError> {
        let mut state = self.state.lock();
        if state.paused {
            return Err(ClaimError::Authorization("engine is paused".to_string()));
        }
        let now = self.clock.now();
        state.commitments.commit(commitment, now)?;
        state.record(AuditKind::Committed, caller, None, Some(commitment), now);
        Ok(())
    }

    /// Reveal a commitment and create the sub-resource.
    pub fn claim(
        &self,
        caller: HolderId,
        request: &ClaimRequest,
    ) -> Result<ClaimOutcome, ClaimError> {
        let result = self.try_claim(caller, request);
        match &result {
            Ok(outcome) => {
                metrics::counter!(CLAIMS_TOTAL).increment(1);
                tracing::info!(
                    domain = %outcome.domain,
                    holder = %outcome.holder,
                    leaf = %outcome.leaf,
                    resource = %outcome.resource,
                    "claim accepted"
                );
            }
            Err(e) => {
                metrics::counter!(CLAIM_REJECTIONS_TOTAL, "class" => e.class()).increment(1);
                tracing::warn!(
                    domain = %request.domain,
                    holder = %caller,
                    class = e.class(),
                    error = %e,
                    "claim rejected"
                );
            }
        }
        result
    }

    fn try_claim(
        &self,
        caller: HolderId,
        request: &ClaimRequest,
    ) -> Result<ClaimOutcome, ClaimError> {
        // Registrar lookups happen before the lock and are judged at their
        // place in the check order below.
        let delegated = self.engine_is_delegated(&request.domain);
        let parent_expiry = self.registrar.expiry_of(&request.domain);

        let record = EntitlementRecord::new(caller, request.label.clone(), request.expiry);
        let commitment = record.commitment(&request.nonce);
        let leaf = record.leaf();
        let implied_root =
            (request.proof.len() <= MAX_PROOF_LEN).then(|| compute_root(&leaf, &request.proof));

        let (receipt, committed_at) = {
            let mut state = self.state.lock();
            let now = self.clock.now();

            if state.paused {
                return Err(ClaimError::Authorization("engine is paused".to_string()));
            }
            let root = state.ledger.require_active(&request.domain)?.root;
            if !delegated.map_err(upstream)? {
                return Err(ClaimError::Authorization(format!(
                    "engine {} is not an approved delegate for domain {}",
                    self.identity, request.domain
                )));
            }

            state.ledger.ensure_holder_unclaimed(&caller)?;

            let parent_expiry = parent_expiry.map_err(upstream)?;
            if request.expiry > parent_expiry {
                return Err(ClaimError::Upstream(format!(
                    "expiry {} exceeds parent expiry {parent_expiry}",
                    request.expiry
                )));
            }

            state.commitments.check_reveal(&commitment, now)?;

            state.ledger.ensure_leaf_unclaimed(&leaf)?;

            match implied_root {
                None => {
                    return Err(ClaimError::Validation(format!(
                        "proof has {} nodes, limit is {MAX_PROOF_LEN}",
                        request.proof.len()
                    )));
                }
                Some(implied) if implied != root => {
                    return Err(ClaimError::Proof(format!(
                        "proof for leaf {leaf} does not reproduce root {root}"
                    )));
                }
                Some(_) => {}
            }

            let receipt = state.ledger.record_claim(request.domain, caller, leaf)?;
            let Some(committed_at) = state.commitments.consume(&commitment) else {
                state.ledger.revert_claim(&receipt);
                return Err(ClaimError::Timing(format!(
                    "no pending commitment {commitment}"
                )));
            };
            (receipt, committed_at)
        };

        let create = CreateRequest {
            parent: request.domain,
            label: request.label.clone(),
            holder: caller,
            resolver: self.config.resolver,
            ttl: self.config.ttl,
            permission_bits: self.config.permission_bits,
            expiry: request.expiry,
        };

        match self.registrar.create(&create) {
            Ok(resource) => {
                let mut state = self.state.lock();
                let now = self.clock.now();
                state.record(
                    AuditKind::Claimed,
                    caller,
                    Some(request.domain),
                    Some(leaf),
                    now,
                );
                Ok(ClaimOutcome {
                    resource,
                    domain: request.domain,
                    holder: caller,
                    leaf,
                })
            }
            Err(e) => {
                self.roll_back(&receipt, commitment, committed_at);
                tracing::error!(
                    domain = %receipt.domain,
                    holder = %receipt.holder,
                    leaf = %receipt.leaf,
                    error = %e,
                    "registrar create failed; claim rolled back"
                );
                Err(ClaimError::Upstream(format!("registrar create failed: {e}")))
            }
        }
    }

    fn roll_back(&self, receipt: &ClaimReceipt, commitment: Digest, committed_at: Timestamp) {
        let mut state = self.state.lock();
        state.ledger.revert_claim(receipt);
        state.commitments.restore(commitment, committed_at);
    }

    fn engine_is_delegated(&self, domain: &DomainId) -> Result<bool, RegistrarError> {
        let owner = self.registrar.owner_of(domain)?;
        if owner == self.identity {
            return Ok(true);
        }
        self.registrar.is_delegate(&owner, &self.identity)
    }

    // ── Domain administration ────────────────────────────────────────

    /// Install a claim configuration for `domain`.
    ///
    /// `caller` must own the parent resource in the registrar or be a
    /// delegate its owner approved. The registrar owner becomes the
    /// configuration owner.
    pub fn initialize_domain(
        &self,
        caller: HolderId,
        domain: DomainId,
        params: DomainParams,
    ) -> Result<DomainConfig, ClaimError> {
        let owner = self.registrar.owner_of(&domain).map_err(upstream)?;
        let permitted = caller == owner
            || self
                .registrar
                .is_delegate(&owner, &caller)
                .map_err(upstream)?;
        if !permitted {
            let err = ClaimError::Authorization(format!(
                "{caller} neither owns nor is delegated for domain {domain}"
            ));
            tracing::warn!(domain = %domain, caller = %caller, error = %err, "initialization rejected");
            return Err(err);
        }

        let mut state = self.state.lock();
        let now = self.clock.now();
        let root = params.root;
        let config = state
            .ledger
            .initialize_domain(domain, params, owner, now)?
            .clone();
        state.record(
            AuditKind::DomainInitialized,
            caller,
            Some(domain),
            Some(root),
            now,
        );
        tracing::info!(
            domain = %domain,
            owner = %owner,
            root = %root,
            total_allowed = config.total_allowed,
            "domain initialized"
        );
        Ok(config)
    }

    /// Switch a domain on or off. Only the configuration owner may do this.
    pub fn set_domain_active(
        &self,
        caller: HolderId,
        domain: DomainId,
        active: bool,
    ) -> Result<(), ClaimError> {
        let mut state = self.state.lock();
        let config = state.ledger.domain(&domain).ok_or_else(|| {
            ClaimError::Authorization(format!("domain {domain} is not configured"))
        })?;
        if config.owner != caller {
            return Err(ClaimError::Authorization(format!(
                "{caller} does not own domain {domain}"
            )));
        }
        if config.active == active {
            return Err(ClaimError::State(format!(
                "domain {domain} is already {}",
                if active { "active" } else { "inactive" }
            )));
        }
        state.ledger.set_active(&domain, active)?;
        let kind = if active {
            AuditKind::DomainActivated
        } else {
            AuditKind::DomainDeactivated
        };
        let now = self.clock.now();
        state.record(kind, caller, Some(domain), None, now);
        tracing::info!(domain = %domain, active, "domain toggled");
        Ok(())
    }

    // ── Engine administration ────────────────────────────────────────

    /// Suspend commit and claim. Queries keep working.
    pub fn pause(&self, caller: HolderId) -> Result<(), ClaimError> {
        self.set_paused(caller, true)
    }

    /// Resume commit and claim.
    pub fn unpause(&self, caller: HolderId) -> Result<(), ClaimError> {
        self.set_paused(caller, false)
    }

    fn set_paused(&self, caller: HolderId, paused: bool) -> Result<(), ClaimError> {
        let mut state = self.state.lock();
        state.require_owner(&caller)?;
        if state.paused == paused {
            return Err(ClaimError::State(format!(
                "engine is already {}",
                if paused { "paused" } else { "running" }
            )));
        }
        state.paused = paused;
        let kind = if paused {
            AuditKind::Paused
        } else {
            AuditKind::Unpaused
        };
        let now = self.clock.now();
        state.record(kind, caller, None, None, now);
        tracing::info!(paused, "engine pause state changed");
        Ok(())
    }

    /// Hand engine ownership to `new_owner`.
    pub fn transfer_ownership(
        &self,
        caller: HolderId,
        new_owner: HolderId,
    ) -> Result<(), ClaimError> {
        if new_owner.is_zero() {
            return Err(ClaimError::Validation(
                "new owner must be non-zero".to_string(),
            ));
        }
        let mut state = self.state.lock();
        state.require_owner(&caller)?;
        state.owner = new_owner;
        let now = self.clock.now();
        state.record(AuditKind::OwnershipTransferred, caller, None, None, now);
        tracing::info!(from = %caller, to = %new_owner, "ownership transferred");
        Ok(())
    }

    /// Remove commitments older than `commitment_max_age_secs`.
    /// Returns how many were removed.
    pub fn prune_commitments(&self, caller: HolderId) -> Result<usize, ClaimError> {
        let max_age = self.config.commitment_max_age_secs.ok_or_else(|| {
            ClaimError::Validation("commitment pruning is not configured".to_string())
        })?;
        let mut state = self.state.lock();
        state.require_owner(&caller)?;
        let now = self.clock.now();
        let removed = state.commitments.prune(now, max_age);
        state.record(AuditKind::CommitmentsPruned, caller, None, None, now);
        tracing::info!(removed, max_age, "stale commitments pruned");
        Ok(removed)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The account the engine acts as toward the registrar.
    pub fn identity(&self) -> HolderId {
        self.identity
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current engine owner.
    pub fn owner(&self) -> HolderId {
        self.state.lock().owner
    }

    /// Whether commit and claim are suspended.
    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    /// A snapshot of `domain`'s configuration.
    pub fn domain_config(&self, domain: &DomainId) -> Option<DomainConfig> {
        self.state.lock().ledger.domain(domain).cloned()
    }

    /// Claims still available under `domain`.
    pub fn remaining_capacity(&self, domain: &DomainId) -> Option<u64> {
        self.state
            .lock()
            .ledger
            .domain(domain)
            .map(DomainConfig::remaining)
    }

    pub fn is_leaf_claimed(&self, leaf: &Digest) -> bool {
        self.state.lock().ledger.is_leaf_claimed(leaf)
    }

    pub fn is_holder_claimed(&self, holder: &HolderId) -> bool {
        self.state.lock().ledger.is_holder_claimed(holder)
    }

    /// When `commitment` was recorded, if it is still pending.
    pub fn commitment_timestamp(&self, commitment: &Digest) -> Option<Timestamp> {
        self.state.lock().commitments.timestamp(commitment)
    }

    /// Whether `commitment` could be revealed now.
    pub fn can_reveal(&self, commitment: &Digest) -> bool {
        let state = self.state.lock();
        state.commitments.can_reveal(commitment, self.clock.now())
    }

    /// Number of commitments awaiting reveal.
    pub fn pending_commitments(&self) -> usize {
        self.state.lock().commitments.len()
    }

    /// Where `leaf` stands, given the commitment its claimant would reveal.
    pub fn claim_state(&self, leaf: &Digest, commitment: &Digest) -> ClaimState {
        let state = self.state.lock();
        if state.ledger.is_leaf_claimed(leaf) {
            ClaimState::Claimed
        } else if state.commitments.timestamp(commitment).is_some() {
            ClaimState::Committed
        } else {
            ClaimState::Unclaimed
        }
    }

    /// Whether `proof` places `leaf` under `domain`'s current root.
    pub fn verify_membership(&self, domain: &DomainId, leaf: &Digest, proof: &[Digest]) -> bool {
        let root = match self.state.lock().ledger.domain(domain) {
            Some(config) => config.root,
            None => return false,
        };
        verify_proof(proof, &root, leaf)
    }

    /// Every accepted transition so far, oldest first.
    pub fn audit_log(&self) -> Vec<AuditRecord> {
        self.state.lock().audit.records().cloned().collect()
    }
}

fn upstream(e: RegistrarError) -> ClaimError {
    ClaimError::Upstream(format!("registrar lookup failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::InMemoryRegistrar;
    use claimgate_core::ManualClock;
    use claimgate_crypto::EntitlementTree;

    const ENGINE: HolderId = HolderId([0xee; 20]);
    const OWNER: HolderId = HolderId([0xaa; 20]);
    const PARENT_OWNER: HolderId = HolderId([0xbb; 20]);
    const ALICE: HolderId = HolderId([0x11; 20]);
    const DOMAIN: DomainId = DomainId([0x33; 32]);
    const START: i64 = 1_700_000_000;

    struct Fixture {
        engine: AuthorizationEngine,
        registrar: Arc<InMemoryRegistrar>,
        clock: Arc<ManualClock>,
        tree: EntitlementTree,
    }

    fn alice_record() -> EntitlementRecord {
        EntitlementRecord::new(ALICE, Label::new("alice").unwrap(), 1_800_000_000)
    }

    fn fixture() -> Fixture {
        let registrar = Arc::new(InMemoryRegistrar::new());
        registrar.register_parent(DOMAIN, PARENT_OWNER, 1_900_000_000);
        registrar.approve(PARENT_OWNER, ENGINE);
        let clock = Arc::new(ManualClock::new(START));
        let engine = AuthorizationEngine::with_clock(
            ENGINE,
            OWNER,
            EngineConfig::default(),
            registrar.clone(),
            clock.clone(),
        )
        .unwrap();
        let tree = EntitlementTree::build(&[
            alice_record(),
            EntitlementRecord::new(HolderId([0x22; 20]), Label::new("bob").unwrap(), 1_800_000_000),
        ])
        .unwrap();
        engine
            .initialize_domain(
                PARENT_OWNER,
                DOMAIN,
                DomainParams {
                    root: tree.root(),
                    label: Label::new("example").unwrap(),
                    total_allowed: 10,
                },
            )
            .unwrap();
        Fixture {
            engine,
            registrar,
            clock,
            tree,
        }
    }

    fn alice_request(f: &Fixture, nonce: Nonce) -> ClaimRequest {
        let record = alice_record();
        ClaimRequest {
            domain: DOMAIN,
            label: record.label.clone(),
            expiry: record.expiry,
            nonce,
            proof: f.tree.proof(&record.leaf()).unwrap(),
        }
    }

    #[test]
    fn test_commit_then_claim() {
        let f = fixture();
        let nonce = Nonce([7; 32]);
        let commitment = alice_record().commitment(&nonce);
        f.engine.commit(ALICE, commitment).unwrap();
        assert_eq!(
            f.engine.claim_state(&alice_record().leaf(), &commitment),
            ClaimState::Committed
        );
        f.clock.advance(60);

        let outcome = f.engine.claim(ALICE, &alice_request(&f, nonce)).unwrap();
        assert_eq!(outcome.holder, ALICE);
        assert_eq!(outcome.leaf, alice_record().leaf());
        assert!(f.registrar.created(&outcome.resource).is_some());
        assert_eq!(f.engine.pending_commitments(), 0);
        assert_eq!(f.engine.remaining_capacity(&DOMAIN), Some(9));
        assert_eq!(
            f.engine.claim_state(&outcome.leaf, &commitment),
            ClaimState::Claimed
        );
    }

    #[test]
    fn test_created_resource_carries_config() {
        let f = fixture();
        let nonce = Nonce([7; 32]);
        f.engine.commit(ALICE, alice_record().commitment(&nonce)).unwrap();
        f.clock.advance(60);
        let outcome = f.engine.claim(ALICE, &alice_request(&f, nonce)).unwrap();
        let created = f.registrar.created(&outcome.resource).unwrap();
        assert_eq!(created.request.permission_bits, crate::config::PARENT_CANNOT_CONTROL);
        assert_eq!(created.request.expiry, 1_800_000_000);
        assert_eq!(created.request.holder, ALICE);
    }

    #[test]
    fn test_engine_without_delegation_cannot_claim() {
        let f = fixture();
        f.registrar.revoke(PARENT_OWNER, ENGINE);
        let nonce = Nonce([7; 32]);
        f.engine.commit(ALICE, alice_record().commitment(&nonce)).unwrap();
        f.clock.advance(60);
        let err = f.engine.claim(ALICE, &alice_request(&f, nonce)).unwrap_err();
        assert!(matches!(err, ClaimError::Authorization(_)));
        assert_eq!(f.engine.pending_commitments(), 1);
    }

    #[test]
    fn test_expiry_beyond_parent_is_upstream() {
        let f = fixture();
        f.registrar.register_parent(DOMAIN, PARENT_OWNER, 1_700_000_000);
        let nonce = Nonce([7; 32]);
        f.engine.commit(ALICE, alice_record().commitment(&nonce)).unwrap();
        f.clock.advance(60);
        let err = f.engine.claim(ALICE, &alice_request(&f, nonce)).unwrap_err();
        assert!(matches!(err, ClaimError::Upstream(_)));
    }

    #[test]
    fn test_bad_proof_keeps_commitment() {
        let f = fixture();
        let nonce = Nonce([7; 32]);
        let commitment = alice_record().commitment(&nonce);
        f.engine.commit(ALICE, commitment).unwrap();
        f.clock.advance(60);
        let mut request = alice_request(&f, nonce);
        request.proof = vec![Digest([9; 32])];
        let err = f.engine.claim(ALICE, &request).unwrap_err();
        assert!(matches!(err, ClaimError::Proof(_)));
        assert!(f.engine.commitment_timestamp(&commitment).is_some());
        assert!(!f.engine.is_holder_claimed(&ALICE));
    }

    #[test]
    fn test_initialize_requires_owner_or_delegate() {
        let f = fixture();
        let other = DomainId([0x44; 32]);
        f.registrar.register_parent(other, PARENT_OWNER, 1_900_000_000);
        let params = DomainParams {
            root: Digest([1; 32]),
            label: Label::new("other").unwrap(),
            total_allowed: 1,
        };
        let stranger = HolderId([0x99; 20]);
        assert!(matches!(
            f.engine.initialize_domain(stranger, other, params.clone()),
            Err(ClaimError::Authorization(_))
        ));
        f.registrar.approve(PARENT_OWNER, stranger);
        let cfg = f.engine.initialize_domain(stranger, other, params).unwrap();
        assert_eq!(cfg.owner, PARENT_OWNER);
    }

    #[test]
    fn test_initialize_unknown_parent_is_upstream() {
        let f = fixture();
        let err = f
            .engine
            .initialize_domain(
                PARENT_OWNER,
                DomainId([0x55; 32]),
                DomainParams {
                    root: Digest([1; 32]),
                    label: Label::new("missing").unwrap(),
                    total_allowed: 1,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ClaimError::Upstream(_)));
    }

    #[test]
    fn test_domain_toggle_owner_only() {
        let f = fixture();
        assert!(matches!(
            f.engine.set_domain_active(ALICE, DOMAIN, false),
            Err(ClaimError::Authorization(_))
        ));
        f.engine.set_domain_active(PARENT_OWNER, DOMAIN, false).unwrap();
        assert!(!f.engine.domain_config(&DOMAIN).unwrap().active);
        assert!(matches!(
            f.engine.set_domain_active(PARENT_OWNER, DOMAIN, false),
            Err(ClaimError::State(_))
        ));
        f.engine.set_domain_active(PARENT_OWNER, DOMAIN, true).unwrap();
        assert!(f.engine.domain_config(&DOMAIN).unwrap().active);
    }

    #[test]
    fn test_pause_is_owner_only_and_not_repeatable() {
        let f = fixture();
        assert!(matches!(
            f.engine.pause(ALICE),
            Err(ClaimError::Authorization(_))
        ));
        f.engine.pause(OWNER).unwrap();
        assert!(f.engine.is_paused());
        assert!(matches!(f.engine.pause(OWNER), Err(ClaimError::State(_))));
        f.engine.unpause(OWNER).unwrap();
        assert!(matches!(f.engine.unpause(OWNER), Err(ClaimError::State(_))));
    }

    #[test]
    fn test_transfer_ownership() {
        let f = fixture();
        let next = HolderId([0x77; 20]);
        assert!(matches!(
            f.engine.transfer_ownership(OWNER, HolderId([0; 20])),
            Err(ClaimError::Validation(_))
        ));
        f.engine.transfer_ownership(OWNER, next).unwrap();
        assert_eq!(f.engine.owner(), next);
        assert!(matches!(
            f.engine.pause(OWNER),
            Err(ClaimError::Authorization(_))
        ));
        f.engine.pause(next).unwrap();
    }

    #[test]
    fn test_prune_requires_configuration() {
        let f = fixture();
        assert!(matches!(
            f.engine.prune_commitments(OWNER),
            Err(ClaimError::Validation(_))
        ));
    }

    #[test]
    fn test_prune_removes_stale_commitments() {
        let registrar = Arc::new(InMemoryRegistrar::new());
        let clock = Arc::new(ManualClock::new(START));
        let config = EngineConfig {
            commitment_max_age_secs: Some(3_600),
            ..EngineConfig::default()
        };
        let engine =
            AuthorizationEngine::with_clock(ENGINE, OWNER, config, registrar, clock.clone())
                .unwrap();
        engine.commit(ALICE, Digest([1; 32])).unwrap();
        clock.advance(3_000);
        engine.commit(ALICE, Digest([2; 32])).unwrap();
        clock.advance(1_000);

        assert!(matches!(
            engine.prune_commitments(ALICE),
            Err(ClaimError::Authorization(_))
        ));
        assert_eq!(engine.prune_commitments(OWNER).unwrap(), 1);
        assert_eq!(engine.commitment_timestamp(&Digest([1; 32])), None);
        assert!(engine.commitment_timestamp(&Digest([2; 32])).is_some());
    }

    #[test]
    fn test_invalid_config_refused() {
        let config = EngineConfig {
            reveal_delay_secs: 100,
            commitment_max_age_secs: Some(10),
            ..EngineConfig::default()
        };
        assert!(AuthorizationEngine::new(
            ENGINE,
            OWNER,
            config,
            Arc::new(InMemoryRegistrar::new())
        )
        .is_err());
    }

    #[test]
    fn test_verify_membership() {
        let f = fixture();
        let leaf = alice_record().leaf();
        let proof = f.tree.proof(&leaf).unwrap();
        assert!(f.engine.verify_membership(&DOMAIN, &leaf, &proof));
        assert!(!f.engine.verify_membership(&DomainId([0x66; 32]), &leaf, &proof));
        assert!(!f.engine.verify_membership(&DOMAIN, &Digest([5; 32]), &proof));
    }

    #[test]
    fn test_claim_request_json_uses_hex() {
        let f = fixture();
        let request = alice_request(&f, Nonce([7; 32]));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["domain"], format!("0x{}", "33".repeat(32)));
        assert_eq!(json["label"], "alice");
        assert_eq!(json["proof"].as_array().unwrap().len(), 1);
        let back: ClaimRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_audit_records_accepted_transitions_only() {
        let f = fixture();
        let nonce = Nonce([7; 32]);
        f.engine.commit(ALICE, alice_record().commitment(&nonce)).unwrap();
        // Too early; rejected, not audited.
        assert!(f.engine.claim(ALICE, &alice_request(&f, nonce)).is_err());
        f.clock.advance(60);
        f.engine.claim(ALICE, &alice_request(&f, nonce)).unwrap();

        let kinds: Vec<AuditKind> = f.engine.audit_log().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                AuditKind::DomainInitialized,
                AuditKind::Committed,
                AuditKind::Claimed
            ]
        );
    }

    #[test]
    fn test_bounded_audit_keeps_latest_records() {
        let registrar = Arc::new(InMemoryRegistrar::new());
        let config = EngineConfig {
            audit_capacity: Some(2),
            ..EngineConfig::default()
        };
        let engine = AuthorizationEngine::with_clock(
            ENGINE,
            OWNER,
            config,
            registrar,
            Arc::new(ManualClock::new(START)),
        )
        .unwrap();
        let commitments: Vec<Digest> = (1..=3u8).map(|n| Digest([n; 32])).collect();
        for commitment in &commitments {
            engine.commit(ALICE, *commitment).unwrap();
        }

        let log = engine.audit_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].digest, Some(commitments[1]));
        assert_eq!(log[1].digest, Some(commitments[2]));
        assert_eq!(engine.pending_commitments(), 3);
    }
}
