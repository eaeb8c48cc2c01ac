//! Shared fixture for the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use claimgate_core::{DomainId, EntitlementRecord, HolderId, Label, ManualClock, Nonce};
use claimgate_crypto::EntitlementTree;
use claimgate_engine::{AuthorizationEngine, ClaimRequest, EngineConfig, InMemoryRegistrar};
use claimgate_state::DomainParams;

pub const ENGINE: HolderId = HolderId([0xee; 20]);
pub const OWNER: HolderId = HolderId([0xaa; 20]);
pub const PARENT_OWNER: HolderId = HolderId([0xbb; 20]);
pub const DOMAIN: DomainId = DomainId([0x33; 32]);
pub const PARENT_EXPIRY: u64 = 2_000_000_000;
pub const START: i64 = 1_700_000_000;
pub const DELAY: u64 = 60;

pub fn holder(n: u8) -> HolderId {
    HolderId([n; 20])
}

pub fn record(n: u8, label: &str) -> EntitlementRecord {
    EntitlementRecord::new(holder(n), Label::new(label).unwrap(), 1_800_000_000)
}

pub struct Harness {
    pub engine: Arc<AuthorizationEngine>,
    pub registrar: Arc<InMemoryRegistrar>,
    pub clock: Arc<ManualClock>,
    pub tree: EntitlementTree,
}

impl Harness {
    pub fn new(records: &[EntitlementRecord], total_allowed: u64) -> Self {
        let registrar = Arc::new(InMemoryRegistrar::new());
        Self::with_registrar(records, total_allowed, registrar.clone(), registrar)
    }

    /// Build a harness whose engine talks to `engine_registrar`, which may
    /// wrap `registrar`.
    pub fn with_registrar(
        records: &[EntitlementRecord],
        total_allowed: u64,
        registrar: Arc<InMemoryRegistrar>,
        engine_registrar: Arc<dyn claimgate_engine::Registrar>,
    ) -> Self {
        registrar.register_parent(DOMAIN, PARENT_OWNER, PARENT_EXPIRY);
        registrar.approve(PARENT_OWNER, ENGINE);
        let clock = Arc::new(ManualClock::new(START));
        let config = EngineConfig {
            reveal_delay_secs: DELAY,
            ..EngineConfig::default()
        };
        let engine = Arc::new(
            AuthorizationEngine::with_clock(ENGINE, OWNER, config, engine_registrar, clock.clone())
                .unwrap(),
        );
        let tree = EntitlementTree::build(records).unwrap();
        engine
            .initialize_domain(
                PARENT_OWNER,
                DOMAIN,
                DomainParams {
                    root: tree.root(),
                    label: Label::new("example").unwrap(),
                    total_allowed,
                },
            )
            .unwrap();
        Self {
            engine,
            registrar,
            clock,
            tree,
        }
    }

    /// The claim request revealing `record` with `nonce`.
    pub fn request(&self, record: &EntitlementRecord, nonce: Nonce) -> ClaimRequest {
        ClaimRequest {
            domain: DOMAIN,
            label: record.label.clone(),
            expiry: record.expiry,
            nonce,
            proof: self.tree.proof(&record.leaf()).unwrap(),
        }
    }

    /// Commit to `record` and return the matching request.
    pub fn commit(&self, record: &EntitlementRecord, nonce: Nonce) -> ClaimRequest {
        self.engine
            .commit(record.holder, record.commitment(&nonce))
            .unwrap();
        self.request(record, nonce)
    }
}
