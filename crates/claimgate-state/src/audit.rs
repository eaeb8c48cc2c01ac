//! # Audit Trail
//!
//! Append-only record of every accepted transition. Rejected transitions
//! change nothing and are not recorded here; they surface as errors and
//! log lines instead.
//!
//! An unbounded log grows by one record per commit and claim. A bounded
//! log keeps only the most recent records and drops the oldest first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use claimgate_core::{Digest, DomainId, HolderId, Timestamp};

/// The kind of transition an [`AuditRecord`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditKind {
    /// A domain configuration was installed.
    DomainInitialized,
    /// A domain was switched on.
    DomainActivated,
    /// A domain was switched off.
    DomainDeactivated,
    /// A commitment was recorded.
    Committed,
    /// A claim was recorded and the sub-resource created.
    Claimed,
    /// Commit and claim were suspended engine-wide.
    Paused,
    /// Commit and claim were resumed.
    Unpaused,
    /// Stale commitments were removed.
    CommitmentsPruned,
    /// Engine ownership moved to a new account.
    OwnershipTransferred,
}

/// One accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// What happened.
    pub kind: AuditKind,
    /// Who caused it.
    pub actor: HolderId,
    /// Domain involved, if any.
    pub domain: Option<DomainId>,
    /// Leaf, commitment, or root involved, if any.
    pub digest: Option<Digest>,
    /// When it happened.
    pub timestamp: Timestamp,
}

/// Append-only list of [`AuditRecord`]s, optionally bounded.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    records: VecDeque<AuditRecord>,
    capacity: Option<usize>,
}

impl AuditLog {
    /// An empty, unbounded log.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty log holding at most `capacity` records. A capacity of zero
    /// is treated as one.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: Some(capacity.max(1)),
        }
    }

    /// Append a record, evicting the oldest if the log is full.
    pub fn push(&mut self, record: AuditRecord) {
        if let Some(capacity) = self.capacity {
            while self.records.len() >= capacity {
                self.records.pop_front();
            }
        }
        self.records.push_back(record);
    }

    /// All retained records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter()
    }

    /// Records of one kind.
    pub fn of_kind(&self, kind: AuditKind) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
