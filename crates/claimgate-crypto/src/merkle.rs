//! # Entitlement Merkle Tree
//!
//! A static binary Merkle tree over entitlement leaves. Built once from the
//! full, deduplicated record set; the root is published to the claim ledger
//! and each holder receives the sibling path for their own leaf.
//!
//! ## Algorithm
//!
//! - Leaf: `claimgate_core::leaf_hash(holder, label, expiry)`.
//! - Leaves are sorted ascending to form the bottom level.
//! - Each level pairs neighbours `(2i, 2i + 1)` and hashes them with
//!   `claimgate_core::node_hash()`, which sorts the pair first.
//! - An unpaired last node is promoted unchanged to the next level.
//!
//! Because both the leaf order and each pair are sorted, any permutation of
//! the same records yields the same tree. A proof is the ordered list of
//! siblings from the leaf upward; levels where the node was promoted
//! contribute no sibling.
//!
//! ## Edge Cases
//!
//! - Zero records: rejected with [`TreeError::Empty`].
//! - One record: the root is that record's leaf and its proof is empty.
//! - Duplicate records: rejected with [`TreeError::DuplicateLeaf`], since a
//!   repeated leaf makes its proof depend on which copy is chosen.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use claimgate_core::{leaf_hash, node_hash, Digest, EntitlementRecord, HolderId, Label};

/// Errors from tree construction and proof lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// No records were supplied.
    #[error("cannot build a tree from zero records")]
    Empty,

    /// Two records hash to the same leaf.
    #[error("duplicate entitlement leaf {0}")]
    DuplicateLeaf(Digest),

    /// The requested leaf is not part of this tree.
    #[error("leaf {0} is not in the entitlement set")]
    UnknownLeaf(Digest),
}

/// A membership proof for one record, as handed to a claimant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBundle {
    /// The record's leaf digest.
    pub leaf: Digest,
    /// Sibling digests from the leaf level upward.
    pub proof: Vec<Digest>,
    /// The tree root the proof resolves to.
    pub root: Digest,
}

impl ProofBundle {
    /// Check the bundle against its own root.
    pub fn verify(&self) -> bool {
        verify_proof(&self.proof, &self.root, &self.leaf)
    }
}

/// One record with its leaf and proof, as exported for distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeManifestEntry {
    /// Entitled holder.
    pub holder: HolderId,
    /// Sub-resource label.
    pub label: Label,
    /// Expiry, Unix seconds.
    pub expiry: u64,
    /// Leaf digest.
    pub leaf: Digest,
    /// Membership proof.
    pub proof: Vec<Digest>,
}

/// The full export of a built tree: root plus every record's proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeManifest {
    /// Tree root.
    pub root: Digest,
    /// Number of leaves.
    pub leaf_count: usize,
    /// Entries in leaf order.
    pub entries: Vec<TreeManifestEntry>,
}

/// A built entitlement tree.
#[derive(Debug, Clone)]
pub struct EntitlementTree {
    /// `levels[0]` holds the sorted leaves; the last level holds the root.
    levels: Vec<Vec<Digest>>,
    /// Records keyed by their leaf, for proof lookup by record fields.
    records: BTreeMap<Digest, EntitlementRecord>,
}

impl EntitlementTree {
    /// Build a tree from a validated, deduplicated record set.
    pub fn build(records: &[EntitlementRecord]) -> Result<Self, TreeError> {
        if records.is_empty() {
            return Err(TreeError::Empty);
        }

        let mut by_leaf = BTreeMap::new();
        for record in records {
            let leaf = record.leaf();
            if by_leaf.insert(leaf, record.clone()).is_some() {
                return Err(TreeError::DuplicateLeaf(leaf));
            }
        }

        // BTreeMap iteration is already ascending by leaf.
        let leaves: Vec<Digest> = by_leaf.keys().copied().collect();
        let levels = build_levels(leaves);

        let tree = Self {
            levels,
            records: by_leaf,
        };
        tracing::debug!(
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            root = %tree.root(),
            "built entitlement tree"
        );
        Ok(tree)
    }

    /// The tree root.
    pub fn root(&self) -> Digest {
        // `build` rejects empty input, so the top level has exactly one node.
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or(Digest::ZERO)
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Number of hashing levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Whether `leaf` is part of the tree.
    pub fn contains(&self, leaf: &Digest) -> bool {
        self.records.contains_key(leaf)
    }

    /// Sorted leaves.
    pub fn leaves(&self) -> &[Digest] {
        self.levels.first().map_or(&[], Vec::as_slice)
    }

    /// The sibling path for `leaf`.
    pub fn proof(&self, leaf: &Digest) -> Result<Vec<Digest>, TreeError> {
        let mut pos = self
            .leaves()
            .binary_search(leaf)
            .map_err(|_| TreeError::UnknownLeaf(*leaf))?;

        let mut path = Vec::with_capacity(self.depth());
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = pos ^ 1;
            if let Some(hash) = level.get(sibling) {
                path.push(*hash);
            }
            pos /= 2;
        }
        Ok(path)
    }

    /// Look up the proof bundle for a record by its fields.
    pub fn proof_for(
        &self,
        holder: &HolderId,
        label: &Label,
        expiry: u64,
    ) -> Result<ProofBundle, TreeError> {
        let leaf = leaf_hash(holder, label, expiry);
        let proof = self.proof(&leaf)?;
        Ok(ProofBundle {
            leaf,
            proof,
            root: self.root(),
        })
    }

    /// Export the root and every record's proof.
    pub fn manifest(&self) -> TreeManifest {
        let entries = self
            .records
            .iter()
            .map(|(leaf, record)| TreeManifestEntry {
                holder: record.holder,
                label: record.label.clone(),
                expiry: record.expiry,
                leaf: *leaf,
                proof: self.proof(leaf).unwrap_or_default(),
            })
            .collect();
        TreeManifest {
            root: self.root(),
            leaf_count: self.leaf_count(),
            entries,
        }
    }
}

fn build_levels(leaves: Vec<Digest>) -> Vec<Vec<Digest>> {
    let mut levels = vec![leaves];
    while let Some(current) = levels.last() {
        if current.len() <= 1 {
            break;
        }
        let next: Vec<Digest> = current
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => node_hash(a, b),
                [single] => *single,
                _ => Digest::ZERO,
            })
            .collect();
        levels.push(next);
    }
    levels
}

/// Longest proof accepted by [`verify_proof`]. A tree this deep would hold
/// 2^64 leaves, so every honest proof is shorter.
pub const MAX_PROOF_LEN: usize = 64;

/// Fold `proof` upward from `leaf`, returning the implied root.
///
/// Callers holding shared state should check the length against
/// [`MAX_PROOF_LEN`] first; this function folds whatever it is given.
pub fn compute_root(leaf: &Digest, proof: &[Digest]) -> Digest {
    proof
        .iter()
        .fold(*leaf, |acc, sibling| node_hash(&acc, sibling))
}

/// Whether `proof` links `leaf` to `root`.
///
/// Never errors: a malformed or foreign proof simply fails to reproduce the
/// root. Proofs longer than [`MAX_PROOF_LEN`] are rejected without hashing.
pub fn verify_proof(proof: &[Digest], root: &Digest, leaf: &Digest) -> bool {
    proof.len() <= MAX_PROOF_LEN && compute_root(leaf, proof) == *root
}
