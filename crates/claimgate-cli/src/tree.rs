//! # Tree Subcommands
//!
//! `build`, `proof` and `verify`: the client-side half of the protocol.
//! Distributors build the tree and publish its root; claimants fetch their
//! proof and may verify it before committing.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use claimgate_core::{Digest, HolderId, Label};
use claimgate_crypto::{EntitlementTree, ProofBundle};

/// Arguments for `claimgate build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// JSON array of `{holder, label, expiry}` records.
    #[arg(value_name = "RECORDS")]
    pub records: PathBuf,
    /// Write the manifest here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Arguments for `claimgate proof`.
#[derive(Args, Debug)]
pub struct ProofArgs {
    /// JSON array of `{holder, label, expiry}` records.
    #[arg(value_name = "RECORDS")]
    pub records: PathBuf,
    /// Holder address (hex).
    #[arg(long)]
    pub holder: HolderId,
    /// Sub-resource label.
    #[arg(long)]
    pub label: String,
    /// Expiry, Unix seconds.
    #[arg(long)]
    pub expiry: u64,
    /// Write the bundle here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Arguments for `claimgate verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Proof bundle JSON, as written by `claimgate proof`.
    #[arg(value_name = "BUNDLE")]
    pub bundle: PathBuf,
    /// Check against this root instead of the one in the bundle.
    #[arg(long)]
    pub root: Option<Digest>,
}

/// Execute `claimgate build`.
pub fn run_build(args: &BuildArgs) -> Result<u8> {
    let records = crate::load_records(&args.records)?;
    let tree = EntitlementTree::build(&records).context("failed to build entitlement tree")?;
    tracing::info!(leaves = tree.leaf_count(), root = %tree.root(), "tree built");
    crate::write_json(&tree.manifest(), args.output.as_deref())?;
    Ok(0)
}

/// Execute `claimgate proof`.
pub fn run_proof(args: &ProofArgs) -> Result<u8> {
    let records = crate::load_records(&args.records)?;
    let label = Label::new(args.label.as_str()).context("invalid label")?;
    let tree = EntitlementTree::build(&records).context("failed to build entitlement tree")?;
    let bundle = tree
        .proof_for(&args.holder, &label, args.expiry)
        .with_context(|| format!("no entitlement for {} / {label:?}", args.holder))?;
    crate::write_json(&bundle, args.output.as_deref())?;
    Ok(0)
}

/// Execute `claimgate verify`. Exits 0 when the proof holds and 1 otherwise.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let bundle = read_bundle(&args.bundle)?;
    let root = args.root.unwrap_or(bundle.root);
    let checked = ProofBundle { root, ..bundle };
    if checked.verify() {
        println!("OK: leaf {} is a member of root {root}", checked.leaf);
        Ok(0)
    } else {
        println!("FAIL: leaf {} is not a member of root {root}", checked.leaf);
        Ok(1)
    }
}

fn read_bundle(path: &Path) -> Result<ProofBundle> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bundle: {}", path.display()))?;
    let bundle: ProofBundle = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse bundle: {}", path.display()))?;
    if bundle.leaf.is_zero() {
        bail!("bundle leaf must be non-zero");
    }
    Ok(bundle)
}
