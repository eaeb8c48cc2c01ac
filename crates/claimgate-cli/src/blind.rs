//! # Blind Subcommand
//!
//! Computes the commitment a claimant submits before revealing. When no
//! nonce is supplied a fresh one is drawn; the caller must keep it secret
//! until the claim.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use claimgate_core::{Digest, EntitlementRecord, HolderId, Label, Nonce};

/// Arguments for `claimgate blind`.
#[derive(Args, Debug)]
pub struct BlindArgs {
    /// Holder address (hex).
    #[arg(long)]
    pub holder: HolderId,
    /// Sub-resource label.
    #[arg(long)]
    pub label: String,
    /// Expiry, Unix seconds.
    #[arg(long)]
    pub expiry: u64,
    /// Blinding nonce (hex). Drawn at random when omitted.
    #[arg(long)]
    pub nonce: Option<Nonce>,
    /// Write the result here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Output of `claimgate blind`.
#[derive(Debug, Serialize)]
pub struct Blinded {
    /// Digest to submit with `commit`.
    pub commitment: Digest,
    /// Nonce to reveal with the claim.
    pub nonce: Nonce,
    /// The record's leaf in the entitlement tree.
    pub leaf: Digest,
}

/// Blind `record` with `nonce`.
pub fn blind(record: &EntitlementRecord, nonce: Nonce) -> Blinded {
    Blinded {
        commitment: record.commitment(&nonce),
        nonce,
        leaf: record.leaf(),
    }
}

/// Execute `claimgate blind`.
pub fn run_blind(args: &BlindArgs) -> Result<u8> {
    let label = Label::new(args.label.as_str()).context("invalid label")?;
    let record = EntitlementRecord::new(args.holder, label, args.expiry);
    let nonce = args.nonce.unwrap_or_else(Nonce::random);
    crate::write_json(&blind(&record, nonce), args.output.as_deref())?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blind_matches_known_commitment() {
        let record = EntitlementRecord::new(
            HolderId([0x11; 20]),
            Label::new("alice").unwrap(),
            1_767_225_600,
        );
        let out = blind(&record, Nonce([0x22; 32]));
        assert_eq!(
            out.commitment.to_hex(),
            "be305e327d1a222f00bebec6b49928a08fe922b34ca1224ec8cead71895a7b61"
        );
        assert_eq!(out.leaf, record.leaf());
    }

    #[test]
    fn random_nonce_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("blind.json");
        let args = BlindArgs {
            holder: HolderId([0x11; 20]),
            label: "alice".to_string(),
            expiry: 1,
            nonce: None,
            output: Some(output.clone()),
        };
        run_blind(&args).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert_ne!(json["nonce"], format!("0x{}", "00".repeat(32)));
        assert!(json["commitment"].as_str().unwrap().starts_with("0x"));
    }
}
