//! # Simulate Subcommand
//!
//! Runs the whole protocol for a record set: build the tree, initialize a
//! domain, commit for every record, step a manual clock past the reveal
//! delay, and claim. Claims go through the real engine against an
//! in-memory registrar, so capacity, exactly-once and timing rules apply
//! exactly as they would in a deployment.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use claimgate_core::{
    Digest, DomainId, EntitlementRecord, HolderId, Label, ManualClock, Nonce, ResourceId,
    Timestamp,
};
use claimgate_crypto::EntitlementTree;
use claimgate_engine::{AuthorizationEngine, ClaimRequest, EngineConfig, InMemoryRegistrar};
use claimgate_state::DomainParams;

const ENGINE_IDENTITY: HolderId = HolderId([0xee; 20]);
const ENGINE_OWNER: HolderId = HolderId([0xaa; 20]);
const PARENT_OWNER: HolderId = HolderId([0xbb; 20]);

/// Arguments for `claimgate simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// JSON array of `{holder, label, expiry}` records.
    #[arg(value_name = "RECORDS")]
    pub records: PathBuf,
    /// Label of the parent domain.
    #[arg(long, default_value = "example")]
    pub domain: String,
    /// Maximum number of claims. Defaults to the number of records.
    #[arg(long)]
    pub total_allowed: Option<u64>,
    /// Parent expiry, Unix seconds. Defaults to the latest record expiry.
    #[arg(long)]
    pub parent_expiry: Option<u64>,
    /// Write the report here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// One claim attempted during a simulation.
#[derive(Debug, Serialize)]
pub struct ClaimReport {
    /// Claiming account.
    pub holder: HolderId,
    /// Requested sub-resource label.
    pub label: Label,
    /// Created sub-resource, when the claim succeeded.
    pub resource: Option<ResourceId>,
    /// Short error class, when the claim was rejected.
    pub error_class: Option<&'static str>,
    /// Full rejection message.
    pub error: Option<String>,
}

/// The result of a simulation.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    /// Parent domain id, the SHA-256 of its label.
    pub domain: DomainId,
    /// Entitlement tree root installed for the domain.
    pub root: Digest,
    /// Number of successful claims.
    pub claimed: usize,
    /// Number of rejected claims.
    pub rejected: usize,
    /// Claims still allowed after the run.
    pub remaining_capacity: u64,
    /// Every claim in record order.
    pub claims: Vec<ClaimReport>,
}

/// Execute `claimgate simulate`.
pub fn run_simulate(args: &SimulateArgs, config: EngineConfig) -> Result<u8> {
    let records = crate::load_records(&args.records)?;
    let domain_label = Label::new(args.domain.as_str()).context("invalid domain label")?;
    let report = simulate(
        &records,
        domain_label,
        args.total_allowed,
        args.parent_expiry,
        config,
    )?;
    tracing::info!(
        claimed = report.claimed,
        rejected = report.rejected,
        "simulation finished"
    );
    crate::write_json(&report, args.output.as_deref())?;
    Ok(0)
}

/// Run commit and claim for every record.
pub fn simulate(
    records: &[EntitlementRecord],
    domain_label: Label,
    total_allowed: Option<u64>,
    parent_expiry: Option<u64>,
    config: EngineConfig,
) -> Result<SimulationReport> {
    let tree = EntitlementTree::build(records).context("failed to build entitlement tree")?;
    let domain = DomainId(Digest::sha256(domain_label.as_str().as_bytes()).0);
    let parent_expiry = parent_expiry
        .or_else(|| records.iter().map(|r| r.expiry).max())
        .unwrap_or(u64::MAX);
    let total_allowed = total_allowed.unwrap_or(records.len() as u64);
    let delay = config.reveal_delay_secs;

    let registrar = Arc::new(InMemoryRegistrar::new());
    registrar.register_parent(domain, PARENT_OWNER, parent_expiry);
    registrar.approve(PARENT_OWNER, ENGINE_IDENTITY);
    let clock = Arc::new(ManualClock::new(Timestamp::now().epoch_secs()));
    let engine = AuthorizationEngine::with_clock(
        ENGINE_IDENTITY,
        ENGINE_OWNER,
        config,
        registrar,
        clock.clone(),
    )?;

    engine.initialize_domain(
        PARENT_OWNER,
        domain,
        DomainParams {
            root: tree.root(),
            label: domain_label,
            total_allowed,
        },
    )?;

    let mut pending = Vec::with_capacity(records.len());
    for record in records {
        let nonce = Nonce::random();
        engine.commit(record.holder, record.commitment(&nonce))?;
        let request = ClaimRequest {
            domain,
            label: record.label.clone(),
            expiry: record.expiry,
            nonce,
            proof: tree.proof(&record.leaf())?,
        };
        pending.push((record, request));
    }

    clock.advance(delay);

    let claims: Vec<ClaimReport> = pending
        .into_iter()
        .map(|(record, request)| match engine.claim(record.holder, &request) {
            Ok(outcome) => ClaimReport {
                holder: record.holder,
                label: record.label.clone(),
                resource: Some(outcome.resource),
                error_class: None,
                error: None,
            },
            Err(e) => ClaimReport {
                holder: record.holder,
                label: record.label.clone(),
                resource: None,
                error_class: Some(e.class()),
                error: Some(e.to_string()),
            },
        })
        .collect();

    let claimed = claims.iter().filter(|c| c.resource.is_some()).count();
    Ok(SimulationReport {
        domain,
        root: tree.root(),
        claimed,
        rejected: claims.len() - claimed,
        remaining_capacity: engine.remaining_capacity(&domain).unwrap_or(0),
        claims,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<EntitlementRecord> {
        vec![
            EntitlementRecord::new(HolderId([0x11; 20]), Label::new("alice").unwrap(), 1_800_000_000),
            EntitlementRecord::new(HolderId([0x22; 20]), Label::new("bob").unwrap(), 1_900_000_000),
            EntitlementRecord::new(HolderId([0x33; 20]), Label::new("carol").unwrap(), 1_900_000_000),
        ]
    }

    #[test]
    fn all_records_claim_when_capacity_allows() {
        let report = simulate(
            &records(),
            Label::new("example").unwrap(),
            None,
            None,
            EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(report.claimed, 3);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.remaining_capacity, 0);
    }

    #[test]
    fn capacity_limits_claims() {
        let report = simulate(
            &records(),
            Label::new("example").unwrap(),
            Some(2),
            None,
            EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(report.claimed, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.claims[2].error_class, Some("state"));
    }

    #[test]
    fn parent_expiry_caps_claims() {
        let report = simulate(
            &records(),
            Label::new("example").unwrap(),
            None,
            Some(1_850_000_000),
            EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(report.claimed, 1);
        assert!(report
            .claims
            .iter()
            .filter(|c| c.resource.is_none())
            .all(|c| c.error_class == Some("upstream")));
    }
}
