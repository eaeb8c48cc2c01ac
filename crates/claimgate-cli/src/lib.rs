//! # claimgate-cli — Command-Line Tool for Claimgate
//!
//! Provides the `claimgate` command-line interface.
//!
//! ## Subcommands
//!
//! - `claimgate build` — Build an entitlement tree and export every proof.
//! - `claimgate proof` — Look up one record's proof.
//! - `claimgate verify` — Check a proof bundle against a root.
//! - `claimgate blind` — Compute a claim commitment.
//! - `claimgate simulate` — Run commit and claim for every record against
//!   an in-memory registrar.
//!
//! ```bash
//! claimgate build records.json --output tree.json
//! claimgate proof records.json --holder 0x11… --label alice --expiry 1800000000
//! claimgate verify bundle.json
//! claimgate blind --holder 0x11… --label alice --expiry 1800000000
//! claimgate --config engine.yaml simulate records.json --total-allowed 10
//! ```

pub mod blind;
pub mod simulate;
pub mod tree;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use claimgate_core::EntitlementRecord;
use claimgate_engine::EngineConfig;

/// Read a JSON array of `{holder, label, expiry}` records.
pub fn load_records(path: &Path) -> Result<Vec<EntitlementRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read records: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse records: {}", path.display()))
}

/// Load engine configuration from a YAML file, or from the environment when
/// no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            EngineConfig::from_yaml_str(&raw)
                .with_context(|| format!("invalid config: {}", path.display()))
        }
        None => EngineConfig::from_env().context("invalid environment configuration"),
    }
}

/// Pretty-print `value` as JSON to `output`, or to stdout.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    match output {
        Some(path) => std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write output: {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
