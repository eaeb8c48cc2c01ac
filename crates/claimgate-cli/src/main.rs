//! # claimgate CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use claimgate_cli::blind::{run_blind, BlindArgs};
use claimgate_cli::simulate::{run_simulate, SimulateArgs};
use claimgate_cli::tree::{run_build, run_proof, run_verify, BuildArgs, ProofArgs, VerifyArgs};

/// Claimgate — commit-reveal claim authorization over entitlement trees.
#[derive(Parser, Debug)]
#[command(name = "claimgate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    /// Ignored when `RUST_LOG` is set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Engine configuration (YAML). Falls back to `CLAIMGATE_*` variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build an entitlement tree and export its root and every proof.
    Build(BuildArgs),

    /// Look up the membership proof for one record.
    Proof(ProofArgs),

    /// Verify a proof bundle.
    Verify(VerifyArgs),

    /// Compute a claim commitment.
    Blind(BlindArgs),

    /// Commit and claim every record against an in-memory registrar.
    Simulate(SimulateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Build(args) => run_build(args),
        Commands::Proof(args) => run_proof(args),
        Commands::Verify(args) => run_verify(args),
        Commands::Blind(args) => run_blind(args),
        Commands::Simulate(args) => claimgate_cli::load_config(cli.config.as_deref())
            .and_then(|config| run_simulate(args, config)),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
