//! # claimgate-engine — Claim Authorization Engine
//!
//! Gates creation of sub-resources under a parent domain behind three
//! guarantees:
//!
//! 1. **Membership** — the claimed `(holder, label, expiry)` is a leaf of
//!    the domain's entitlement tree.
//! 2. **Exactly once** — each leaf and each holder redeem at most once.
//! 3. **Commit-reveal** — the claim parameters are bound by a blinded
//!    commitment that must age past the reveal delay before use, so a
//!    front-runner who sees the reveal cannot win the race with a fresh
//!    commitment.
//!
//! ## Modules
//!
//! - `engine` — the `AuthorizationEngine` state machine.
//! - `registrar` — the downstream `Registrar` trait and an in-memory
//!   implementation.
//! - `config` — `EngineConfig`, loaded from the environment or YAML.
//!
//! ## Concurrency
//!
//! Every transition runs under one `parking_lot::Mutex` over the whole
//! ledger. Registrar calls never run under that lock: lookups are fetched
//! before it is taken, and `create` runs after the claim's writes have been
//! committed, with a compensating rollback if it fails.

pub mod config;
pub mod engine;
pub mod registrar;

pub use config::{ConfigError, EngineConfig};
pub use engine::{AuthorizationEngine, ClaimOutcome, ClaimRequest};
pub use registrar::{CreateRequest, InMemoryRegistrar, Registrar, RegistrarError};
