//! Engine configuration.
//!
//! Defaults suit a single-chain deployment with a one-minute reveal delay.
//! Override via environment variables or a YAML document.

use serde::{Deserialize, Serialize};

use claimgate_core::HolderId;

/// Permission bit set on every created sub-resource by default: the parent
/// owner cannot later reclaim or reconfigure it.
pub const PARENT_CANNOT_CONTROL: u32 = 0x0001_0000;

/// Configuration for an [`AuthorizationEngine`](crate::AuthorizationEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum seconds between commit and claim.
    pub reveal_delay_secs: u64,
    /// Resolver assigned to created sub-resources.
    pub resolver: HolderId,
    /// TTL assigned to created sub-resources.
    pub ttl: u64,
    /// Permission bits burned on created sub-resources.
    pub permission_bits: u32,
    /// When set, commitments older than this may be pruned by the owner.
    pub commitment_max_age_secs: Option<u64>,
    /// When set, the audit log keeps only this many most recent records.
    pub audit_capacity: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reveal_delay_secs: 60,
            resolver: HolderId([0u8; 20]),
            ttl: 0,
            permission_bits: PARENT_CANNOT_CONTROL,
            commitment_max_age_secs: None,
            audit_capacity: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CLAIMGATE_REVEAL_DELAY_SECS` (default: 60)
    /// - `CLAIMGATE_RESOLVER` (default: zero address)
    /// - `CLAIMGATE_TTL` (default: 0)
    /// - `CLAIMGATE_PERMISSION_BITS` (default: `0x00010000`; decimal or `0x` hex)
    /// - `CLAIMGATE_COMMITMENT_MAX_AGE_SECS` (default: unset)
    /// - `CLAIMGATE_AUDIT_CAPACITY` (default: unset, unbounded)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            reveal_delay_secs: env_u64("CLAIMGATE_REVEAL_DELAY_SECS")?
                .unwrap_or(defaults.reveal_delay_secs),
            resolver: match std::env::var("CLAIMGATE_RESOLVER") {
                Ok(raw) => HolderId::from_hex(&raw).map_err(|e| {
                    ConfigError::InvalidValue("CLAIMGATE_RESOLVER".to_string(), e.to_string())
                })?,
                Err(_) => defaults.resolver,
            },
            ttl: env_u64("CLAIMGATE_TTL")?.unwrap_or(defaults.ttl),
            permission_bits: env_u32("CLAIMGATE_PERMISSION_BITS")?
                .unwrap_or(defaults.permission_bits),
            commitment_max_age_secs: env_u64("CLAIMGATE_COMMITMENT_MAX_AGE_SECS")?,
            audit_capacity: env_u64("CLAIMGATE_AUDIT_CAPACITY")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML. Missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max_age) = self.commitment_max_age_secs {
            if max_age < self.reveal_delay_secs {
                return Err(ConfigError::InvalidValue(
                    "commitment_max_age_secs".to_string(),
                    format!(
                        "{max_age} is shorter than the reveal delay of {}s",
                        self.reveal_delay_secs
                    ),
                ));
            }
        }
        if self.audit_capacity == Some(0) {
            return Err(ConfigError::InvalidValue(
                "audit_capacity".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_u64(var: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(var.to_string(), format!("{raw:?}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn env_u32(var: &str) -> Result<Option<u32>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => {
            let trimmed = raw.trim();
            let parsed = match trimmed.strip_prefix("0x") {
                Some(hex) => u32::from_str_radix(hex, 16),
                None => trimmed.parse(),
            };
            parsed
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue(var.to_string(), format!("{raw:?}: {e}")))
        }
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A field or variable (first) holds an unusable value (second).
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
    /// The YAML document could not be deserialized.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}
