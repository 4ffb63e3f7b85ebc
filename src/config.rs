//! Configuration Module
//!
//! Two layers:
//!
//! 1. Field & Generator Config: the ledger's prime and the two Pedersen generators.
//!    Compile-time constants, never mutated.
//! 2. Protocol `Config`: ratios, scheme selection and token decimals, read from
//!    environment variables with development defaults. Parsing failures abort
//!    loading instead of falling back silently.

use std::env;

use anyhow::{Context, Result};

use crate::conversion::Ratio;
use crate::primitives::field::{felt_from_be_limbs, modulus_hex, Felt};
use crate::primitives::scheme::SchemeKind;

/// Starknet field prime P = 2^251 + 17 * 2^192 + 1 (felt252)
pub const STARK_PRIME_DECIMAL: &str =
    "3618502788666131213697322783095070105623107215331596699973092056135872020481";

/// Generator G (Starknet Pedersen hash point x-coordinate)
pub const GENERATOR_G_HEX: &str =
    "0x1ef15c18599971b7beced415a40f0c7deacfd9b0d1819e03d723d8bc943cfca";

/// Generator H
pub const GENERATOR_H_HEX: &str =
    "0x5af3107a4000c94cd5b6fd87df0e9b6fd378d766499c0b09adbaf0e3e2a8c8e";

const GENERATOR_G_LIMBS: [u64; 4] = [
    0x01ef15c18599971b,
    0x7beced415a40f0c7,
    0xdeacfd9b0d1819e0,
    0x3d723d8bc943cfca,
];

const GENERATOR_H_LIMBS: [u64; 4] = [
    0x05af3107a4000c94,
    0xcd5b6fd87df0e9b6,
    0xfd378d766499c0b0,
    0x9adbaf0e3e2a8c8e,
];

/// Modulus and generators a commitment is computed under
#[derive(Debug, Clone, PartialEq)]
pub struct FieldParameters {
    pub g: Felt,
    pub h: Felt,
}

impl FieldParameters {
    /// Starknet felt252 field with the Starknet Pedersen generators
    pub fn starknet() -> Self {
        Self {
            g: felt_from_be_limbs(GENERATOR_G_LIMBS),
            h: felt_from_be_limbs(GENERATOR_H_LIMBS),
        }
    }

    /// Custom generators over the same field
    pub fn with_generators(g: Felt, h: Felt) -> Self {
        Self { g, h }
    }

    /// Modulus as `0x` hex (as recorded in proof bundles)
    pub fn modulus_hex(&self) -> String {
        modulus_hex()
    }
}

impl Default for FieldParameters {
    fn default() -> Self {
        Self::starknet()
    }
}

/// Deployment environment
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Protocol configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Minimum collateral / debt for minting (default 150%)
    pub collateral_ratio: Ratio,

    /// Collateral / debt below which a position is liquidatable (default 120%)
    pub liquidation_threshold: Ratio,

    /// Commitment scheme for new commitments
    pub scheme: SchemeKind,

    /// Decimals of the minted stablecoin (default 18)
    pub stable_decimals: u32,

    pub environment: Environment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collateral_ratio: Ratio::from_bps(15_000),
            liquidation_threshold: Ratio::from_bps(12_000),
            scheme: SchemeKind::Pedersen,
            stable_decimals: 18,
            environment: Environment::Development,
        }
    }
}

impl Config {
    /// Load `.env` (if present), then read the process environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Read configuration from environment variables
    ///
    /// # Optional Environment Variables
    ///
    /// - `COLLATERAL_RATIO_BPS`: minting ratio in basis points (default: 15000)
    /// - `LIQUIDATION_THRESHOLD_BPS`: liquidation threshold in basis points (default: 12000)
    /// - `COMMITMENT_SCHEME`: pedersen | legacy_hash (default: pedersen)
    /// - `STABLE_DECIMALS`: stablecoin decimals (default: 18)
    /// - `ENVIRONMENT`: development | staging | production
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let collateral_ratio: u32 = lookup("COLLATERAL_RATIO_BPS")
            .unwrap_or_else(|| "15000".to_string())
            .parse()
            .context("COLLATERAL_RATIO_BPS must be a valid number")?;

        let liquidation_threshold: u32 = lookup("LIQUIDATION_THRESHOLD_BPS")
            .unwrap_or_else(|| "12000".to_string())
            .parse()
            .context("LIQUIDATION_THRESHOLD_BPS must be a valid number")?;

        if collateral_ratio == 0 || liquidation_threshold == 0 {
            anyhow::bail!("collateral ratio and liquidation threshold must be non-zero");
        }

        let scheme: SchemeKind = lookup("COMMITMENT_SCHEME")
            .unwrap_or_else(|| "pedersen".to_string())
            .parse()
            .context("COMMITMENT_SCHEME must be pedersen or legacy_hash")?;

        Ok(Config {
            collateral_ratio: Ratio::from_bps(collateral_ratio),
            liquidation_threshold: Ratio::from_bps(liquidation_threshold),
            scheme,
            stable_decimals: lookup("STABLE_DECIMALS")
                .unwrap_or_else(|| "18".to_string())
                .parse()
                .context("STABLE_DECIMALS must be a valid number")?,
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Production deployment over the reference Pedersen group, whose
    /// discrete logs are cheap to compute
    pub fn uses_reference_group_in_production(&self) -> bool {
        self.is_production() && self.scheme == SchemeKind::Pedersen
    }
}
