//! Error types for commitment and proof generation
//!
//! Generation paths return [`CommitmentResult`] and surface every failure to the
//! caller. Verification paths never use these types directly: any error there
//! collapses to `false`.

use thiserror::Error;

/// Error taxonomy for the commitment/proof engine
///
/// # Design Decision
///
/// Variants map one-to-one onto the failure classes a request layer has to
/// translate into protocol responses:
/// - input problems: `ValidationError`, `ArithmeticOverflow`
/// - state preconditions: `InsufficientCollateral`, `NotLiquidatable`,
///   `InsufficientReserves`, `UnknownIdentity`
/// - untrusted artifacts: `ProofMalformed`
#[derive(Debug, Error)]
pub enum CommitmentError {
    /// Malformed or out-of-range input
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Committed collateral is below the required multiple of debt
    #[error("Insufficient collateral: {collateral} < {required} required")]
    InsufficientCollateral { collateral: u64, required: u64 },

    /// Committed collateral is at or above the liquidation threshold
    #[error("Position not liquidatable: collateral {collateral} >= threshold {threshold}")]
    NotLiquidatable { collateral: u64, threshold: u64 },

    /// Committed reserves do not cover the claimed liability
    #[error("Insufficient reserves: {reserves} < {liability} liability")]
    InsufficientReserves { reserves: u64, liability: u64 },

    /// No live commitment is registered for the identity
    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    /// Operand does not fit the field or the integer width
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: String },

    /// Proof artifact could not be parsed
    #[error("Malformed proof: {0}")]
    ProofMalformed(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CommitmentError {
    pub(crate) fn overflow(operation: &str) -> Self {
        CommitmentError::ArithmeticOverflow {
            operation: operation.to_string(),
        }
    }
}

/// Result type for commitment operations
pub type CommitmentResult<T> = Result<T, CommitmentError>;

/// Input validation utilities
pub mod validation {
    use super::*;

    /// Minimum length of a deterministic derivation secret
    pub const MIN_SECRET_LEN: usize = 8;

    /// Validate a deposit amount in BTC (finite and strictly positive)
    pub fn validate_amount(amount_btc: f64) -> CommitmentResult<()> {
        if !amount_btc.is_finite() || amount_btc <= 0.0 {
            return Err(CommitmentError::ValidationError(format!(
                "amount must be a positive number, got {}",
                amount_btc
            )));
        }
        Ok(())
    }

    /// Validate a debt amount in BTC (finite, zero allowed)
    pub fn validate_debt(debt_btc: f64) -> CommitmentResult<()> {
        if !debt_btc.is_finite() || debt_btc < 0.0 {
            return Err(CommitmentError::ValidationError(format!(
                "debt must be a non-negative number, got {}",
                debt_btc
            )));
        }
        Ok(())
    }

    /// Validate a collateral ratio or liquidation threshold in basis points
    pub fn validate_ratio_bps(bps: u32) -> CommitmentResult<()> {
        if bps == 0 {
            return Err(CommitmentError::ValidationError(
                "ratio must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate an identity key for the registry
    pub fn validate_identity(identity: &str) -> CommitmentResult<()> {
        if identity.trim().is_empty() {
            return Err(CommitmentError::ValidationError(
                "identity must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate a deterministic derivation secret
    pub fn validate_secret(secret: &str) -> CommitmentResult<()> {
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(CommitmentError::ValidationError(format!(
                "secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        Ok(())
    }
}
