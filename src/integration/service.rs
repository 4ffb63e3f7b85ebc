//! Lending Integration Service
//!
//! Turns user intents into contract calls: looks up the caller's live
//! commitment, derives the proof the entry point needs, and formats calldata.
//! Ledger events flow back through [`LendingIntegration::apply_event`] to keep
//! the registry in step with on-chain positions.

use std::sync::Arc;

use serde::Serialize;

use super::calldata::{format_deposit, format_liquidate, format_mint, format_withdraw, ContractCall};
use super::events::{EventKind, LedgerEvent};
use crate::commitment::{Commitment, CommitmentEngine};
use crate::config::{Config, FieldParameters};
use crate::conversion::{btc_to_satoshis, satoshis_to_btc, satoshis_to_token_units};
use crate::error::{validation, CommitmentError, CommitmentResult};
use crate::proof::{LiquidationProof, OpeningProof, PositionHealth, ProofEngine, SolvencyProof};
use crate::registry::{CommitmentStore, InMemoryRegistry};

/// A contract call with the artifact it was built from
#[derive(Debug, Clone, Serialize)]
pub struct PreparedTransaction<A> {
    pub call: ContractCall,
    pub artifact: A,
}

/// Public view of a user's live commitment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitmentSummary {
    pub commitment: String,
    pub value_btc: f64,
    pub value_satoshis: u64,
    pub has_position: bool,
}

/// Lending Integration
///
/// # Example
/// ```ignore
/// let integration = LendingIntegration::new(Config::load()?);
/// let deposit = integration.prepare_deposit("0x123", 2.0)?;
/// let mint = integration.prepare_mint("0x123", 1.0)?;
/// println!("{}", mint.call.formatted());
/// ```
#[derive(Debug, Clone)]
pub struct LendingIntegration {
    config: Config,
    commitments: CommitmentEngine,
    proofs: ProofEngine,
    store: Arc<dyn CommitmentStore>,
}

impl LendingIntegration {
    /// Integration over a fresh in-memory registry
    pub fn new(config: Config) -> Self {
        Self::with_store(config, Arc::new(InMemoryRegistry::new()))
    }

    /// Integration over a caller-supplied store
    pub fn with_store(config: Config, store: Arc<dyn CommitmentStore>) -> Self {
        let scheme = config.scheme.build(FieldParameters::starknet());
        tracing::info!(
            "Lending integration ready: scheme={}, ratio={}, threshold={}",
            scheme.kind(),
            config.collateral_ratio.to_decimal_string(),
            config.liquidation_threshold.to_decimal_string()
        );
        if config.uses_reference_group_in_production() {
            tracing::warn!(
                "Reference Pedersen group selected in production; its discrete logs are cheap"
            );
        }
        Self {
            commitments: CommitmentEngine::new(scheme.clone(), store.clone()),
            proofs: ProofEngine::new(scheme),
            store,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn commitments(&self) -> &CommitmentEngine {
        &self.commitments
    }

    pub fn proofs(&self) -> &ProofEngine {
        &self.proofs
    }

    pub fn store(&self) -> &Arc<dyn CommitmentStore> {
        &self.store
    }

    /// Commit to a deposit and build `deposit_collateral`
    pub fn prepare_deposit(
        &self,
        user: &str,
        amount_btc: f64,
    ) -> CommitmentResult<PreparedTransaction<Commitment>> {
        let commitment = self.commitments.generate_commitment(amount_btc, Some(user))?;
        Ok(PreparedTransaction {
            call: format_deposit(&commitment),
            artifact: commitment,
        })
    }

    /// Prove solvency for `debt_btc` and build `mint_stable`
    ///
    /// The mint amount is the debt rescaled to the stablecoin's decimals.
    pub fn prepare_mint(
        &self,
        user: &str,
        debt_btc: f64,
    ) -> CommitmentResult<PreparedTransaction<SolvencyProof>> {
        validation::validate_debt(debt_btc)?;
        let commitment = self.store.require(user)?;
        let debt_satoshis = btc_to_satoshis(debt_btc);

        let proof = self.proofs.solvency_proof_satoshis(
            &commitment,
            debt_satoshis,
            self.config.collateral_ratio,
        )?;
        let mint_amount = satoshis_to_token_units(debt_satoshis, self.config.stable_decimals)?;

        Ok(PreparedTransaction {
            call: format_mint(&proof, mint_amount)?,
            artifact: proof,
        })
    }

    /// Prove `borrower` is under the liquidation threshold and build `liquidate_position`
    pub fn prepare_liquidation(
        &self,
        liquidator: &str,
        borrower: &str,
        debt_btc: f64,
    ) -> CommitmentResult<PreparedTransaction<LiquidationProof>> {
        validation::validate_debt(debt_btc)?;
        let commitment = self.store.require(borrower)?;

        let proof = self.proofs.liquidation_proof_satoshis(
            &commitment,
            btc_to_satoshis(debt_btc),
            self.config.liquidation_threshold,
        )?;

        tracing::info!("Liquidation of {} prepared for {}", borrower, liquidator);

        Ok(PreparedTransaction {
            call: format_liquidate(borrower, &proof)?,
            artifact: proof,
        })
    }

    /// Open the user's commitment and build `withdraw_collateral`
    ///
    /// Opening reveals the whole commitment, so a withdrawal always takes the
    /// full committed value. Collateral that should stay locked is redeposited
    /// under a fresh commitment afterwards.
    ///
    /// # Errors
    /// - `ValidationError`: amount not positive, or not the committed value
    pub fn prepare_withdraw(
        &self,
        user: &str,
        amount_btc: f64,
    ) -> CommitmentResult<PreparedTransaction<OpeningProof>> {
        validation::validate_amount(amount_btc)?;
        let commitment = self.store.require(user)?;
        let amount = btc_to_satoshis(amount_btc);

        if amount != commitment.value() {
            return Err(CommitmentError::ValidationError(format!(
                "withdrawal of {} sat must equal the committed {} sat",
                amount,
                commitment.value()
            )));
        }

        let proof = self.proofs.generate_opening_proof(&commitment);
        Ok(PreparedTransaction {
            call: format_withdraw(amount, &proof)?,
            artifact: proof,
        })
    }

    /// Collateralization of `user` at the configured minting ratio
    pub fn position_health(&self, user: &str, debt_btc: f64) -> CommitmentResult<PositionHealth> {
        validation::validate_debt(debt_btc)?;
        let commitment = self.store.require(user)?;
        self.proofs.position_health(
            &commitment,
            btc_to_satoshis(debt_btc),
            self.config.collateral_ratio,
        )
    }

    pub fn commitment_summary(&self, user: &str) -> Option<CommitmentSummary> {
        self.store.get(user).map(|c| CommitmentSummary {
            commitment: c.digest_hex(),
            value_btc: satoshis_to_btc(c.value()),
            value_satoshis: c.value(),
            has_position: true,
        })
    }

    /// Reflect a ledger event in the registry
    ///
    /// Clears the identity's entry on liquidation and on any withdrawal: once
    /// collateral has left, the old commitment no longer describes the
    /// position. Returns the removed commitment.
    pub fn apply_event(&self, event: &LedgerEvent) -> Option<Commitment> {
        if event.identity.is_empty() {
            return None;
        }

        let removed = match event.kind() {
            EventKind::PositionLiquidated | EventKind::CollateralWithdrawn => {
                self.store.remove(&event.identity)
            }
            _ => None,
        };

        if removed.is_some() {
            tracing::info!("Position of {} cleared after {}", event.identity, event.event_type);
        }
        removed
    }
}
