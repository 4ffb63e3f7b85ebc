//! Calldata formatting
//!
//! Maps commitments and proofs to the ordered scalar parameters of the lending
//! contract's entry points:
//!
//! ```text
//! deposit_collateral(commitment, proof_r, proof_s, amount_hint)
//! mint_stable(amount, solvency_proof_json)
//! liquidate_position(borrower, liquidation_proof_json)
//! withdraw_collateral(amount, opening_proof_json)
//! ```

use serde::{Deserialize, Serialize};

use crate::commitment::Commitment;
use crate::error::CommitmentResult;
use crate::primitives::field::{felt_to_hex, Felt};
use crate::proof::{LiquidationProof, OpeningProof, SolvencyProof};

pub const DEPOSIT_COLLATERAL: &str = "deposit_collateral";
pub const MINT_STABLE: &str = "mint_stable";
pub const LIQUIDATE_POSITION: &str = "liquidate_position";
pub const WITHDRAW_COLLATERAL: &str = "withdraw_collateral";

/// A contract entry point and its ordered arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub function_name: String,
    pub calldata: Vec<String>,
}

impl ContractCall {
    fn new(function_name: &str, calldata: Vec<String>) -> Self {
        Self {
            function_name: function_name.to_string(),
            calldata,
        }
    }

    /// Space-separated calldata, as accepted by the ledger CLI
    pub fn formatted(&self) -> String {
        self.calldata.join(" ")
    }
}

fn elements_json(elements: &[Felt]) -> CommitmentResult<String> {
    let hex: Vec<String> = elements.iter().map(felt_to_hex).collect();
    Ok(serde_json::to_string(&hex)?)
}

/// `[hex(digest), hex(nonce), hex(value), decimal(value)]`
///
/// `proof_r`/`proof_s` carry the raw opening until the contract verifies a
/// real proof of knowledge.
pub fn format_deposit(commitment: &Commitment) -> ContractCall {
    ContractCall::new(
        DEPOSIT_COLLATERAL,
        vec![
            commitment.digest_hex(),
            felt_to_hex(&commitment.nonce()),
            felt_to_hex(&Felt::from(commitment.value())),
            commitment.value().to_string(),
        ],
    )
}

/// `[decimal(mint_amount), json(proof.elements)]`
pub fn format_mint(proof: &SolvencyProof, mint_amount: u128) -> CommitmentResult<ContractCall> {
    Ok(ContractCall::new(
        MINT_STABLE,
        vec![mint_amount.to_string(), elements_json(&proof.elements())?],
    ))
}

/// `[borrower, json(proof.elements)]`
pub fn format_liquidate(
    borrower: &str,
    proof: &LiquidationProof,
) -> CommitmentResult<ContractCall> {
    Ok(ContractCall::new(
        LIQUIDATE_POSITION,
        vec![borrower.to_string(), elements_json(&proof.elements())?],
    ))
}

/// `[decimal(amount), json(proof.elements)]`
pub fn format_withdraw(
    amount_satoshis: u64,
    proof: &OpeningProof,
) -> CommitmentResult<ContractCall> {
    Ok(ContractCall::new(
        WITHDRAW_COLLATERAL,
        vec![amount_satoshis.to_string(), elements_json(&proof.elements())?],
    ))
}
