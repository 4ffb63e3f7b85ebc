//! Proof Engine
//!
//! Derives solvency, liquidation and opening artifacts from a [`Commitment`]
//! and checks them.
//!
//! # Artifacts
//!
//! ```text
//! Solvency     value >= ceil(debt * ratio)       [digest, tag, required_collateral]
//! Liquidation  value <  floor(debt * threshold)  [digest, tag, threshold_collateral]
//! Opening      value revealed                    [digest, value, nonce, tag]
//! Reserves     sum(values) >= liability          [aggregate, reserve_set, tag, liability]
//! ```
//!
//! A proof never carries the hidden value or nonce except for `Opening`, whose
//! purpose is to reveal them. `Reserves` carries the homomorphic sum of the
//! reserve commitments, so only the total can ever be opened.
//!
//! The binding tag ties the public parameters to the digest:
//! `SHA256("{digest}:{amount}:{label}")[..31]`.
//!
//! Generation checks the predicate against the committed value and refuses to
//! produce an artifact when it does not hold. Verification recomputes every
//! derived field and never fails; anything inconsistent is `false`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::commitment::Commitment;
use crate::conversion::{btc_to_satoshis, Ratio};
use crate::error::{validation, CommitmentError, CommitmentResult};
use crate::primitives::field::{
    felt_from_hash_prefix, felt_to_bytes, felt_to_decimal, felt_to_hex, Felt,
};
use crate::primitives::scheme::CommitmentScheme;

const OPENING_LABEL: &str = "opening";
const RESERVES_LABEL: &str = "reserves";

/// `SHA256("{digest_decimal}:{amount}:{label}")` truncated to 31 bytes
pub fn binding_tag(digest: &Felt, amount: u64, label: &str) -> Felt {
    let preimage = format!("{}:{}:{}", felt_to_decimal(digest), amount, label);
    felt_from_hash_prefix(&Sha256::digest(preimage.as_bytes()))
}

/// Proof that committed collateral covers `debt * ratio`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvencyProof {
    commitment: Felt,
    debt_satoshis: u64,
    collateral_ratio: Ratio,
    ratio_percent: u32,
    required_collateral: u64,
    binding_tag: Felt,
}

impl SolvencyProof {
    pub fn commitment(&self) -> Felt {
        self.commitment
    }

    pub fn debt_satoshis(&self) -> u64 {
        self.debt_satoshis
    }

    pub fn collateral_ratio(&self) -> Ratio {
        self.collateral_ratio
    }

    pub fn ratio_percent(&self) -> u32 {
        self.ratio_percent
    }

    pub fn required_collateral(&self) -> u64 {
        self.required_collateral
    }

    pub fn binding_tag(&self) -> Felt {
        self.binding_tag
    }

    pub fn elements(&self) -> Vec<Felt> {
        vec![
            self.commitment,
            self.binding_tag,
            Felt::from(self.required_collateral),
        ]
    }
}

/// Proof that committed collateral is below `debt * threshold`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationProof {
    commitment: Felt,
    debt_satoshis: u64,
    liquidation_threshold: Ratio,
    threshold_percent: u32,
    threshold_collateral: u64,
    binding_tag: Felt,
}

impl LiquidationProof {
    pub fn commitment(&self) -> Felt {
        self.commitment
    }

    pub fn debt_satoshis(&self) -> u64 {
        self.debt_satoshis
    }

    pub fn liquidation_threshold(&self) -> Ratio {
        self.liquidation_threshold
    }

    pub fn threshold_percent(&self) -> u32 {
        self.threshold_percent
    }

    pub fn threshold_collateral(&self) -> u64 {
        self.threshold_collateral
    }

    pub fn binding_tag(&self) -> Felt {
        self.binding_tag
    }

    pub fn elements(&self) -> Vec<Felt> {
        vec![
            self.commitment,
            self.binding_tag,
            Felt::from(self.threshold_collateral),
        ]
    }
}

/// Reveal of a commitment's value and nonce (withdrawals)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningProof {
    commitment: Felt,
    value: u64,
    nonce: Felt,
    binding_tag: Felt,
}

impl OpeningProof {
    pub fn commitment(&self) -> Felt {
        self.commitment
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn nonce(&self) -> Felt {
        self.nonce
    }

    pub fn binding_tag(&self) -> Felt {
        self.binding_tag
    }

    pub fn elements(&self) -> Vec<Felt> {
        vec![
            self.commitment,
            Felt::from(self.value),
            self.nonce,
            self.binding_tag,
        ]
    }
}

/// `SHA256("{d1},{d2},...")[..31]` over the digests in ascending order
pub fn reserve_set_hash(digests: &[Felt]) -> Felt {
    let mut sorted = digests.to_vec();
    sorted.sort_by_key(felt_to_bytes);
    let preimage = sorted
        .iter()
        .map(felt_to_decimal)
        .collect::<Vec<_>>()
        .join(",");
    felt_from_hash_prefix(&Sha256::digest(preimage.as_bytes()))
}

/// Proof that a set of committed reserves covers a public liability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservesProof {
    aggregate: Felt,
    reserve_set: Felt,
    commitment_count: u32,
    claimed_liability: u64,
    binding_tag: Felt,
}

impl ReservesProof {
    /// Digest of the summed reserve commitments
    pub fn aggregate(&self) -> Felt {
        self.aggregate
    }

    pub fn reserve_set(&self) -> Felt {
        self.reserve_set
    }

    pub fn commitment_count(&self) -> u32 {
        self.commitment_count
    }

    pub fn claimed_liability(&self) -> u64 {
        self.claimed_liability
    }

    pub fn binding_tag(&self) -> Felt {
        self.binding_tag
    }

    pub fn elements(&self) -> Vec<Felt> {
        vec![
            self.aggregate,
            self.reserve_set,
            self.binding_tag,
            Felt::from(self.claimed_liability),
        ]
    }
}

/// Any proof artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proof {
    Opening(OpeningProof),
    Solvency(SolvencyProof),
    Liquidation(LiquidationProof),
    Reserves(ReservesProof),
}

impl Proof {
    /// Digest of the subject commitment
    pub fn commitment(&self) -> Felt {
        match self {
            Proof::Opening(p) => p.commitment,
            Proof::Solvency(p) => p.commitment,
            Proof::Liquidation(p) => p.commitment,
            Proof::Reserves(p) => p.aggregate,
        }
    }

    pub fn elements(&self) -> Vec<Felt> {
        match self {
            Proof::Opening(p) => p.elements(),
            Proof::Solvency(p) => p.elements(),
            Proof::Liquidation(p) => p.elements(),
            Proof::Reserves(p) => p.elements(),
        }
    }

    /// Elements as `0x` hex strings (calldata form)
    pub fn elements_hex(&self) -> Vec<String> {
        self.elements().iter().map(felt_to_hex).collect()
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Proof::Opening(_) => "opening",
            Proof::Solvency(_) => "solvency",
            Proof::Liquidation(_) => "liquidation",
            Proof::Reserves(_) => "reserves",
        }
    }
}

impl From<SolvencyProof> for Proof {
    fn from(p: SolvencyProof) -> Self {
        Proof::Solvency(p)
    }
}

impl From<LiquidationProof> for Proof {
    fn from(p: LiquidationProof) -> Self {
        Proof::Liquidation(p)
    }
}

impl From<OpeningProof> for Proof {
    fn from(p: OpeningProof) -> Self {
        Proof::Opening(p)
    }
}

impl From<ReservesProof> for Proof {
    fn from(p: ReservesProof) -> Self {
        Proof::Reserves(p)
    }
}

/// Collateralization snapshot of a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHealth {
    pub healthy: bool,
    pub collateral_value: u64,
    pub debt_value: u64,
    pub required_collateral: u64,
    /// `collateral / debt`; `None` when there is no debt
    pub collateral_ratio: Option<f64>,
}

/// Proof Engine
///
/// # Architecture
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │                   ProofEngine                    │
/// ├──────────────────────────────────────────────────┤
/// │  generate_*  ── predicate on Commitment.value ──>│ Proof | Err
/// │  verify_*    ── recompute tag / threshold ──────>│ bool
/// │  verify_against_opening ── + Commit(v, n) ──────>│ bool
/// │                      │                           │
/// │                      v                           │
/// │            Arc<dyn CommitmentScheme>             │
/// └──────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone)]
pub struct ProofEngine {
    scheme: Arc<dyn CommitmentScheme>,
}

impl ProofEngine {
    pub fn new(scheme: Arc<dyn CommitmentScheme>) -> Self {
        Self { scheme }
    }

    /// Solvency proof for a BTC-denominated debt and a float ratio (1.5 = 150%)
    ///
    /// # Errors
    /// - `ValidationError`: negative/non-finite debt or non-positive ratio
    /// - `InsufficientCollateral`: `value < ceil(debt_sats * ratio)`
    pub fn generate_solvency_proof(
        &self,
        commitment: &Commitment,
        debt_btc: f64,
        collateral_ratio: f64,
    ) -> CommitmentResult<SolvencyProof> {
        validation::validate_debt(debt_btc)?;
        let ratio = Ratio::from_multiplier(collateral_ratio)?;
        self.solvency_proof_satoshis(commitment, btc_to_satoshis(debt_btc), ratio)
    }

    /// Solvency proof over integer inputs
    pub fn solvency_proof_satoshis(
        &self,
        commitment: &Commitment,
        debt_satoshis: u64,
        ratio: Ratio,
    ) -> CommitmentResult<SolvencyProof> {
        validation::validate_ratio_bps(ratio.bps())?;
        let required = ratio.apply_ceil(debt_satoshis)?;

        if commitment.value() < required {
            tracing::info!(
                "Solvency proof refused for {}: ratio {}",
                commitment.digest_hex(),
                ratio.to_decimal_string()
            );
            return Err(CommitmentError::InsufficientCollateral {
                collateral: commitment.value(),
                required,
            });
        }

        let proof = SolvencyProof {
            commitment: commitment.digest(),
            debt_satoshis,
            collateral_ratio: ratio,
            ratio_percent: ratio.percent(),
            required_collateral: required,
            binding_tag: binding_tag(
                &commitment.digest(),
                debt_satoshis,
                &ratio.to_decimal_string(),
            ),
        };

        tracing::info!(
            "Solvency proof generated for {} (debt {} sat, ratio {}%)",
            commitment.digest_hex(),
            debt_satoshis,
            proof.ratio_percent
        );
        Ok(proof)
    }

    /// Liquidation proof for a BTC-denominated debt and a float threshold (1.2 = 120%)
    ///
    /// # Errors
    /// - `ValidationError`: negative/non-finite debt or non-positive threshold
    /// - `NotLiquidatable`: `value >= floor(debt_sats * threshold)`
    pub fn generate_liquidation_proof(
        &self,
        commitment: &Commitment,
        debt_btc: f64,
        liquidation_threshold: f64,
    ) -> CommitmentResult<LiquidationProof> {
        validation::validate_debt(debt_btc)?;
        let threshold = Ratio::from_multiplier(liquidation_threshold)?;
        self.liquidation_proof_satoshis(commitment, btc_to_satoshis(debt_btc), threshold)
    }

    /// Liquidation proof over integer inputs
    pub fn liquidation_proof_satoshis(
        &self,
        commitment: &Commitment,
        debt_satoshis: u64,
        threshold: Ratio,
    ) -> CommitmentResult<LiquidationProof> {
        validation::validate_ratio_bps(threshold.bps())?;
        let threshold_collateral = threshold.apply_floor(debt_satoshis)?;

        if commitment.value() >= threshold_collateral {
            return Err(CommitmentError::NotLiquidatable {
                collateral: commitment.value(),
                threshold: threshold_collateral,
            });
        }

        let proof = LiquidationProof {
            commitment: commitment.digest(),
            debt_satoshis,
            liquidation_threshold: threshold,
            threshold_percent: threshold.percent(),
            threshold_collateral,
            binding_tag: binding_tag(
                &commitment.digest(),
                debt_satoshis,
                &threshold.to_decimal_string(),
            ),
        };

        tracing::info!(
            "Liquidation proof generated for {} (debt {} sat, threshold {}%)",
            commitment.digest_hex(),
            debt_satoshis,
            proof.threshold_percent
        );
        Ok(proof)
    }

    /// Opening proof revealing value and nonce
    pub fn generate_opening_proof(&self, commitment: &Commitment) -> OpeningProof {
        OpeningProof {
            commitment: commitment.digest(),
            value: commitment.value(),
            nonce: commitment.nonce(),
            binding_tag: binding_tag(&commitment.digest(), commitment.value(), OPENING_LABEL),
        }
    }

    /// Check a solvency proof's derived fields against `digest`
    pub fn verify_solvency(&self, proof: &SolvencyProof, digest: &Felt) -> bool {
        let ratio = proof.collateral_ratio;
        let valid = proof.commitment == *digest
            && ratio.bps() > 0
            && proof.ratio_percent == ratio.percent()
            && ratio.apply_ceil(proof.debt_satoshis).ok() == Some(proof.required_collateral)
            && proof.binding_tag
                == binding_tag(digest, proof.debt_satoshis, &ratio.to_decimal_string());
        tracing::debug!("Solvency proof verification for {}: {}", felt_to_hex(digest), valid);
        valid
    }

    /// Check a liquidation proof's derived fields against `digest`
    pub fn verify_liquidation(&self, proof: &LiquidationProof, digest: &Felt) -> bool {
        let threshold = proof.liquidation_threshold;
        let valid = proof.commitment == *digest
            && threshold.bps() > 0
            && proof.threshold_percent == threshold.percent()
            && threshold.apply_floor(proof.debt_satoshis).ok() == Some(proof.threshold_collateral)
            && proof.binding_tag
                == binding_tag(digest, proof.debt_satoshis, &threshold.to_decimal_string());
        tracing::debug!("Liquidation proof verification for {}: {}", felt_to_hex(digest), valid);
        valid
    }

    /// Sum of `commitments` as a commitment to the total
    ///
    /// The result opens to `(sum of values, combined nonce)` and its digest is
    /// the homomorphic sum of the inputs' digests.
    ///
    /// # Errors
    /// - `ValidationError`: empty set, a scheme without aggregation, or
    ///   commitments made under another scheme
    /// - `ArithmeticOverflow`: total above `u64`
    pub fn aggregate_commitment(&self, commitments: &[Commitment]) -> CommitmentResult<Commitment> {
        if commitments.is_empty() {
            return Err(CommitmentError::ValidationError(
                "at least one reserve commitment is required".to_string(),
            ));
        }

        let total = commitments
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.value()))
            .ok_or_else(|| CommitmentError::overflow("reserve total"))?;

        let unsupported = || {
            CommitmentError::ValidationError(format!(
                "{} commitments cannot be aggregated",
                self.scheme.kind()
            ))
        };
        let nonces: Vec<Felt> = commitments.iter().map(Commitment::nonce).collect();
        let digests: Vec<Felt> = commitments.iter().map(Commitment::digest).collect();
        let nonce = self.scheme.combine_nonces(&nonces).ok_or_else(unsupported)?;
        let aggregate = self.scheme.combine_digests(&digests).ok_or_else(unsupported)?;

        let opened = Commitment::open(self.scheme.as_ref(), total, nonce);
        if opened.digest() != aggregate {
            return Err(CommitmentError::ValidationError(
                "reserve commitments were not made under this scheme".to_string(),
            ));
        }
        Ok(opened)
    }

    /// Proof that `sum(values) >= liability_satoshis` over a set of commitments
    ///
    /// # Errors
    /// - everything [`aggregate_commitment`](Self::aggregate_commitment) returns
    /// - `InsufficientReserves`: the committed total is below the liability
    pub fn generate_reserves_proof(
        &self,
        commitments: &[Commitment],
        liability_satoshis: u64,
    ) -> CommitmentResult<ReservesProof> {
        let aggregate = self.aggregate_commitment(commitments)?;
        if aggregate.value() < liability_satoshis {
            tracing::info!(
                "Reserves proof refused: {} commitments below liability {} sat",
                commitments.len(),
                liability_satoshis
            );
            return Err(CommitmentError::InsufficientReserves {
                reserves: aggregate.value(),
                liability: liability_satoshis,
            });
        }

        let digests: Vec<Felt> = commitments.iter().map(Commitment::digest).collect();
        let proof = ReservesProof {
            aggregate: aggregate.digest(),
            reserve_set: reserve_set_hash(&digests),
            commitment_count: u32::try_from(commitments.len())
                .map_err(|_| CommitmentError::overflow("reserve count"))?,
            claimed_liability: liability_satoshis,
            binding_tag: binding_tag(&aggregate.digest(), liability_satoshis, RESERVES_LABEL),
        };

        tracing::info!(
            "Reserves proof generated over {} commitments (liability {} sat)",
            proof.commitment_count,
            liability_satoshis
        );
        Ok(proof)
    }

    /// Check a reserves proof against the published reserve digests
    pub fn verify_reserves(&self, proof: &ReservesProof, digests: &[Felt]) -> bool {
        let valid = usize::try_from(proof.commitment_count).ok() == Some(digests.len())
            && proof.reserve_set == reserve_set_hash(digests)
            && self.scheme.combine_digests(digests) == Some(proof.aggregate)
            && proof.binding_tag
                == binding_tag(&proof.aggregate, proof.claimed_liability, RESERVES_LABEL);
        tracing::debug!(
            "Reserves proof verification over {} digests: {}",
            digests.len(),
            valid
        );
        valid
    }

    /// Check that an opening proof opens `digest`
    pub fn verify_opening_proof(&self, proof: &OpeningProof, digest: &Felt) -> bool {
        let valid = proof.commitment == *digest
            && self
                .scheme
                .opens(digest, &Felt::from(proof.value), &proof.nonce)
            && proof.binding_tag == binding_tag(digest, proof.value, OPENING_LABEL);
        tracing::debug!("Opening proof verification for {}: {}", felt_to_hex(digest), valid);
        valid
    }

    /// Dispatch on the proof kind
    ///
    /// For `Reserves` only the aggregate and tag are checked here; the reserve
    /// set needs [`verify_reserves`](Self::verify_reserves).
    pub fn verify(&self, proof: &Proof, digest: &Felt) -> bool {
        match proof {
            Proof::Opening(p) => self.verify_opening_proof(p, digest),
            Proof::Solvency(p) => self.verify_solvency(p, digest),
            Proof::Liquidation(p) => self.verify_liquidation(p, digest),
            Proof::Reserves(p) => {
                p.aggregate == *digest
                    && p.binding_tag == binding_tag(digest, p.claimed_liability, RESERVES_LABEL)
            }
        }
    }

    /// Verify `proof` and check its predicate against a revealed `(value, nonce)`
    pub fn verify_against_opening(&self, proof: &Proof, value: u64, nonce: &Felt) -> bool {
        let digest = proof.commitment();
        if !self.scheme.opens(&digest, &Felt::from(value), nonce) {
            return false;
        }
        if !self.verify(proof, &digest) {
            return false;
        }
        match proof {
            Proof::Opening(p) => p.value == value && p.nonce == *nonce,
            Proof::Solvency(p) => value >= p.required_collateral,
            Proof::Liquidation(p) => value < p.threshold_collateral,
            Proof::Reserves(p) => value >= p.claimed_liability,
        }
    }

    /// Collateralization of `commitment` against `debt_satoshis` at `ratio`
    pub fn position_health(
        &self,
        commitment: &Commitment,
        debt_satoshis: u64,
        ratio: Ratio,
    ) -> CommitmentResult<PositionHealth> {
        let required = ratio.apply_ceil(debt_satoshis)?;
        let collateral_ratio = if debt_satoshis > 0 {
            Some(commitment.value() as f64 / debt_satoshis as f64)
        } else {
            None
        };

        Ok(PositionHealth {
            healthy: commitment.value() >= required,
            collateral_value: commitment.value(),
            debt_value: debt_satoshis,
            required_collateral: required,
            collateral_ratio,
        })
    }
}
