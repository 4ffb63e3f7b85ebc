//! Commitment schemes
//!
//! - `PedersenScheme<G>`: `value·G + nonce·H` over any [`Group`]
//! - `LegacyHashScheme`: SHA-256 stand-in kept byte-compatible with digests
//!   already written to the ledger by the proof-of-concept deployment
//!
//! Both reduce `value` and `nonce` mod P before use (they arrive as [`Felt`]s).
//! A Pedersen nonce is additionally a group scalar: only nonces below the group
//! order open a digest, so each digest has exactly one canonical opening.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ff::Field;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::field::{felt_from_hash_prefix, felt_to_decimal, Felt};
use super::group::{add_scalars, is_canonical_scalar, Group, MultiplicativeGroup};
use crate::config::FieldParameters;
use crate::error::CommitmentError;

/// Identifies a commitment scheme in config and in proof bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    Pedersen,
    LegacyHash,
}

impl SchemeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeKind::Pedersen => "pedersen",
            SchemeKind::LegacyHash => "legacy_hash",
        }
    }

    /// Instantiate the scheme over the given field parameters
    pub fn build(self, params: FieldParameters) -> Arc<dyn CommitmentScheme> {
        match self {
            SchemeKind::Pedersen => Arc::new(PedersenScheme::new(
                MultiplicativeGroup::new(&params),
                params,
            )),
            SchemeKind::LegacyHash => Arc::new(LegacyHashScheme::new(params)),
        }
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemeKind {
    type Err = CommitmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pedersen" => Ok(SchemeKind::Pedersen),
            "legacy_hash" | "legacy-hash" | "hash" => Ok(SchemeKind::LegacyHash),
            other => Err(CommitmentError::ValidationError(format!(
                "unknown commitment scheme: {}",
                other
            ))),
        }
    }
}

/// A deterministic, pure commitment function over the field
pub trait CommitmentScheme: Send + Sync + fmt::Debug {
    fn kind(&self) -> SchemeKind;

    /// Modulus and generators this scheme commits under
    fn parameters(&self) -> &FieldParameters;

    /// `Commit(value, nonce)` as a field element
    fn commit(&self, value: &Felt, nonce: &Felt) -> Felt;

    /// Whether `nonce` is in the scheme's nonce domain
    fn is_canonical_nonce(&self, _nonce: &Felt) -> bool {
        true
    }

    /// Whether `digest` opens to `(value, nonce)`
    fn opens(&self, digest: &Felt, value: &Felt, nonce: &Felt) -> bool {
        self.is_canonical_nonce(nonce) && self.commit(value, nonce) == *digest
    }

    /// Homomorphic sum of digests; `None` for schemes without one
    fn combine_digests(&self, _digests: &[Felt]) -> Option<Felt> {
        None
    }

    /// Nonce opening the sum of commitments made with `nonces`
    fn combine_nonces(&self, _nonces: &[Felt]) -> Option<Felt> {
        None
    }
}

/// Pedersen commitment over a pluggable group
#[derive(Debug, Clone)]
pub struct PedersenScheme<G: Group> {
    group: G,
    params: FieldParameters,
}

impl<G: Group> PedersenScheme<G> {
    pub fn new(group: G, params: FieldParameters) -> Self {
        Self { group, params }
    }

    pub fn group(&self) -> &G {
        &self.group
    }

    /// Commitment as a group element (before digest encoding)
    pub fn commit_element(&self, value: &Felt, nonce: &Felt) -> G::Element {
        let (g, h) = self.group.generators();
        self.group.add(
            &self.group.scalar_multiply(&g, value),
            &self.group.scalar_multiply(&h, nonce),
        )
    }

    /// Homomorphic sum: `Commit(v1, r1) + Commit(v2, r2) = Commit(v1 + v2, r1 + r2)`
    ///
    /// Both sums are mod the group order; use [`add_scalars`] for the nonce side.
    pub fn combine(&self, a: &G::Element, b: &G::Element) -> G::Element {
        self.group.add(a, b)
    }
}

impl<G: Group> CommitmentScheme for PedersenScheme<G> {
    fn kind(&self) -> SchemeKind {
        SchemeKind::Pedersen
    }

    fn parameters(&self) -> &FieldParameters {
        &self.params
    }

    fn commit(&self, value: &Felt, nonce: &Felt) -> Felt {
        let element = self.commit_element(value, nonce);
        self.group.to_digest(&element)
    }

    fn is_canonical_nonce(&self, nonce: &Felt) -> bool {
        is_canonical_scalar(&self.group, nonce)
    }

    fn combine_digests(&self, digests: &[Felt]) -> Option<Felt> {
        let mut acc = self.group.identity();
        for digest in digests {
            acc = self.combine(&acc, &self.group.from_digest(digest)?);
        }
        Some(self.group.to_digest(&acc))
    }

    fn combine_nonces(&self, nonces: &[Felt]) -> Option<Felt> {
        nonces
            .iter()
            .try_fold(Felt::ZERO, |acc, nonce| add_scalars(&self.group, &acc, nonce))
    }
}

/// Hash-based stand-in: `SHA256("{G}^{value}*{H}^{nonce}")[..31]`
///
/// Binding and hiding only as far as SHA-256 is; no homomorphism, so no
/// statement beyond "reveal and check" can be proven against it.
#[derive(Debug, Clone)]
pub struct LegacyHashScheme {
    params: FieldParameters,
    g_decimal: String,
    h_decimal: String,
}

impl LegacyHashScheme {
    pub fn new(params: FieldParameters) -> Self {
        Self {
            g_decimal: felt_to_decimal(&params.g),
            h_decimal: felt_to_decimal(&params.h),
            params,
        }
    }
}

impl CommitmentScheme for LegacyHashScheme {
    fn kind(&self) -> SchemeKind {
        SchemeKind::LegacyHash
    }

    fn parameters(&self) -> &FieldParameters {
        &self.params
    }

    fn commit(&self, value: &Felt, nonce: &Felt) -> Felt {
        let preimage = format!(
            "{}^{}*{}^{}",
            self.g_decimal,
            felt_to_decimal(value),
            self.h_decimal,
            felt_to_decimal(nonce)
        );
        felt_from_hash_prefix(&Sha256::digest(preimage.as_bytes()))
    }
}
