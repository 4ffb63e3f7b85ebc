//! Commitment Engine
//!
//! Builds and opens commitments to satoshi amounts.
//!
//! # Modes
//!
//! ```text
//! generate_commitment(btc, identity?)        nonce <- OsRng, canonical nonces only (default)
//! generate_commitment_with_proof(btc, &secret) nonce <- SHA256(secret)[..31]   (deterministic)
//! ```
//!
//! The deterministic mode ties hiding to the secrecy of a caller string, so it
//! takes a separate [`DerivationSecret`] type and never writes to the registry.

use std::fmt;
use std::sync::Arc;

use ff::Field;
use rand::rngs::OsRng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::bundle::CommitmentBundle;
use crate::config::FieldParameters;
use crate::conversion::{btc_to_satoshis, satoshis_to_btc};
use crate::error::{validation, CommitmentError, CommitmentResult};
use crate::primitives::field::{felt_from_hash_prefix, felt_from_hex, felt_to_hex, Felt};
use crate::primitives::scheme::CommitmentScheme;
use crate::registry::CommitmentStore;

/// A commitment to a satoshi amount
///
/// `digest == Commit(value, nonce)` holds for every instance: the only
/// constructor computes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Commitment {
    value: u64,
    nonce: Felt,
    digest: Felt,
}

impl Commitment {
    /// Compute the digest of `(value, nonce)` under `scheme`
    pub fn open(scheme: &dyn CommitmentScheme, value: u64, nonce: Felt) -> Self {
        let digest = scheme.commit(&Felt::from(value), &nonce);
        Self {
            value,
            nonce,
            digest,
        }
    }

    /// Hidden value in satoshis
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn nonce(&self) -> Felt {
        self.nonce
    }

    pub fn digest(&self) -> Felt {
        self.digest
    }

    pub fn digest_hex(&self) -> String {
        felt_to_hex(&self.digest)
    }

    pub fn value_btc(&self) -> f64 {
        satoshis_to_btc(self.value)
    }
}

/// Caller secret for deterministic nonce derivation (at least 8 characters)
#[derive(Clone)]
pub struct DerivationSecret(String);

impl DerivationSecret {
    pub fn new(secret: impl Into<String>) -> CommitmentResult<Self> {
        let secret = secret.into();
        validation::validate_secret(&secret)?;
        Ok(Self(secret))
    }

    /// `SHA256(secret)[..31]` as a big-endian integer
    pub fn derive_nonce(&self) -> Felt {
        felt_from_hash_prefix(&Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Debug for DerivationSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivationSecret(<redacted>)")
    }
}

/// Commitment Engine
///
/// Holds the scheme and an explicit store handle; nothing here is global.
#[derive(Debug, Clone)]
pub struct CommitmentEngine {
    scheme: Arc<dyn CommitmentScheme>,
    store: Arc<dyn CommitmentStore>,
}

impl CommitmentEngine {
    pub fn new(scheme: Arc<dyn CommitmentScheme>, store: Arc<dyn CommitmentStore>) -> Self {
        Self { scheme, store }
    }

    pub fn scheme(&self) -> &Arc<dyn CommitmentScheme> {
        &self.scheme
    }

    pub fn store(&self) -> &Arc<dyn CommitmentStore> {
        &self.store
    }

    pub fn parameters(&self) -> &FieldParameters {
        self.scheme.parameters()
    }

    /// `Commit(value, nonce)`
    pub fn commit(&self, value: u64, nonce: &Felt) -> Felt {
        self.scheme.commit(&Felt::from(value), nonce)
    }

    /// Commit to a BTC amount with a fresh random nonce
    ///
    /// Writes to the registry when `identity` is given, replacing any prior
    /// entry for it.
    ///
    /// # Errors
    /// - `ValidationError`: amount not positive, below one satoshi, or blank identity
    pub fn generate_commitment(
        &self,
        amount_btc: f64,
        identity: Option<&str>,
    ) -> CommitmentResult<Commitment> {
        validation::validate_amount(amount_btc)?;
        self.commit_satoshis(btc_to_satoshis(amount_btc), identity)
    }

    /// Commit to a satoshi amount with a fresh random nonce
    pub fn commit_satoshis(
        &self,
        satoshis: u64,
        identity: Option<&str>,
    ) -> CommitmentResult<Commitment> {
        if satoshis == 0 {
            return Err(CommitmentError::ValidationError(
                "amount must be at least 1 satoshi".to_string(),
            ));
        }
        if let Some(identity) = identity {
            validation::validate_identity(identity)?;
        }

        let nonce = self.random_nonce();
        let commitment = Commitment::open(self.scheme.as_ref(), satoshis, nonce);

        tracing::info!(
            "Commitment created: {} ({})",
            commitment.digest_hex(),
            self.scheme.kind()
        );

        if let Some(identity) = identity {
            if self.store.put(identity, commitment).is_some() {
                tracing::warn!(
                    "Commitment for {} replaced an existing position; prior entry is no longer tracked",
                    identity
                );
            }
        }

        Ok(commitment)
    }

    /// Uniform over the scheme's nonce domain
    fn random_nonce(&self) -> Felt {
        loop {
            let nonce = Felt::random(OsRng);
            if self.scheme.is_canonical_nonce(&nonce) {
                return nonce;
            }
        }
    }

    /// Check that `digest` opens to `(value, nonce)`
    pub fn verify_opening(&self, digest: &Felt, value: u64, nonce: &Felt) -> bool {
        let valid = self.scheme.opens(digest, &Felt::from(value), nonce);
        tracing::debug!("Opening verification for {}: {}", felt_to_hex(digest), valid);
        valid
    }

    /// [`verify_opening`](Self::verify_opening) over untrusted text
    ///
    /// `value` may be decimal or `0x` hex. Anything unparsable is `false`.
    pub fn verify_opening_hex(&self, digest_hex: &str, value: &str, nonce_hex: &str) -> bool {
        let digest = match felt_from_hex(digest_hex) {
            Ok(d) => d,
            Err(_) => return false,
        };
        let nonce = match felt_from_hex(nonce_hex) {
            Ok(n) => n,
            Err(_) => return false,
        };
        match parse_u64(value) {
            Some(value) => self.verify_opening(&digest, value, &nonce),
            None => false,
        }
    }

    /// Deterministic commitment plus a self-contained bundle for stateless checks
    ///
    /// The same `(amount_btc, secret)` always yields the same digest and bundle.
    pub fn generate_commitment_with_proof(
        &self,
        amount_btc: f64,
        secret: &DerivationSecret,
    ) -> CommitmentResult<(String, CommitmentBundle)> {
        validation::validate_amount(amount_btc)?;
        let satoshis = btc_to_satoshis(amount_btc);
        if satoshis == 0 {
            return Err(CommitmentError::ValidationError(
                "amount must be at least 1 satoshi".to_string(),
            ));
        }

        tracing::warn!("Deterministic commitment requested; nonce is derived from a caller secret");

        let commitment = Commitment::open(self.scheme.as_ref(), satoshis, secret.derive_nonce());
        let bundle = CommitmentBundle::new(
            self.scheme.kind(),
            self.parameters(),
            &commitment,
            amount_btc,
        );

        Ok((commitment.digest_hex(), bundle))
    }
}

/// Parse a decimal or `0x` hex unsigned integer
pub(crate) fn parse_u64(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(digits) => u64::from_str_radix(digits, 16).ok(),
        None => trimmed.parse().ok(),
    }
}
