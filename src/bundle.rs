//! Commitment Bundle
//!
//! Self-contained record produced by the deterministic mode. A verifier holding
//! only the digest, the bundle and a claimed amount can re-check the opening
//! without the registry.
//!
//! Field names follow the JSON already emitted by the proof-of-concept service,
//! so bundles from either side verify here.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commitment::{parse_u64, Commitment, CommitmentEngine};
use crate::config::FieldParameters;
use crate::conversion::btc_to_satoshis;
use crate::error::{CommitmentError, CommitmentResult};
use crate::primitives::field::{felt_from_hex, felt_to_hex, modulus, Felt};
use crate::primitives::scheme::SchemeKind;

/// Maximum allowed drift between the bundle amount and the claimed amount (BTC)
pub const AMOUNT_TOLERANCE_BTC: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generators {
    pub g: Felt,
    pub h: Felt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationData {
    pub expected_commitment: Felt,
    pub can_verify: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitmentBundle {
    pub commitment_type: SchemeKind,
    pub amount_satoshis: u64,
    pub amount_btc: f64,
    pub nonce: Felt,
    pub generators: Generators,
    pub prime_modulus: String,
    pub verification_data: VerificationData,
}

impl CommitmentBundle {
    pub(crate) fn new(
        kind: SchemeKind,
        params: &FieldParameters,
        commitment: &Commitment,
        amount_btc: f64,
    ) -> Self {
        Self {
            commitment_type: kind,
            amount_satoshis: commitment.value(),
            amount_btc,
            nonce: commitment.nonce(),
            generators: Generators {
                g: params.g,
                h: params.h,
            },
            prime_modulus: params.modulus_hex(),
            verification_data: VerificationData {
                expected_commitment: commitment.digest(),
                can_verify: true,
            },
        }
    }

    pub fn to_json(&self) -> CommitmentResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn claims(&self) -> BundleClaims {
        BundleClaims {
            nonce: self.nonce,
            amount_btc: self.amount_btc,
            amount_satoshis: Some(self.amount_satoshis),
            prime_modulus: Some(self.prime_modulus.clone()),
        }
    }
}

/// The parts of an untrusted bundle that verification reads
#[derive(Debug, Clone, PartialEq)]
struct BundleClaims {
    nonce: Felt,
    amount_btc: f64,
    amount_satoshis: Option<u64>,
    prime_modulus: Option<String>,
}

impl BundleClaims {
    /// Lenient read: `nonce` and `amount_btc` are required, the rest is optional
    fn from_value(bundle: &Value) -> CommitmentResult<Self> {
        let not_unsigned = || {
            CommitmentError::ProofMalformed("amount_satoshis is not a u64".to_string())
        };
        let object = bundle
            .as_object()
            .ok_or_else(|| CommitmentError::ProofMalformed("bundle is not an object".to_string()))?;

        let nonce = object
            .get("nonce")
            .and_then(Value::as_str)
            .ok_or_else(|| CommitmentError::ProofMalformed("missing nonce".to_string()))
            .and_then(|s| {
                felt_from_hex(s).map_err(|e| CommitmentError::ProofMalformed(e.to_string()))
            })?;

        let amount_btc = object
            .get("amount_btc")
            .and_then(Value::as_f64)
            .ok_or_else(|| CommitmentError::ProofMalformed("missing amount_btc".to_string()))?;

        let amount_satoshis = match object.get("amount_satoshis") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.as_u64().ok_or_else(not_unsigned)?),
            Some(Value::String(s)) => Some(parse_u64(s).ok_or_else(not_unsigned)?),
            Some(_) => {
                return Err(CommitmentError::ProofMalformed(
                    "amount_satoshis has the wrong type".to_string(),
                ))
            }
        };

        let prime_modulus = match object.get("prime_modulus") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(CommitmentError::ProofMalformed(
                    "prime_modulus is not a string".to_string(),
                ))
            }
        };

        Ok(Self {
            nonce,
            amount_btc,
            amount_satoshis,
            prime_modulus,
        })
    }

    fn modulus_matches(&self) -> bool {
        match &self.prime_modulus {
            None => true,
            Some(declared) => {
                let digits = declared.trim();
                let digits = digits
                    .strip_prefix("0x")
                    .or_else(|| digits.strip_prefix("0X"))
                    .unwrap_or(digits);
                BigUint::parse_bytes(digits.as_bytes(), 16)
                    .map(|m| m == modulus())
                    .unwrap_or(false)
            }
        }
    }
}

impl CommitmentEngine {
    /// Verify a bundle against a digest and a claimed BTC amount
    ///
    /// Never fails: any parse error, amount drift beyond 1e-8 BTC, foreign
    /// modulus or opening mismatch is `false`.
    pub fn verify_proof(&self, digest_hex: &str, bundle: &Value, claimed_btc: f64) -> bool {
        match BundleClaims::from_value(bundle) {
            Ok(claims) => self.check_btc_claim(digest_hex, &claims, claimed_btc),
            Err(e) => {
                tracing::debug!("Bundle rejected: {}", e);
                false
            }
        }
    }

    /// Exact integer variant of [`verify_proof`](Self::verify_proof)
    pub fn verify_proof_satoshis(
        &self,
        digest_hex: &str,
        bundle: &Value,
        claimed_satoshis: u64,
    ) -> bool {
        let claims = match BundleClaims::from_value(bundle) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("Bundle rejected: {}", e);
                return false;
            }
        };

        let recorded = claims
            .amount_satoshis
            .unwrap_or_else(|| btc_to_satoshis(claims.amount_btc));
        if recorded != claimed_satoshis {
            return false;
        }
        self.check_opening(digest_hex, &claims, claimed_satoshis)
    }

    /// Typed variant of [`verify_proof`](Self::verify_proof)
    pub fn verify_bundle(
        &self,
        digest_hex: &str,
        bundle: &CommitmentBundle,
        claimed_btc: f64,
    ) -> bool {
        self.check_btc_claim(digest_hex, &bundle.claims(), claimed_btc)
    }

    fn check_btc_claim(&self, digest_hex: &str, claims: &BundleClaims, claimed_btc: f64) -> bool {
        if !claimed_btc.is_finite() || !claims.amount_btc.is_finite() {
            return false;
        }
        if (claims.amount_btc - claimed_btc).abs() > AMOUNT_TOLERANCE_BTC {
            return false;
        }
        self.check_opening(digest_hex, claims, btc_to_satoshis(claimed_btc))
    }

    fn check_opening(&self, digest_hex: &str, claims: &BundleClaims, satoshis: u64) -> bool {
        if !claims.modulus_matches() {
            tracing::debug!("Bundle rejected: prime modulus does not match this field");
            return false;
        }
        let digest = match felt_from_hex(digest_hex) {
            Ok(d) => d,
            Err(_) => return false,
        };
        let valid = self.verify_opening(&digest, satoshis, &claims.nonce);
        tracing::debug!("Bundle verification for {}: {}", felt_to_hex(&digest), valid);
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::DerivationSecret;
    use crate::registry::InMemoryRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn engine() -> CommitmentEngine {
        CommitmentEngine::new(
            SchemeKind::Pedersen.build(FieldParameters::starknet()),
            Arc::new(InMemoryRegistry::new()),
        )
    }

    fn generated(engine: &CommitmentEngine, amount: f64) -> (String, CommitmentBundle) {
        let secret = DerivationSecret::new("abcdefgh").unwrap();
        engine.generate_commitment_with_proof(amount, &secret).unwrap()
    }

    #[test]
    fn test_bundle_json_shape() {
        let engine = engine();
        let (digest, bundle) = generated(&engine, 1.5);
        let json = bundle.to_json().unwrap();

        assert_eq!(json["commitment_type"], "pedersen");
        assert_eq!(json["amount_satoshis"], 150_000_000u64);
        assert_eq!(json["amount_btc"], 1.5);
        assert_eq!(
            json["nonce"],
            "0x9c56cc51b374c3ba189210d5b6d4bf57790d351c96c47c02190ecf1e430635"
        );
        assert_eq!(
            json["generators"]["g"],
            "0x1ef15c18599971b7beced415a40f0c7deacfd9b0d1819e03d723d8bc943cfca"
        );
        assert_eq!(
            json["prime_modulus"],
            "0x800000000000011000000000000000000000000000000000000000000000001"
        );
        assert_eq!(json["verification_data"]["expected_commitment"], digest.as_str());
        assert_eq!(json["verification_data"]["can_verify"], true);

        let back: CommitmentBundle = serde_json::from_value(json).unwrap();
        assert_eq!(back, bundle);
    }

    #[test]
    fn test_verify_proof_accepts_generated_pair() {
        let engine = engine();
        let (digest, bundle) = generated(&engine, 1.5);
        let json = bundle.to_json().unwrap();

        assert!(engine.verify_proof(&digest, &json, 1.5));
        assert!(engine.verify_proof(&digest, &json, 1.5 + 5e-9));
        assert!(engine.verify_proof_satoshis(&digest, &json, 150_000_000));
        assert!(engine.verify_bundle(&digest, &bundle, 1.5));
    }

    #[test]
    fn test_verify_proof_rejects_amount_drift() {
        let engine = engine();
        let (digest, bundle) = generated(&engine, 1.5);
        let json = bundle.to_json().unwrap();

        assert!(!engine.verify_proof(&digest, &json, 1.50000002));
        assert!(!engine.verify_proof(&digest, &json, 2.0));
        assert!(!engine.verify_proof(&digest, &json, f64::NAN));
        assert!(!engine.verify_proof_satoshis(&digest, &json, 150_000_001));
    }

    #[test]
    fn test_verify_proof_rejects_tampering() {
        let engine = engine();
        let (digest, bundle) = generated(&engine, 1.5);

        let mut json = bundle.to_json().unwrap();
        json["nonce"] = json!("0x1234");
        assert!(!engine.verify_proof(&digest, &json, 1.5));

        let mut json = bundle.to_json().unwrap();
        json["prime_modulus"] = json!("0x7");
        assert!(!engine.verify_proof(&digest, &json, 1.5));

        let other = engine.commit_satoshis(150_000_000, None).unwrap();
        let json = bundle.to_json().unwrap();
        assert!(!engine.verify_proof(&other.digest_hex(), &json, 1.5));
    }

    #[test]
    fn test_verify_proof_never_fails_on_garbage() {
        let engine = engine();
        let (digest, _) = generated(&engine, 1.5);

        assert!(!engine.verify_proof(&digest, &json!(null), 1.5));
        assert!(!engine.verify_proof(&digest, &json!("bundle"), 1.5));
        assert!(!engine.verify_proof(&digest, &json!({ "amount_btc": 1.5 }), 1.5));
        assert!(!engine.verify_proof(&digest, &json!({ "nonce": "0x1" }), 1.5));
        assert!(!engine.verify_proof(&digest, &json!({ "nonce": 7, "amount_btc": 1.5 }), 1.5));
        assert!(!engine.verify_proof(&digest, &json!({ "nonce": "-0x1", "amount_btc": 1.5 }), 1.5));
        let bundle = json!({ "nonce": "0x1", "amount_btc": 1.5 });
        assert!(!engine.verify_proof("0xnothex", &bundle, 1.5));
    }

    #[test]
    fn test_minimal_bundle_is_accepted() {
        let engine = engine();
        let (digest, bundle) = generated(&engine, 0.75);
        let minimal = json!({
            "nonce": felt_to_hex(&bundle.nonce),
            "amount_btc": 0.75,
        });
        assert!(engine.verify_proof(&digest, &minimal, 0.75));
        assert!(engine.verify_proof_satoshis(&digest, &minimal, 75_000_000));
    }
}
