//! Scenario Tests
//!
//! End-to-end flows across the engines, the registry and the integration layer.

#[cfg(test)]
mod integration_tests {
    use std::sync::{Arc, Once};

    use serde_json::json;

    use crate::bundle::CommitmentBundle;
    use crate::commitment::{CommitmentEngine, DerivationSecret};
    use crate::config::{Config, FieldParameters};
    use crate::conversion::Ratio;
    use crate::error::CommitmentError;
    use crate::integration::{parse_event, LendingIntegration};
    use crate::primitives::field::felt_to_hex;
    use crate::primitives::scheme::SchemeKind;
    use crate::proof::{Proof, ProofEngine};
    use crate::registry::{CommitmentStore, InMemoryRegistry};

    static TRACING: Once = Once::new();

    fn init_tracing() {
        TRACING.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "zenlend_commitments=debug".into()),
                )
                .with_test_writer()
                .try_init();
        });
    }

    fn engines(kind: SchemeKind) -> (CommitmentEngine, ProofEngine, Arc<InMemoryRegistry>) {
        init_tracing();
        let store = Arc::new(InMemoryRegistry::new());
        let scheme = kind.build(FieldParameters::starknet());
        (
            CommitmentEngine::new(scheme.clone(), store.clone()),
            ProofEngine::new(scheme),
            store,
        )
    }

    // =============================================================
    // Lending lifecycle
    // =============================================================

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_deposit_prove_open() {
            let (commitments, proofs, store) = engines(SchemeKind::Pedersen);

            let c = commitments.generate_commitment(2.5, Some("user123")).unwrap();
            assert_eq!(store.require("user123").unwrap(), c);

            let solvency = proofs.generate_solvency_proof(&c, 1.0, 1.5).unwrap();
            assert!(proofs.verify_solvency(&solvency, &c.digest()));

            assert!(matches!(
                proofs.generate_liquidation_proof(&c, 1.0, 1.2),
                Err(CommitmentError::NotLiquidatable { .. })
            ));
            let liquidation = proofs.generate_liquidation_proof(&c, 2.5, 1.2).unwrap();
            assert!(proofs.verify_liquidation(&liquidation, &c.digest()));

            assert!(commitments.verify_opening(&c.digest(), c.value(), &c.nonce()));
            let opening: Proof = proofs.generate_opening_proof(&c).into();
            assert!(proofs.verify_against_opening(&opening, c.value(), &c.nonce()));

            assert_eq!(store.remove("user123"), Some(c));
            assert!(matches!(
                store.require("user123"),
                Err(CommitmentError::UnknownIdentity(_))
            ));
        }

        #[test]
        fn test_integration_flow_with_events() {
            init_tracing();
            let integration = LendingIntegration::new(Config::default());
            let user = "0x123456789abcdef";

            let deposit = integration.prepare_deposit(user, 2.0).unwrap();
            let mint = integration.prepare_mint(user, 1.0).unwrap();
            assert_eq!(mint.call.calldata.len(), 2);

            let proof: Proof = mint.artifact.into();
            assert!(integration.proofs().verify_against_opening(
                &proof,
                deposit.artifact.value(),
                &deposit.artifact.nonce()
            ));

            let event = parse_event(&json!({
                "event_name": "PositionLiquidated",
                "user": user,
                "amount": 0,
                "timestamp": 1_700_000_000u64,
            }));
            assert_eq!(integration.apply_event(&event), Some(deposit.artifact));
            assert!(integration.commitment_summary(user).is_none());
        }

        #[test]
        fn test_redeposit_overwrites() {
            let (commitments, proofs, store) = engines(SchemeKind::Pedersen);

            commitments.generate_commitment(5.0, Some("whale")).unwrap();
            let smaller = commitments.generate_commitment(1.0, Some("whale")).unwrap();

            let live = store.require("whale").unwrap();
            assert_eq!(live, smaller);
            assert!(proofs.generate_solvency_proof(&live, 1.0, 1.5).is_err());
        }
    }

    // =============================================================
    // Scheme interchangeability
    // =============================================================

    mod scheme_tests {
        use super::*;

        #[test]
        fn test_both_schemes_support_the_same_flow() {
            for kind in [SchemeKind::Pedersen, SchemeKind::LegacyHash] {
                let (commitments, proofs, _) = engines(kind);
                let c = commitments.commit_satoshis(250_000_000, None).unwrap();

                let proof = proofs
                    .solvency_proof_satoshis(&c, 100_000_000, Ratio::from_bps(15_000))
                    .unwrap();
                assert!(proofs.verify(&proof.into(), &c.digest()));

                let secret = DerivationSecret::new("correct horse battery").unwrap();
                let (digest, bundle) =
                    commitments.generate_commitment_with_proof(0.5, &secret).unwrap();
                assert_eq!(bundle.commitment_type, kind);
                assert!(commitments.verify_bundle(&digest, &bundle, 0.5));
            }
        }

        #[test]
        fn test_digests_differ_between_schemes() {
            let (pedersen, _, _) = engines(SchemeKind::Pedersen);
            let (legacy, _, _) = engines(SchemeKind::LegacyHash);
            let secret = DerivationSecret::new("abcdefgh").unwrap();

            let (a, _) = pedersen.generate_commitment_with_proof(1.5, &secret).unwrap();
            let (b, _) = legacy.generate_commitment_with_proof(1.5, &secret).unwrap();
            assert_ne!(a, b);
        }
    }

    // =============================================================
    // Legacy compatibility
    // =============================================================

    mod legacy_tests {
        use super::*;

        /// Bundle shape as emitted by the proof-of-concept HTTP service
        #[test]
        fn test_foreign_bundle_verifies_under_legacy_scheme() {
            let (commitments, _, _) = engines(SchemeKind::LegacyHash);
            let secret = DerivationSecret::new("abcdefgh").unwrap();
            let (digest, bundle) =
                commitments.generate_commitment_with_proof(1.5, &secret).unwrap();

            let foreign = json!({
                "commitment_type": "pedersen",
                "amount_satoshis": 150000000,
                "amount_btc": 1.5,
                "nonce": felt_to_hex(&bundle.nonce),
                "generators": {
                    "g": "0x1ef15c18599971b7beced415a40f0c7deacfd9b0d1819e03d723d8bc943cfca",
                    "h": "0x5af3107a4000c94cd5b6fd87df0e9b6fd378d766499c0b09adbaf0e3e2a8c8e"
                },
                "prime_modulus": "0x800000000000011000000000000000000000000000000000000000000000001",
                "verification_data": { "expected_commitment": digest, "can_verify": true }
            });

            assert!(commitments.verify_proof(&digest, &foreign, 1.5));
            // commitment_type is informational; typed parsing of the same record works too
            let typed: CommitmentBundle = serde_json::from_value(foreign).unwrap();
            assert!(commitments.verify_bundle(&digest, &typed, 1.5));
        }
    }

    // =============================================================
    // Error propagation
    // =============================================================

    mod error_tests {
        use super::*;

        #[test]
        fn test_generation_errors_surface() {
            let (commitments, proofs, _) = engines(SchemeKind::Pedersen);

            let err = commitments.generate_commitment(0.0, None).unwrap_err();
            assert!(err.to_string().contains("Validation failed"));

            let c = commitments.generate_commitment(1.0, None).unwrap();
            let err = proofs.generate_solvency_proof(&c, 1.0, 1.5).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Insufficient collateral: 100000000 < 150000000 required"
            );

            let err = DerivationSecret::new("1234567").unwrap_err();
            assert!(err.to_string().contains("at least 8"));
        }

        #[test]
        fn test_verification_never_errors() {
            let (commitments, _, _) = engines(SchemeKind::Pedersen);
            assert!(!commitments.verify_opening_hex("", "", ""));
            assert!(!commitments.verify_proof("0x1", &json!([1, 2, 3]), 1.0));
            assert!(!commitments.verify_proof_satoshis("0x1", &json!({}), 1));
        }
    }
}
