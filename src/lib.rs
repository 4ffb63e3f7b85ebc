//! ZenLend Commitments
//!
//! Private BTC collateral for a Starknet lending protocol: commit to a satoshi
//! amount, prove solvency or liquidatability against it without revealing it,
//! and open it on withdrawal.
//!
//! # Layout
//!
//! ```text
//!  Config ──> FieldParameters (P, G, H)
//!                 │
//!                 v
//!  primitives: Felt ─> Group ─> CommitmentScheme (Pedersen | LegacyHash)
//!                                   │
//!          ┌────────────────────────┼──────────────────────┐
//!          v                        v                      v
//!  CommitmentEngine ──────────> ProofEngine        CommitmentBundle
//!    │  (writes)                   │                 (stateless check)
//!    v                             v
//!  CommitmentStore <─── LendingIntegration ───> ContractCall / LedgerEvent
//! ```
//!
//! # Modules
//! - `commitment`: `Commitment`, `CommitmentEngine`, deterministic `DerivationSecret` mode
//! - `proof`: `SolvencyProof`, `LiquidationProof`, `OpeningProof`, `ReservesProof` and their checks
//! - `registry`: identity -> live commitment, sharded per-key locking
//! - `integration`: calldata formatting, event parsing, transaction builder
//!
//! # Example
//! ```ignore
//! use std::sync::Arc;
//! use zenlend_commitments::{CommitmentEngine, FieldParameters, InMemoryRegistry, ProofEngine, SchemeKind};
//!
//! let scheme = SchemeKind::Pedersen.build(FieldParameters::starknet());
//! let engine = CommitmentEngine::new(scheme.clone(), Arc::new(InMemoryRegistry::new()));
//! let proofs = ProofEngine::new(scheme);
//!
//! let commitment = engine.generate_commitment(2.5, Some("0x123"))?;
//! let proof = proofs.generate_solvency_proof(&commitment, 1.0, 1.5)?;
//! assert!(proofs.verify_solvency(&proof, &commitment.digest()));
//! ```

pub mod bundle;
pub mod commitment;
pub mod config;
pub mod conversion;
pub mod error;
pub mod integration;
pub mod primitives;
pub mod proof;
pub mod registry;

#[cfg(test)]
mod tests;

// Engines
pub use commitment::{Commitment, CommitmentEngine, DerivationSecret};
pub use proof::{
    binding_tag, reserve_set_hash, LiquidationProof, OpeningProof, PositionHealth, Proof,
    ProofEngine, ReservesProof, SolvencyProof,
};

// Stateless verification
pub use bundle::CommitmentBundle;

// Storage
pub use registry::{CommitmentStore, InMemoryRegistry};

// Configuration
pub use config::{Config, Environment, FieldParameters};
pub use conversion::{btc_to_satoshis, satoshis_to_btc, satoshis_to_token_units, Ratio};

// Error handling
pub use error::{CommitmentError, CommitmentResult};
pub use error::validation;

// Primitives
pub use primitives::{
    felt_from_hex, felt_to_hex, CommitmentScheme, Felt, Group, LegacyHashScheme,
    MultiplicativeGroup, PedersenScheme, SchemeKind,
};

// Integration
pub use integration::{
    parse_event, ContractCall, EventKind, LedgerEvent, LendingIntegration, PreparedTransaction,
};
