//! Ledger integration
//!
//! - `calldata`: commitment/proof -> ordered contract-call parameters
//! - `events`: loosely-typed ledger events -> [`LedgerEvent`]
//! - `service`: [`LendingIntegration`], the deposit/mint/liquidate/withdraw flow

pub mod calldata;
pub mod events;
pub mod service;

pub use calldata::{format_deposit, format_liquidate, format_mint, format_withdraw, ContractCall};
pub use events::{parse_event, EventKind, LedgerEvent};
pub use service::{CommitmentSummary, LendingIntegration, PreparedTransaction};
