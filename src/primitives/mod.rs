//! Reusable primitives for commitments
//!
//! - `field`: `Felt`, the Starknet prime field element, and its codecs
//! - `group`: `Group` trait and the multiplicative reference group
//! - `scheme`: `CommitmentScheme` trait, Pedersen and legacy hash schemes

pub mod field;
pub mod group;
pub mod scheme;

pub use field::{felt_from_decimal, felt_from_hex, felt_to_decimal, felt_to_hex, modulus_hex, Felt};
pub use group::{add_scalars, is_canonical_scalar, Group, MultiplicativeGroup};
pub use scheme::{CommitmentScheme, LegacyHashScheme, PedersenScheme, SchemeKind};
