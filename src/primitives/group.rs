//! Pluggable commitment group
//!
//! A Pedersen commitment is `value·G + nonce·H` in some cyclic group where the
//! discrete log of `H` base `G` is unknown. The proof layer only needs the three
//! group operations below, so a real elliptic-curve group can replace the
//! reference implementation without touching commitment or proof logic.
//!
//! # Reference group
//!
//! [`MultiplicativeGroup`] is the multiplicative group of the Starknet field,
//! written additively: `add` is multiplication mod P, `scalar_multiply` is
//! exponentiation, identity is 1. This gives the textbook `G^value · H^nonce mod P`
//! and is additively homomorphic, but P - 1 = 2^192 · (2^59 + 17) is smooth, so
//! discrete logs are cheap (Pohlig-Hellman). It must be swapped for a prime-order
//! curve group before securing real funds.
//!
//! # Scalars
//!
//! Scalars travel as [`Felt`]s but live in `Z_n` for the group order `n`, which
//! need not equal P. Sums of scalars go through [`add_scalars`], never through
//! field addition, and only `s < n` is a canonical scalar.

use std::fmt;

use ff::Field;
use num_bigint::BigUint;

use super::field::{felt_from_biguint, felt_to_biguint, felt_to_le_limbs, modulus, Felt};
use crate::config::FieldParameters;

/// Group operations required by [`PedersenScheme`](super::scheme::PedersenScheme)
pub trait Group: Send + Sync + fmt::Debug {
    /// Group element type
    type Element: Copy + PartialEq + fmt::Debug + Send + Sync;

    /// Neutral element
    fn identity(&self) -> Self::Element;

    /// Group law
    fn add(&self, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// `scalar · base`
    fn scalar_multiply(&self, base: &Self::Element, scalar: &Felt) -> Self::Element;

    /// Number of elements `n`; scalars are taken mod `n`
    fn order(&self) -> BigUint;

    /// The two independent generators `(G, H)`
    fn generators(&self) -> (Self::Element, Self::Element);

    /// Encode an element as a field element digest
    fn to_digest(&self, element: &Self::Element) -> Felt;

    /// Decode a digest back to an element; `None` if it encodes none
    fn from_digest(&self, digest: &Felt) -> Option<Self::Element>;
}

/// Whether `scalar < n`
pub fn is_canonical_scalar<G: Group + ?Sized>(group: &G, scalar: &Felt) -> bool {
    felt_to_biguint(scalar) < group.order()
}

/// `(a + b) mod n`
///
/// `None` when the group order exceeds the field, so the sum has no `Felt` form.
pub fn add_scalars<G: Group + ?Sized>(group: &G, a: &Felt, b: &Felt) -> Option<Felt> {
    let sum = (felt_to_biguint(a) + felt_to_biguint(b)) % group.order();
    felt_from_biguint(&sum).ok()
}

/// Z_P^* with the configured generators
#[derive(Debug, Clone)]
pub struct MultiplicativeGroup {
    g: Felt,
    h: Felt,
}

impl MultiplicativeGroup {
    pub fn new(params: &FieldParameters) -> Self {
        Self {
            g: params.g,
            h: params.h,
        }
    }
}

impl Group for MultiplicativeGroup {
    type Element = Felt;

    fn identity(&self) -> Felt {
        Felt::ONE
    }

    fn add(&self, a: &Felt, b: &Felt) -> Felt {
        *a * *b
    }

    fn scalar_multiply(&self, base: &Felt, scalar: &Felt) -> Felt {
        // Constant time in the exponent: nonces are secret
        base.pow(felt_to_le_limbs(scalar))
    }

    fn order(&self) -> BigUint {
        modulus() - 1u8
    }

    fn generators(&self) -> (Felt, Felt) {
        (self.g, self.h)
    }

    fn to_digest(&self, element: &Felt) -> Felt {
        *element
    }

    fn from_digest(&self, digest: &Felt) -> Option<Felt> {
        (!bool::from(digest.is_zero())).then_some(*digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> MultiplicativeGroup {
        MultiplicativeGroup::new(&FieldParameters::starknet())
    }

    #[test]
    fn test_identity_is_neutral() {
        let group = group();
        let (g, _) = group.generators();
        assert_eq!(group.add(&g, &group.identity()), g);
        assert_eq!(group.scalar_multiply(&g, &Felt::ZERO), group.identity());
    }

    #[test]
    fn test_scalar_multiply_matches_repeated_add() {
        let group = group();
        let (g, _) = group.generators();

        let mut acc = group.identity();
        for _ in 0..5 {
            acc = group.add(&acc, &g);
        }
        assert_eq!(group.scalar_multiply(&g, &Felt::from(5u64)), acc);
    }

    #[test]
    fn test_scalar_multiply_distributes() {
        let group = group();
        let (_, h) = group.generators();
        let a = Felt::from(1_000_003u64);
        let b = Felt::from(77u64);

        let lhs = group.scalar_multiply(&h, &(a + b));
        let rhs = group.add(&group.scalar_multiply(&h, &a), &group.scalar_multiply(&h, &b));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_scalar_sums_wrap_at_group_order() {
        let group = group();
        let (_, h) = group.generators();
        let a = -Felt::from(5u64); // P - 5
        let b = Felt::from(10u64);

        // P - 5 + 10 = 6 mod (P - 1), not 5 mod P
        let sum = add_scalars(&group, &a, &b).unwrap();
        assert_eq!(sum, Felt::from(6u64));
        assert_eq!(
            group.scalar_multiply(&h, &sum),
            group.add(&group.scalar_multiply(&h, &a), &group.scalar_multiply(&h, &b))
        );
        assert_ne!(sum, a + b);
    }

    #[test]
    fn test_canonical_scalars() {
        let group = group();
        assert!(is_canonical_scalar(&group, &Felt::ZERO));
        assert!(is_canonical_scalar(&group, &-Felt::from(2u64)));
        // P - 1 is the group order itself
        assert!(!is_canonical_scalar(&group, &-Felt::ONE));
        let (g, _) = group.generators();
        assert_eq!(group.scalar_multiply(&g, &-Felt::ONE), group.identity());
    }

    #[test]
    fn test_digest_roundtrip() {
        let group = group();
        let (g, _) = group.generators();
        assert_eq!(group.from_digest(&group.to_digest(&g)), Some(g));
        assert_eq!(group.from_digest(&Felt::ZERO), None);
    }
}
