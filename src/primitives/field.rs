//! Field Element over the Starknet prime
//!
//! P = 2^251 + 17 * 2^192 + 1, the native `felt252` field of the target ledger.
//! Every digest, nonce and tag in this crate is a [`Felt`].
//!
//! # Encodings
//! - hex: `0x`-prefixed, minimal, lowercase (`0x0` for zero). This is the calldata form.
//! - decimal: base-10, used inside hashed preimages.
//!
//! Values entering from outside go through [`felt_from_hex`] / [`felt_from_decimal`],
//! which range-check against P instead of silently reducing.

use ff::{Field, PrimeField};
use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CommitmentError, CommitmentResult};

/// Maximum number of significant hex digits in a field element
pub const FELT_HEX_DIGITS: usize = 64;

/// Number of hash bytes folded into a field element (248 bits, always < P)
pub const HASH_PREFIX_BYTES: usize = 31;

/// Element of the Starknet prime field
#[derive(PrimeField)]
#[PrimeFieldModulus = "3618502788666131213697322783095070105623107215331596699973092056135872020481"]
#[PrimeFieldGenerator = "3"]
#[PrimeFieldReprEndianness = "big"]
pub struct Felt([u64; 4]);

/// The field modulus P as an integer
pub fn modulus() -> BigUint {
    (BigUint::from(1u8) << 251usize) + (BigUint::from(17u8) << 192usize) + BigUint::from(1u8)
}

/// Modulus as minimal `0x` hex
pub fn modulus_hex() -> String {
    format!("0x{}", modulus().to_str_radix(16))
}

/// Build a field element from big-endian u64 limbs, reducing mod P
pub fn felt_from_be_limbs(limbs: [u64; 4]) -> Felt {
    let shift = Felt::from_u128(1u128 << 64);
    limbs
        .iter()
        .fold(Felt::ZERO, |acc, limb| acc * shift + Felt::from(*limb))
}

/// Build a field element from 32 big-endian bytes, reducing mod P
pub fn felt_from_be_bytes(bytes: &[u8; 32]) -> Felt {
    let mut limbs = [0u64; 4];
    for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        *limb = u64::from_be_bytes(buf);
    }
    felt_from_be_limbs(limbs)
}

/// Interpret the first 31 bytes of a hash output as a big-endian integer
pub fn felt_from_hash_prefix(hash: &[u8]) -> Felt {
    let take = hash.len().min(HASH_PREFIX_BYTES);
    let mut bytes = [0u8; 32];
    bytes[32 - take..].copy_from_slice(&hash[..take]);
    felt_from_be_bytes(&bytes)
}

/// Canonical big-endian bytes
pub fn felt_to_bytes(felt: &Felt) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(felt.to_repr().as_ref());
    bytes
}

/// Little-endian u64 limbs of the canonical integer (exponent form)
pub fn felt_to_le_limbs(felt: &Felt) -> [u64; 4] {
    let bytes = felt_to_bytes(felt);
    let mut limbs = [0u64; 4];
    for (i, chunk) in bytes.chunks_exact(8).enumerate() {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        limbs[3 - i] = u64::from_be_bytes(buf);
    }
    limbs
}

/// Minimal `0x` hex encoding
pub fn felt_to_hex(felt: &Felt) -> String {
    let encoded = hex::encode(felt_to_bytes(felt));
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", trimmed)
    }
}

/// Canonical integer value
pub fn felt_to_biguint(felt: &Felt) -> BigUint {
    BigUint::from_bytes_be(&felt_to_bytes(felt))
}

/// Field element from an integer already below P
///
/// # Errors
/// - `ArithmeticOverflow`: `value >= P`
pub fn felt_from_biguint(value: &BigUint) -> CommitmentResult<Felt> {
    if *value >= modulus() {
        return Err(CommitmentError::overflow("felt parsing (value >= field modulus)"));
    }
    let raw = value.to_bytes_be();
    let mut bytes = [0u8; 32];
    bytes[32 - raw.len()..].copy_from_slice(&raw);
    Ok(felt_from_be_bytes(&bytes))
}

/// Base-10 encoding
pub fn felt_to_decimal(felt: &Felt) -> String {
    felt_to_biguint(felt).to_str_radix(10)
}

/// Parse a hex field element from untrusted input
///
/// # Errors
/// - `ValidationError`: empty, or not hex
/// - `ArithmeticOverflow`: negative, wider than 256 bits, or >= P
pub fn felt_from_hex(input: &str) -> CommitmentResult<Felt> {
    let trimmed = input.trim();
    if trimmed.starts_with('-') {
        return Err(CommitmentError::overflow("felt parsing (negative value)"));
    }

    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CommitmentError::ValidationError(format!(
            "invalid hex field element: {}",
            input
        )));
    }

    let significant = digits.trim_start_matches('0');
    if significant.len() > FELT_HEX_DIGITS {
        return Err(CommitmentError::overflow("felt parsing (wider than 256 bits)"));
    }

    let padded = format!("{:0>64}", significant);
    let bytes = hex::decode(&padded)
        .map_err(|e| CommitmentError::ValidationError(format!("invalid hex: {}", e)))?;

    let mut repr = <Felt as PrimeField>::Repr::default();
    repr.as_mut().copy_from_slice(&bytes);
    Option::<Felt>::from(Felt::from_repr(repr))
        .ok_or_else(|| CommitmentError::overflow("felt parsing (value >= field modulus)"))
}

/// Parse a decimal field element from untrusted input
pub fn felt_from_decimal(input: &str) -> CommitmentResult<Felt> {
    let trimmed = input.trim();
    if trimmed.starts_with('-') {
        return Err(CommitmentError::overflow("felt parsing (negative value)"));
    }

    let value: BigUint = trimmed.parse().map_err(|_| {
        CommitmentError::ValidationError(format!("invalid decimal field element: {}", input))
    })?;
    felt_from_biguint(&value)
}

impl Serialize for Felt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&felt_to_hex(self))
    }
}

impl<'de> Deserialize<'de> for Felt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        felt_from_hex(&s).map_err(de::Error::custom)
    }
}
