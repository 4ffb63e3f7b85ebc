//! Conversion Utilities
//!
//! BTC amounts cross the public boundary as `f64` for display compatibility;
//! everything past that boundary is integer satoshis. Ratios are integer basis
//! points so thresholds never depend on float rounding.

use serde::{Deserialize, Serialize};

use crate::error::{validation, CommitmentError, CommitmentResult};

/// 1 BTC = 10^8 satoshis
pub const SATOSHIS_PER_BTC: u64 = 100_000_000;

/// Decimal places of a satoshi amount
pub const BTC_DECIMALS: u32 = 8;

/// 100% in basis points
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Convert BTC to satoshis: `floor(amount * 1e8)`
///
/// A product within float representation error of a whole number is taken as
/// that number (`0.29 * 1e8` is 28999999.999999996 in f64, and means 29000000).
/// Digits past the eighth decimal are truncated. NaN and non-positive inputs
/// map to 0; amounts beyond `u64` (infinity included) saturate.
pub fn btc_to_satoshis(amount_btc: f64) -> u64 {
    let scaled = amount_btc * SATOSHIS_PER_BTC as f64;
    if scaled.is_nan() || scaled <= 0.0 {
        return 0;
    }

    let nearest = scaled.round();
    let tolerance = (scaled * 4.0 * f64::EPSILON).max(1e-6);
    if (scaled - nearest).abs() <= tolerance {
        nearest as u64
    } else {
        scaled.floor() as u64
    }
}

/// Convert satoshis to BTC
pub fn satoshis_to_btc(satoshis: u64) -> f64 {
    satoshis as f64 / SATOSHIS_PER_BTC as f64
}

/// Rescale a satoshi amount to a token with `decimals` decimal places
///
/// Mint amounts on the ledger are stablecoin base units (18 decimals), pegged
/// 1:1 to the satoshi-denominated debt.
pub fn satoshis_to_token_units(satoshis: u64, decimals: u32) -> CommitmentResult<u128> {
    let satoshis = satoshis as u128;
    if decimals >= BTC_DECIMALS {
        let factor = 10u128
            .checked_pow(decimals - BTC_DECIMALS)
            .ok_or_else(|| CommitmentError::overflow("token unit scaling"))?;
        satoshis
            .checked_mul(factor)
            .ok_or_else(|| CommitmentError::overflow("token unit scaling"))
    } else {
        Ok(satoshis / 10u128.pow(BTC_DECIMALS - decimals))
    }
}

/// Collateral ratio or liquidation threshold in basis points (15000 = 1.5x)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ratio(u32);

impl Ratio {
    /// 1.0x
    pub const ONE: Ratio = Ratio(BPS_DENOMINATOR);

    pub const fn from_bps(bps: u32) -> Self {
        Ratio(bps)
    }

    /// From a float multiplier (1.5 = 150%)
    ///
    /// The multiplier must be a whole number of basis points. Finer ratios are
    /// rejected rather than rounded, since rounding would move the collateral
    /// threshold the caller asked for.
    pub fn from_multiplier(multiplier: f64) -> CommitmentResult<Self> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(CommitmentError::ValidationError(format!(
                "ratio must be a positive number, got {}",
                multiplier
            )));
        }
        let scaled = multiplier * BPS_DENOMINATOR as f64;
        let bps = scaled.round();
        if bps > u32::MAX as f64 {
            return Err(CommitmentError::overflow("ratio scaling"));
        }
        if (scaled - bps).abs() > (scaled * 4.0 * f64::EPSILON).max(1e-9) {
            return Err(CommitmentError::ValidationError(format!(
                "ratio {} is finer than one basis point",
                multiplier
            )));
        }
        let ratio = Ratio(bps as u32);
        validation::validate_ratio_bps(ratio.0)?;
        Ok(ratio)
    }

    pub fn bps(&self) -> u32 {
        self.0
    }

    /// `round(ratio * 100)`, the percent form recorded in proofs
    pub fn percent(&self) -> u32 {
        (self.0 + 50) / 100
    }

    pub fn as_multiplier(&self) -> f64 {
        self.0 as f64 / BPS_DENOMINATOR as f64
    }

    /// `ceil(amount * ratio)`
    pub fn apply_ceil(&self, amount: u64) -> CommitmentResult<u64> {
        let scaled = amount as u128 * self.0 as u128;
        let denom = BPS_DENOMINATOR as u128;
        u64::try_from((scaled + denom - 1) / denom)
            .map_err(|_| CommitmentError::overflow("required collateral"))
    }

    /// `floor(amount * ratio)`
    pub fn apply_floor(&self, amount: u64) -> CommitmentResult<u64> {
        let scaled = amount as u128 * self.0 as u128;
        u64::try_from(scaled / BPS_DENOMINATOR as u128)
            .map_err(|_| CommitmentError::overflow("threshold collateral"))
    }

    /// Shortest decimal multiplier form: 15000 -> "1.5", 10000 -> "1.0", 10050 -> "1.005"
    pub fn to_decimal_string(&self) -> String {
        let whole = self.0 / BPS_DENOMINATOR;
        let frac = self.0 % BPS_DENOMINATOR;
        if frac == 0 {
            return format!("{}.0", whole);
        }
        let digits = format!("{:04}", frac);
        format!("{}.{}", whole, digits.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_btc_to_satoshis() {
        assert_eq!(btc_to_satoshis(1.0), 100_000_000);
        assert_eq!(btc_to_satoshis(1.5), 150_000_000);
        assert_eq!(btc_to_satoshis(2.5), 250_000_000);
        assert_eq!(btc_to_satoshis(0.00000001), 1);
        assert_eq!(btc_to_satoshis(0.29), 29_000_000);
    }

    #[test]
    fn test_btc_to_satoshis_truncates_sub_satoshi() {
        assert_eq!(btc_to_satoshis(0.123456789), 12_345_678);
        assert_eq!(btc_to_satoshis(0.000000019), 1);
        assert_eq!(btc_to_satoshis(0.000000001), 0);
    }

    #[test]
    fn test_btc_to_satoshis_is_total() {
        assert_eq!(btc_to_satoshis(-1.0), 0);
        assert_eq!(btc_to_satoshis(f64::NAN), 0);
        assert_eq!(btc_to_satoshis(f64::NEG_INFINITY), 0);
        assert_eq!(btc_to_satoshis(f64::INFINITY), u64::MAX);
    }

    #[test]
    fn test_satoshi_roundtrip_small_range() {
        for n in 0..100_000u64 {
            assert_eq!(btc_to_satoshis(satoshis_to_btc(n)), n, "roundtrip failed for {}", n);
        }
    }

    #[test]
    fn test_token_units() {
        assert_eq!(
            satoshis_to_token_units(100_000_000, 18).unwrap(),
            1_000_000_000_000_000_000
        );
        assert_eq!(satoshis_to_token_units(150_000_000, 6).unwrap(), 1_500_000);
        assert_eq!(satoshis_to_token_units(42, 8).unwrap(), 42);
        assert!(satoshis_to_token_units(u64::MAX, 40).is_err());
    }

    #[test]
    fn test_ratio_from_multiplier() {
        assert_eq!(Ratio::from_multiplier(1.5).unwrap().bps(), 15_000);
        assert_eq!(Ratio::from_multiplier(1.2).unwrap().bps(), 12_000);
        assert_eq!(Ratio::from_multiplier(1.2).unwrap().percent(), 120);
        assert!(Ratio::from_multiplier(0.0).is_err());
        assert!(Ratio::from_multiplier(-1.5).is_err());
        assert!(Ratio::from_multiplier(f64::NAN).is_err());
        assert!(Ratio::from_multiplier(0.00001).is_err());
    }

    #[test]
    fn test_ratio_from_multiplier_rejects_sub_bps() {
        assert!(matches!(
            Ratio::from_multiplier(1.50004),
            Err(CommitmentError::ValidationError(_))
        ));
        assert!(matches!(
            Ratio::from_multiplier(1.20004),
            Err(CommitmentError::ValidationError(_))
        ));
        // float noise on an exact basis point is not a finer ratio
        assert_eq!(Ratio::from_multiplier(1.1 + 0.2).unwrap().bps(), 13_000);
        assert_eq!(Ratio::from_multiplier(1.0005).unwrap().bps(), 10_005);
        assert_eq!(Ratio::from_multiplier(2.3456).unwrap().bps(), 23_456);
    }

    #[test]
    fn test_ratio_thresholds() {
        let ratio = Ratio::from_bps(15_000);
        assert_eq!(ratio.apply_ceil(100_000_000).unwrap(), 150_000_000);
        assert_eq!(ratio.apply_ceil(3).unwrap(), 5); // 4.5 -> 5
        assert_eq!(ratio.apply_floor(3).unwrap(), 4); // 4.5 -> 4

        let threshold = Ratio::from_bps(12_000);
        assert_eq!(threshold.apply_floor(100_000_000).unwrap(), 120_000_000);

        assert!(Ratio::from_bps(u32::MAX).apply_ceil(u64::MAX).is_err());
    }

    #[test]
    fn test_ratio_decimal_string() {
        assert_eq!(Ratio::from_bps(15_000).to_decimal_string(), "1.5");
        assert_eq!(Ratio::from_bps(12_000).to_decimal_string(), "1.2");
        assert_eq!(Ratio::ONE.to_decimal_string(), "1.0");
        assert_eq!(Ratio::from_bps(10_050).to_decimal_string(), "1.005");
        assert_eq!(Ratio::from_bps(12_345).to_decimal_string(), "1.2345");
    }
}
