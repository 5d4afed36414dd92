//! Decimal to fixed-point conversion for on-chain amounts.
//!
//! Amounts are rounded to [`ROUNDING_DIGITS`] fractional digits before being
//! scaled by `10^decimals`, mirroring how token amounts are entered by hand.

use alloy::primitives::utils::parse_units;
use alloy::primitives::U256;

use crate::error::{Result, SubsError};

/// Decimals used by the fee token (and most ERC20 tokens).
pub const DEFAULT_DECIMALS: u8 = 18;

/// Fractional digits kept before scaling.
pub const ROUNDING_DIGITS: usize = 5;

/// The smallest subnormal `f64` is `2^-1074`, so this many fractional digits
/// print any finite `f64` without rounding.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Encodes a decimal amount into its fixed-point representation.
///
/// The value is rounded to five fractional digits, with exact ties going to
/// the larger candidate, then scaled by `10^decimals` and truncated to an
/// integer.
///
/// # Example
///
/// ```rust
/// use optisubs::amount::encode;
///
/// let wei = encode(0.123456, 18).unwrap();
/// assert_eq!(wei.to_string(), "123460000000000000");
/// ```
pub fn encode(amount: f64, decimals: u8) -> Result<U256> {
    if !amount.is_finite() {
        return Err(SubsError::invalid_amount(amount, "amount must be finite"));
    }
    if amount < 0.0 {
        return Err(SubsError::invalid_amount(amount, "amount must not be negative"));
    }

    // abs() folds -0.0 into 0.0 so the string carries no sign
    let rounded = round_half_up(amount.abs());
    encode_decimal(&rounded, decimals)
}

/// Rounds a non-negative finite value to [`ROUNDING_DIGITS`] fractional digits.
///
/// `{:.5}` formatting rounds exact ties to even, so the decision is made on
/// the exact decimal expansion instead.
fn round_half_up(amount: f64) -> String {
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, amount);
    let (integer, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let round_up = fraction
        .as_bytes()
        .get(ROUNDING_DIGITS)
        .is_some_and(|digit| *digit >= b'5');

    let mut digits: Vec<u8> = integer
        .bytes()
        .chain(fraction.bytes().take(ROUNDING_DIGITS))
        .collect();

    if round_up {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    let split = digits.len() - ROUNDING_DIGITS;
    let digits = String::from_utf8_lossy(&digits);
    format!("{}.{}", &digits[..split], &digits[split..])
}

/// Scales an already-decimal string by `10^decimals`, truncating any
/// fractional digits beyond `decimals`.
pub fn encode_decimal(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();
    let (integer, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    let well_formed = !(integer.is_empty() && fraction.is_empty())
        && integer.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(SubsError::invalid_amount(amount, "not a non-negative decimal string"));
    }

    let keep = fraction.len().min(decimals as usize);
    let truncated = match (integer.is_empty(), keep) {
        (true, 0) => "0".to_string(),
        (false, 0) => integer.to_string(),
        (true, _) => format!("0.{}", &fraction[..keep]),
        (false, _) => format!("{integer}.{}", &fraction[..keep]),
    };

    let parsed = parse_units(&truncated, decimals)
        .map_err(|e| SubsError::invalid_amount(amount, e.to_string()))?;

    Ok(parsed.get_absolute())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        U256::from_str_radix(s, 10).unwrap()
    }

    #[test]
    fn test_encode_whole_unit() {
        assert_eq!(encode(1.0, 18).unwrap(), wei("1000000000000000000"));
    }

    #[test]
    fn test_encode_rounds_to_five_digits() {
        assert_eq!(encode(0.123456, 18).unwrap(), wei("123460000000000000"));
        assert_eq!(encode(0.1, 18).unwrap(), wei("100000000000000000"));
        assert_eq!(encode(0.15, 18).unwrap(), wei("150000000000000000"));
    }

    #[test]
    fn test_encode_rounds_exact_ties_up() {
        // Both are exactly representable, so the sixth digit is a true tie.
        assert_eq!(encode(0.015625, 18).unwrap(), wei("15630000000000000"));
        assert_eq!(encode(0.046875, 18).unwrap(), wei("46880000000000000"));
    }

    #[test]
    fn test_encode_rounding_carries_into_integer_part() {
        assert_eq!(encode(9.999996, 18).unwrap(), wei("10000000000000000000"));
        assert_eq!(encode(0.000004, 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_encode_rejects_negative_and_non_finite() {
        for bad in [-1.0, -0.000_01, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(encode(bad, 18), Err(SubsError::InvalidAmount { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_encode_negative_zero_is_zero() {
        assert_eq!(encode(-0.0, 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_encode_truncates_below_token_precision() {
        // 0.12346 with 2 decimals -> 12 (truncated, not rounded)
        assert_eq!(encode(0.123456, 2).unwrap(), U256::from(12u64));
        assert_eq!(encode(7.9, 0).unwrap(), U256::from(7u64));
    }

    #[test]
    fn test_encode_preserves_ordering() {
        let amounts = [0.0, 0.00001, 0.1, 0.15, 1.0, 2.5, 1_000_000.0];
        let encoded: Vec<U256> = amounts.iter().map(|a| encode(*a, 18).unwrap()).collect();
        assert!(encoded.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_encode_overflow_is_invalid() {
        assert!(matches!(
            encode(1e300, 18),
            Err(SubsError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_encode_decimal_rejects_garbage() {
        for bad in ["", ".", "1e5", "-1", "0x10", "1.2.3", "abc"] {
            assert!(encode_decimal(bad, 18).is_err(), "{bad:?} should be rejected");
        }
        assert_eq!(encode_decimal(".5", 1).unwrap(), U256::from(5u64));
        assert_eq!(encode_decimal("3.", 1).unwrap(), U256::from(30u64));
    }
}
