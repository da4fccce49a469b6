//! Conversions between human-readable prices and Q64.96 sqrt prices.
//!
//! A "price" here is always the amount of token1 paid for one whole token0,
//! expressed in whole-token units and adjusted for both tokens' decimals.

use crate::U160_MAX;
use crate::error::{Error, MathError, QuoteError};
use crate::math::tick_math::{
    MAX_SQRT_PRICE, MIN_SQRT_PRICE, get_sqrt_price_at_tick, get_tick_at_sqrt_price,
};
use alloy_primitives::utils::{ParseUnits, format_units, parse_units};
use alloy_primitives::{U256, U512};

/// Fixed-point precision used when rendering prices.
pub const PRICE_DECIMALS: u8 = 18;

/// Largest decimals value whose unit still fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

fn pow10(decimals: u8) -> U512 {
    U512::from(10u64).pow(U512::from(decimals))
}

fn narrow(value: U512) -> Result<U256, MathError> {
    if value.bit_len() > 256 {
        return Err(MathError::Overflow);
    }
    Ok(U256::from_limbs_slice(&value.as_limbs()[..4]))
}

fn check_decimals(decimals: u8) -> Result<(), QuoteError> {
    if decimals > MAX_DECIMALS {
        return Err(QuoteError::UnsupportedDecimals(decimals));
    }
    Ok(())
}

/// `floor(sqrt(numerator * 2^192 / denominator))` with 512-bit intermediates.
fn sqrt_ratio_x96(numerator: U512, denominator: U512) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let shifted = numerator.checked_shl(192).ok_or(MathError::Overflow)?;
    if shifted >> 192 != numerator {
        return Err(MathError::Overflow);
    }
    let root = narrow((shifted / denominator).root(2))?;
    if root > U160_MAX {
        return Err(MathError::Overflow);
    }
    Ok(root)
}

/// Sqrt price for a pool holding `amount1` of token1 against `amount0` of
/// token0: `sqrt(amount1 / amount0) * 2^96`, rounded down.
pub fn encode_sqrt_ratio_x96(amount1: U256, amount0: U256) -> Result<U256, MathError> {
    sqrt_ratio_x96(U512::from(amount1), U512::from(amount0))
}

/// Parses a non-negative decimal string into raw units with `decimals`
/// fractional digits.
pub fn parse_decimal(value: &str, decimals: u8) -> Result<U256, QuoteError> {
    check_decimals(decimals)?;
    match parse_units(value.trim(), decimals) {
        Ok(ParseUnits::U256(raw)) => Ok(raw),
        Ok(ParseUnits::I256(raw)) if !raw.is_negative() => Ok(raw.into_raw()),
        _ => Err(QuoteError::InvalidAmount(value.to_string())),
    }
}

/// Renders raw units as a decimal string without trailing zeros.
pub fn format_decimal(raw: U256, decimals: u8) -> Result<String, QuoteError> {
    check_decimals(decimals)?;
    let formatted = format_units(raw, decimals)
        .map_err(|e| QuoteError::InvalidAmount(e.to_string()))?;
    Ok(trim_trailing_zeros(&formatted))
}

pub(crate) fn trim_trailing_zeros(value: &str) -> String {
    if !value.contains('.') {
        return value.to_string();
    }
    value
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Starting sqrt price for a pool from a human price of token0 in token1.
///
/// `"2500"` with `decimals0 = 18`, `decimals1 = 6` means one token0 is worth
/// 2500 token1.
pub fn price_to_sqrt_price_x96(
    price: &str,
    decimals0: u8,
    decimals1: u8,
) -> Result<U256, QuoteError> {
    check_decimals(decimals0)?;
    check_decimals(decimals1)?;

    let scaled = parse_decimal(price, PRICE_DECIMALS)
        .map_err(|_| QuoteError::InvalidPrice(price.to_string()))?;
    if scaled.is_zero() {
        return Err(QuoteError::InvalidPrice(price.to_string()));
    }

    let numerator = U512::from(scaled)
        .checked_mul(pow10(decimals1))
        .ok_or(MathError::Overflow)?;
    let denominator = pow10(PRICE_DECIMALS)
        .checked_mul(pow10(decimals0))
        .ok_or(MathError::Overflow)?;

    let sqrt_price = sqrt_ratio_x96(numerator, denominator)
        .map_err(|_| QuoteError::InvalidPrice(price.to_string()))?;
    if !(MIN_SQRT_PRICE..MAX_SQRT_PRICE).contains(&sqrt_price) {
        return Err(QuoteError::InvalidPrice(price.to_string()));
    }
    Ok(sqrt_price)
}

/// Human price of token0 in token1 at `sqrt_price_x96`, truncated to
/// [`PRICE_DECIMALS`] fractional digits.
pub fn sqrt_price_x96_to_price(
    sqrt_price_x96: U256,
    decimals0: u8,
    decimals1: u8,
) -> Result<String, QuoteError> {
    check_decimals(decimals0)?;
    check_decimals(decimals1)?;

    let sqrt = U512::from(sqrt_price_x96);
    let numerator = (sqrt * sqrt)
        .checked_mul(pow10(decimals0))
        .and_then(|v| v.checked_mul(pow10(PRICE_DECIMALS)))
        .ok_or(MathError::Overflow)?;
    let denominator = (U512::from(1u64) << 192) * pow10(decimals1);

    format_decimal(narrow(numerator / denominator)?, PRICE_DECIMALS)
}

/// Human price at a tick.
pub fn tick_to_price(tick: i32, decimals0: u8, decimals1: u8) -> Result<String, Error> {
    let sqrt_price = get_sqrt_price_at_tick(tick)?;
    Ok(sqrt_price_x96_to_price(sqrt_price, decimals0, decimals1)?)
}

/// Greatest tick whose price does not exceed the human `price`.
pub fn price_to_tick(price: &str, decimals0: u8, decimals1: u8) -> Result<i32, Error> {
    let sqrt_price = price_to_sqrt_price_x96(price, decimals0, decimals1)?;
    Ok(get_tick_at_sqrt_price(sqrt_price)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Q96;
    use std::str::FromStr;

    #[test]
    fn encode_known_ratios() {
        assert_eq!(encode_sqrt_ratio_x96(U256::ONE, U256::ONE).unwrap(), Q96);
        assert_eq!(
            encode_sqrt_ratio_x96(U256::from(4), U256::ONE).unwrap(),
            Q96 * U256::from(2)
        );
        assert_eq!(
            encode_sqrt_ratio_x96(U256::from(101), U256::from(100)).unwrap(),
            U256::from_str("79623317895830914510639640423").unwrap()
        );
    }

    #[test]
    fn encode_rejects_zero_denominator_and_overflow() {
        assert_eq!(
            encode_sqrt_ratio_x96(U256::ONE, U256::ZERO),
            Err(MathError::DivisionByZero)
        );
        assert_eq!(
            encode_sqrt_ratio_x96(U256::MAX, U256::ONE),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn parse_and_format_decimals() {
        assert_eq!(
            parse_decimal("1.5", 6).unwrap(),
            U256::from(1_500_000u64)
        );
        assert_eq!(parse_decimal(" 42 ", 0).unwrap(), U256::from(42u64));
        assert!(parse_decimal("abc", 18).is_err());
        assert!(parse_decimal("-1", 18).is_err());
        assert_eq!(
            parse_decimal("1", 78),
            Err(QuoteError::UnsupportedDecimals(78))
        );

        assert_eq!(format_decimal(U256::from(1_500_000u64), 6).unwrap(), "1.5");
        assert_eq!(format_decimal(U256::from(2_000_000u64), 6).unwrap(), "2");
        assert_eq!(format_decimal(U256::ZERO, 18).unwrap(), "0");
        assert_eq!(format_decimal(U256::from(100u64), 0).unwrap(), "100");
    }

    #[test]
    fn unit_price_is_q96() {
        assert_eq!(price_to_sqrt_price_x96("1", 18, 18).unwrap(), Q96);
        assert_eq!(sqrt_price_x96_to_price(Q96, 18, 18).unwrap(), "1");
        assert_eq!(sqrt_price_x96_to_price(Q96 * U256::from(2), 18, 18).unwrap(), "4");
    }

    #[test]
    fn price_accounts_for_decimals() {
        // one 6-decimal token0 worth 0.0005 of an 18-decimal token1
        let sqrt_price = price_to_sqrt_price_x96("0.0005", 6, 18).unwrap();
        assert_eq!(
            sqrt_price,
            U256::from_str("1771595571142957102961017161607260").unwrap()
        );
        assert_eq!(
            sqrt_price_x96_to_price(sqrt_price, 6, 18).unwrap(),
            "0.000499999999999999"
        );
    }

    #[test]
    fn price_round_trip_truncates() {
        let sqrt_price = price_to_sqrt_price_x96("1.5", 18, 18).unwrap();
        assert_eq!(
            sqrt_price_x96_to_price(sqrt_price, 18, 18).unwrap(),
            "1.499999999999999999"
        );
    }

    #[test]
    fn invalid_prices_are_rejected() {
        for bad in ["", "0", "-3", "one"] {
            assert!(matches!(
                price_to_sqrt_price_x96(bad, 18, 18),
                Err(QuoteError::InvalidPrice(_))
            ));
        }
        // far above the largest representable sqrt price
        assert!(matches!(
            price_to_sqrt_price_x96("1000000000000000000000000000000000000000000", 0, 18),
            Err(QuoteError::InvalidPrice(_))
        ));
    }

    #[test]
    fn ticks_and_prices() {
        assert_eq!(tick_to_price(0, 18, 18).unwrap(), "1");
        assert_eq!(price_to_tick("1", 18, 18).unwrap(), 0);
        assert_eq!(price_to_tick("4", 18, 18).unwrap(), 13863);
        assert_eq!(price_to_tick("2500", 18, 18).unwrap(), 78244);
        assert_eq!(price_to_tick("0.25", 18, 18).unwrap(), -13864);
    }
}
