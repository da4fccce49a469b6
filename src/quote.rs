//! Output estimation for exact-input swaps.
//!
//! A quote first simulates the swap against a [`PoolState`] snapshot. When
//! the simulation fails or the snapshot cannot fill the whole input, the
//! quote falls back to converting the input at the current sqrt price.

use crate::U256_E4;
use crate::error::{MathError, QuoteError};
use crate::math::math_helpers::{mul_div, mul_div_rounding_up};
use crate::math::price_math::{format_decimal, parse_decimal};
use crate::pool::state::PoolState;
use crate::pool::swap::SwapParams;
use alloy_primitives::{I256, U256};
use alloy_primitives::aliases::U1024;
use tracing::debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QuoteSource {
    /// Full tick-walking simulation, fees included.
    Simulated,
    /// Spot-price conversion without fees or price impact.
    SqrtPriceFallback,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: U256,
    pub amount_out: U256,
    pub source: QuoteSource,
}

impl Quote {
    pub fn is_simulated(&self) -> bool {
        self.source == QuoteSource::Simulated
    }

    /// Minimum acceptable output after applying `slippage_bps`.
    pub fn minimum_amount_out(&self, slippage_bps: u32) -> Result<U256, MathError> {
        minimum_amount_out(self.amount_out, slippage_bps)
    }
}

/// Quotes an exact-input swap of `amount_in` raw units against `pool`.
pub fn quote_exact_input(
    pool: &PoolState,
    zero_for_one: bool,
    amount_in: U256,
) -> Result<Quote, QuoteError> {
    if amount_in > I256::MAX.into_raw() {
        return Err(QuoteError::InvalidAmount(amount_in.to_string()));
    }
    match pool.swap(SwapParams::exact_input(zero_for_one, amount_in)) {
        Ok(result) if !result.is_partial() => {
            let out_delta = if zero_for_one {
                result.amount1_delta
            } else {
                result.amount0_delta
            };
            // output leaves the pool, so its delta is never positive
            return Ok(Quote {
                amount_in,
                amount_out: out_delta.unsigned_abs(),
                source: QuoteSource::Simulated,
            });
        }
        Ok(result) => {
            debug!(
                pool_id = %pool.pool_id,
                remaining = %result.amount_remaining,
                "insufficient liquidity in snapshot, using sqrt price quote"
            );
        }
        Err(e) => {
            debug!(pool_id = %pool.pool_id, error = %e, "swap simulation failed, using sqrt price quote");
        }
    }

    if !pool.is_initialized() {
        return Err(QuoteError::InvalidPrice("pool is not initialized".to_string()));
    }
    let amount_out = quote_raw_from_sqrt_price_x96(pool.slot0.sqrt_price_x96, amount_in, zero_for_one)?;
    Ok(Quote {
        amount_in,
        amount_out,
        source: QuoteSource::SqrtPriceFallback,
    })
}

/// Converts raw input units at the spot price `sqrt_price_x96`, rounding
/// down. No fee is charged.
pub fn quote_raw_from_sqrt_price_x96(
    sqrt_price_x96: U256,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, MathError> {
    if amount_in.is_zero() {
        return Ok(U256::ZERO);
    }
    if sqrt_price_x96.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    // in * sqrtP^2 reaches 2^576, floor once at full width
    let amount = U1024::from(amount_in);
    let price_x192 = U1024::from(sqrt_price_x96) * U1024::from(sqrt_price_x96);
    let out: U1024 = if zero_for_one {
        (amount * price_x192) >> 192
    } else {
        (amount << 192) / price_x192
    };
    if out.bit_len() > 256 {
        return Err(MathError::Overflow);
    }
    Ok(U256::from_limbs_slice(&out.as_limbs()[..4]))
}

/// Human-unit form of [`quote_raw_from_sqrt_price_x96`].
///
/// Empty or zero input yields `"0"`. The output has trailing zeros trimmed.
pub fn get_quote_from_sqrt_price_x96(
    sqrt_price_x96: U256,
    amount_in: &str,
    decimals_in: u8,
    decimals_out: u8,
    zero_for_one: bool,
) -> Result<String, QuoteError> {
    let amount_in = amount_in.trim();
    if amount_in.is_empty() {
        return Ok("0".to_string());
    }
    let raw_in = parse_decimal(amount_in, decimals_in)?;
    if raw_in.is_zero() {
        return Ok("0".to_string());
    }
    if sqrt_price_x96.is_zero() {
        return Err(QuoteError::InvalidPrice("sqrt price is zero".to_string()));
    }
    let raw_out = quote_raw_from_sqrt_price_x96(sqrt_price_x96, raw_in, zero_for_one)?;
    format_decimal(raw_out, decimals_out)
}

/// `amount * (10000 - bps) / 10000`, rounded down. Slippage above 100%
/// floors at zero.
pub fn minimum_amount_out(amount: U256, slippage_bps: u32) -> Result<U256, MathError> {
    let keep = U256_E4.saturating_sub(U256::from(slippage_bps));
    mul_div(amount, keep, U256_E4)
}

/// `amount * (10000 + bps) / 10000`, rounded up.
pub fn maximum_amount_in(amount: U256, slippage_bps: u32) -> Result<U256, MathError> {
    mul_div_rounding_up(amount, U256_E4 + U256::from(slippage_bps), U256_E4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Q96;
    use crate::math::tick_math::get_sqrt_price_at_tick;
    use crate::pool::key::PoolKey;
    use crate::pool::state::TickInfo;
    use alloy_primitives::Address;

    const E18: u128 = 1_000_000_000_000_000_000;

    fn ranged_pool(liquidity: u128) -> PoolState {
        let key = PoolKey::new(
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            3000,
            60,
            Address::ZERO,
        )
        .unwrap();
        PoolState::new(key)
            .with_sqrt_price(Q96)
            .unwrap()
            .with_liquidity(liquidity)
            .with_ticks([
                (
                    -600,
                    TickInfo {
                        liquidity_gross: liquidity,
                        liquidity_net: liquidity as i128,
                    },
                ),
                (
                    600,
                    TickInfo {
                        liquidity_gross: liquidity,
                        liquidity_net: -(liquidity as i128),
                    },
                ),
            ])
            .unwrap()
    }

    #[test]
    fn sqrt_price_quote_at_parity() {
        assert_eq!(
            get_quote_from_sqrt_price_x96(Q96, "100", 18, 18, true).unwrap(),
            "100"
        );
        assert_eq!(
            get_quote_from_sqrt_price_x96(Q96, "100", 18, 18, false).unwrap(),
            "100"
        );
    }

    #[test]
    fn sqrt_price_quote_empty_and_zero() {
        assert_eq!(get_quote_from_sqrt_price_x96(Q96, "", 18, 6, true).unwrap(), "0");
        assert_eq!(get_quote_from_sqrt_price_x96(Q96, "  ", 18, 6, true).unwrap(), "0");
        assert_eq!(get_quote_from_sqrt_price_x96(Q96, "0.000", 18, 6, true).unwrap(), "0");
        assert!(get_quote_from_sqrt_price_x96(U256::ZERO, "1", 18, 6, true).is_err());
        assert!(get_quote_from_sqrt_price_x96(Q96, "abc", 18, 6, true).is_err());
    }

    #[test]
    fn sqrt_price_quote_respects_direction_and_decimals() {
        // price 4 (token1 per token0) at sqrtP = 2 * 2^96
        let sqrt = Q96 * U256::from(2);
        assert_eq!(get_quote_from_sqrt_price_x96(sqrt, "1.5", 18, 18, true).unwrap(), "6");
        assert_eq!(get_quote_from_sqrt_price_x96(sqrt, "1", 18, 18, false).unwrap(), "0.25");
        // 1 token0 of 18 decimals at raw parity is 1e12 units of a 6-decimal token
        assert_eq!(
            get_quote_from_sqrt_price_x96(Q96, "1", 18, 6, true).unwrap(),
            "1000000000000"
        );
    }

    #[test]
    fn sqrt_price_quote_floors_once() {
        // price 2.25 at sqrtP = 1.5 * 2^96
        let sqrt = Q96 * U256::from(3) / U256::from(2);
        assert_eq!(get_quote_from_sqrt_price_x96(sqrt, "1", 0, 0, true).unwrap(), "2");
        assert_eq!(get_quote_from_sqrt_price_x96(sqrt, "9", 0, 0, false).unwrap(), "4");
        assert_eq!(quote_raw_from_sqrt_price_x96(sqrt, U256::from(3u64), true).unwrap(), U256::from(6u64));
        assert_eq!(quote_raw_from_sqrt_price_x96(sqrt, U256::from(5u64), false).unwrap(), U256::from(2u64));

        // off-grid price: floor(7 * s^2 / 2^192) computed exactly
        let sqrt = Q96 + U256::from(123_456_789u64);
        let exact = (U256::from(7u64) * sqrt * sqrt) >> 192;
        assert_eq!(quote_raw_from_sqrt_price_x96(sqrt, U256::from(7u64), true).unwrap(), exact);

        assert_eq!(
            quote_raw_from_sqrt_price_x96(U256::ZERO, U256::ONE, true),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn oversized_input_is_rejected() {
        let pool = ranged_pool(E18);
        let too_big = I256::MAX.into_raw() + U256::ONE;
        assert_eq!(
            quote_exact_input(&pool, true, too_big),
            Err(QuoteError::InvalidAmount(too_big.to_string()))
        );
    }

    #[test]
    fn simulated_quote_charges_fee() {
        let pool = ranged_pool(1_000 * E18);
        let amount_in = U256::from(E18);
        let quote = quote_exact_input(&pool, true, amount_in).unwrap();

        assert!(quote.is_simulated());
        assert_eq!(quote.amount_in, amount_in);
        // 0.3% fee plus a little price impact
        assert!(quote.amount_out < U256::from(E18 / 1000 * 997));
        assert!(quote.amount_out > U256::from(E18 / 1000 * 990));
    }

    #[test]
    fn partial_fill_falls_back_to_sqrt_price() {
        let pool = ranged_pool(E18);
        // far beyond what [-600, 600] holds
        let amount_in = U256::from(1_000 * E18);
        let quote = quote_exact_input(&pool, true, amount_in).unwrap();

        assert_eq!(quote.source, QuoteSource::SqrtPriceFallback);
        assert_eq!(quote.amount_out, amount_in);
    }

    #[test]
    fn failed_simulation_falls_back() {
        // no liquidity at all
        let pool = ranged_pool(E18).with_liquidity(0);
        let quote = quote_exact_input(&pool, false, U256::from(500u64)).unwrap();
        assert_eq!(quote.source, QuoteSource::SqrtPriceFallback);
        assert_eq!(quote.amount_out, U256::from(500u64));

        let uninitialized = PoolState::new(pool.key);
        assert!(quote_exact_input(&uninitialized, true, U256::from(1u64)).is_err());
    }

    #[test]
    fn fallback_matches_simulation_for_tiny_amounts() {
        let pool = ranged_pool(1_000_000 * E18)
            .with_sqrt_price(get_sqrt_price_at_tick(60).unwrap())
            .unwrap();
        let amount_in = U256::from(1_000_000u64);
        let simulated = quote_exact_input(&pool, true, amount_in).unwrap();
        let spot = quote_raw_from_sqrt_price_x96(pool.slot0.sqrt_price_x96, amount_in, true).unwrap();

        assert!(simulated.is_simulated());
        assert!(simulated.amount_out <= spot);
        // only the 0.3% fee separates them
        assert!(simulated.amount_out >= minimum_amount_out(spot, 31).unwrap());
    }

    #[test]
    fn slippage_bounds() {
        let amount = U256::from(1_000_000u64);
        assert_eq!(minimum_amount_out(amount, 50).unwrap(), U256::from(995_000u64));
        assert_eq!(minimum_amount_out(amount, 0).unwrap(), amount);
        assert_eq!(minimum_amount_out(amount, 20_000).unwrap(), U256::ZERO);
        assert_eq!(maximum_amount_in(amount, 50).unwrap(), U256::from(1_005_000u64));
        assert_eq!(maximum_amount_in(U256::from(1u64), 1).unwrap(), U256::from(2u64));
        assert!(maximum_amount_in(U256::MAX, 1).is_err());

        let quote = Quote {
            amount_in: amount,
            amount_out: amount,
            source: QuoteSource::Simulated,
        };
        assert_eq!(quote.minimum_amount_out(100).unwrap(), U256::from(990_000u64));
    }
}
