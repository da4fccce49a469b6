use crate::error::{Error, SwapError};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::mul_div;
use crate::math::sqrt_price_math::{get_amount_0_delta, get_amount_1_delta};
use crate::math::swap_math::compute_swap_step;
use crate::math::tick_bitmap::next_initialized_tick_within_one_word;
use crate::math::tick_math::{
    MAX_SQRT_PRICE, MAX_TICK, MIN_SQRT_PRICE, MIN_TICK, get_sqrt_price_at_tick,
    get_tick_at_sqrt_price,
};
use crate::pool::state::PoolState;
use crate::{U256_E4, U256_E6};
use alloy_primitives::{I256, U256};

/// Computes a sqrt-price limit for a swap given the current price, swap
/// direction, and a slippage tolerance in basis points.
///
/// The result is clamped strictly inside `(MIN_SQRT_PRICE, MAX_SQRT_PRICE)`
/// so it is always a valid limit for [`PoolState::swap`].
pub fn calculate_sqrt_price_limit(sqrt_price_x96: U256, zero_for_one: bool, slippage_bps: u32) -> U256 {
    let bps = U256::from(slippage_bps);

    if zero_for_one {
        let limit = sqrt_price_x96.saturating_mul(U256_E4.saturating_sub(bps)) / U256_E4;
        limit.max(MIN_SQRT_PRICE + U256::ONE)
    } else {
        let limit = sqrt_price_x96.saturating_mul(U256_E4 + bps) / U256_E4;
        limit.min(MAX_SQRT_PRICE - U256::ONE)
    }
}

/// Sqrt-price limit that lets a swap run to the end of the price range.
pub fn unbounded_sqrt_price_limit(zero_for_one: bool) -> U256 {
    if zero_for_one {
        MIN_SQRT_PRICE + U256::ONE
    } else {
        MAX_SQRT_PRICE - U256::ONE
    }
}

#[derive(Copy, Clone, Debug)]
pub struct SwapParams {
    /// Swap direction: `true` for token0 → token1, `false` for token1 → token0.
    pub zero_for_one: bool,
    /// Signed amount being swapped. Positive means “exact in”, negative means “exact out”.
    pub amount_specified: I256,
    /// Sqrt-price limit in Q96 that bounds how far the price is allowed to move.
    ///
    /// Use [`calculate_sqrt_price_limit`] to derive this from a slippage tolerance.
    pub sqrt_price_limit_x96: U256,
}

impl SwapParams {
    #[inline]
    pub fn new(zero_for_one: bool, amount_specified: I256, sqrt_price_limit_x96: U256) -> Self {
        Self {
            zero_for_one,
            amount_specified,
            sqrt_price_limit_x96,
        }
    }

    /// Exact-input swap of `amount_in` with no price limit. Amounts above
    /// `I256::MAX` saturate so the sign never flips to exact output.
    pub fn exact_input(zero_for_one: bool, amount_in: U256) -> Self {
        let amount_specified = if amount_in > I256::MAX.into_raw() {
            I256::MAX
        } else {
            I256::from_raw(amount_in)
        };
        Self::new(
            zero_for_one,
            amount_specified,
            unbounded_sqrt_price_limit(zero_for_one),
        )
    }
}

/// Outcome of a simulated swap, from the pool's point of view: positive
/// deltas are paid into the pool, negative deltas are paid out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapResult {
    pub amount0_delta: I256,
    pub amount1_delta: I256,
    pub fees_paid: U256,
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub liquidity: u128,
    /// Part of the specified amount the pool could not fill before hitting
    /// the price limit.
    pub amount_remaining: I256,
}

impl SwapResult {
    pub fn is_partial(&self) -> bool {
        !self.amount_remaining.is_zero()
    }
}

// the top level state of the swap, the results of which are recorded in storage at the end
#[derive(Default)]
struct SwapState {
    // the amount remaining to be swapped in/out of the input/output asset
    amount_specified_remaining: I256,
    // the amount already swapped out/in of the output/input asset
    amount_calculated: I256,
    // current sqrt(price)
    sqrt_price_x96: U256,
    // the tick associated with the current price
    tick: i32,
    // the current liquidity in range
    liquidity: u128,
    // accumulated swap fees
    swap_fee: U256,
}

#[derive(Default)]
struct StepComputations {
    // the price at the beginning of the step
    sqrt_price_start_x96: U256,
    // the next tick to swap to from the current tick in the swap direction
    tick_next: i32,
    // whether tickNext is initialized or not
    initialized: bool,
    // sqrt(price) for the next tick (1/0)
    sqrt_price_next_x96: U256,
}

impl PoolState {
    /// Executes a concentrated-liquidity swap against the in-memory state
    /// using the provided `SwapParams`, returning signed token deltas and
    /// total fees charged. The snapshot itself is left untouched.
    pub fn swap(&self, params: SwapParams) -> Result<SwapResult, Error> {
        let amount_specified = params.amount_specified;
        if amount_specified.is_zero() {
            return Err(SwapError::AmountSpecifiedIsZero.into());
        }
        if !self.is_initialized() {
            return Err(SwapError::PoolNotInitialized.into());
        }
        if self.liquidity == 0 {
            return Err(SwapError::LiquidityIsZero.into());
        }

        let zero_for_one = params.zero_for_one;
        let sqrt_price_limit_x96 = params.sqrt_price_limit_x96;
        if zero_for_one {
            if sqrt_price_limit_x96 >= self.slot0.sqrt_price_x96
                || sqrt_price_limit_x96 <= MIN_SQRT_PRICE
            {
                return Err(SwapError::SqrtPriceOutOfBounds.into());
            }
        } else if sqrt_price_limit_x96 <= self.slot0.sqrt_price_x96
            || sqrt_price_limit_x96 >= MAX_SQRT_PRICE
        {
            return Err(SwapError::SqrtPriceOutOfBounds.into());
        }

        let exact_input = amount_specified.is_positive();
        let fee_pips = self.fee_pips();

        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: I256::ZERO,
            sqrt_price_x96: self.slot0.sqrt_price_x96,
            tick: self.slot0.tick,
            liquidity: self.liquidity,
            swap_fee: U256::ZERO,
        };

        while !state.amount_specified_remaining.is_zero()
            && state.sqrt_price_x96 != sqrt_price_limit_x96
        {
            let mut step = StepComputations {
                sqrt_price_start_x96: state.sqrt_price_x96,
                ..Default::default()
            };

            (step.tick_next, step.initialized) = next_initialized_tick_within_one_word(
                &self.bitmap,
                state.tick,
                self.tick_spacing(),
                zero_for_one,
            )?;

            step.tick_next = step.tick_next.clamp(MIN_TICK, MAX_TICK);

            step.sqrt_price_next_x96 = get_sqrt_price_at_tick(step.tick_next)?;

            let target = if zero_for_one {
                step.sqrt_price_next_x96.max(sqrt_price_limit_x96)
            } else {
                step.sqrt_price_next_x96.min(sqrt_price_limit_x96)
            };

            let computed = compute_swap_step(
                state.sqrt_price_x96,
                target,
                state.liquidity,
                state.amount_specified_remaining,
                fee_pips,
            )?;
            state.sqrt_price_x96 = computed.sqrt_price_next_x96;
            state.swap_fee += computed.fee_amount;

            if exact_input {
                state.amount_specified_remaining -=
                    I256::from_raw(computed.amount_in + computed.fee_amount);
                state.amount_calculated -= I256::from_raw(computed.amount_out);
            } else {
                state.amount_specified_remaining += I256::from_raw(computed.amount_out);
                state.amount_calculated +=
                    I256::from_raw(computed.amount_in + computed.fee_amount);
            }

            if state.sqrt_price_x96 == step.sqrt_price_next_x96 {
                if step.initialized {
                    let Some(mut liquidity_net) = self.get_liquidity_net(&step.tick_next) else {
                        return Err(SwapError::LiquidityIsZero.into());
                    };
                    if zero_for_one {
                        liquidity_net = -liquidity_net;
                    }
                    state.liquidity = add_delta(state.liquidity, liquidity_net)?;
                }
                state.tick = if zero_for_one {
                    step.tick_next - 1
                } else {
                    step.tick_next
                };
            } else if state.sqrt_price_x96 != step.sqrt_price_start_x96 {
                state.tick = get_tick_at_sqrt_price(state.sqrt_price_x96)?;
            }
        }

        let (amount0, amount1) = if zero_for_one == exact_input {
            (
                amount_specified - state.amount_specified_remaining,
                state.amount_calculated,
            )
        } else {
            (
                state.amount_calculated,
                amount_specified - state.amount_specified_remaining,
            )
        };

        Ok(SwapResult {
            amount0_delta: amount0,
            amount1_delta: amount1,
            fees_paid: state.swap_fee,
            sqrt_price_x96: state.sqrt_price_x96,
            tick: state.tick,
            liquidity: state.liquidity,
            amount_remaining: state.amount_specified_remaining,
        })
    }

    /// Returns the maximum input amount that can be swapped in the given
    /// direction before the pool exhausts all usable liquidity or reaches
    /// global tick bounds.
    ///
    /// The value is denominated in the input token for the chosen direction
    /// and includes the pool's fee.
    pub fn max_input_amount(&self, zero_for_one: bool) -> Result<U256, Error> {
        let mut state = SwapState {
            sqrt_price_x96: self.slot0.sqrt_price_x96,
            tick: self.slot0.tick,
            liquidity: self.liquidity,
            ..Default::default()
        };

        let mut max_token_amount = U256::ZERO;

        while state.tick > MIN_TICK && state.tick < MAX_TICK && state.liquidity != 0 {
            let (tick_next, initialized) = next_initialized_tick_within_one_word(
                &self.bitmap,
                state.tick,
                self.tick_spacing(),
                zero_for_one,
            )?;
            let tick_next = tick_next.clamp(MIN_TICK, MAX_TICK);
            let sqrt_price_next_x96 = get_sqrt_price_at_tick(tick_next)?;

            let step_amount = if zero_for_one {
                get_amount_0_delta(sqrt_price_next_x96, state.sqrt_price_x96, state.liquidity, true)?
            } else {
                get_amount_1_delta(state.sqrt_price_x96, sqrt_price_next_x96, state.liquidity, true)?
            };
            max_token_amount = max_token_amount.saturating_add(step_amount);

            state.sqrt_price_x96 = sqrt_price_next_x96;

            if initialized {
                let Some(mut liquidity_net) = self.get_liquidity_net(&tick_next) else {
                    return Err(SwapError::LiquidityIsZero.into());
                };
                if zero_for_one {
                    liquidity_net = -liquidity_net;
                }
                state.liquidity = add_delta(state.liquidity, liquidity_net)?;
            }
            state.tick = if zero_for_one { tick_next - 1 } else { tick_next };
        }

        Ok(mul_div(
            max_token_amount,
            U256_E6,
            U256::from(1_000_000u32.saturating_sub(self.fee_pips()).max(1)),
        )
        .unwrap_or(U256::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::key::PoolKey;
    use crate::pool::state::{Slot0, TickInfo};
    use alloy_primitives::{Address, address};
    use std::str::FromStr;

    fn make_basic_pool(sqrt_price_x96: U256, tick: i32, liquidity: u128, tick_spacing: i32) -> PoolState {
        let key = PoolKey::new(
            address!("0x0000000000000000000000000000000000000001"),
            address!("0x0000000000000000000000000000000000000002"),
            3000,
            tick_spacing,
            Address::ZERO,
        )
        .unwrap();

        PoolState::new(key)
            .with_slot0(Slot0 {
                sqrt_price_x96,
                tick,
                protocol_fee: 0,
                lp_fee: 3000,
            })
            .with_liquidity(liquidity)
    }

    fn exact_in(amount: u64) -> I256 {
        I256::from_raw(U256::from(amount))
    }

    // ---------------- Basic validation tests ----------------

    #[test]
    fn swap_rejects_zero_amount_specified() {
        let sqrt_price = get_sqrt_price_at_tick(0).unwrap();
        let pool = make_basic_pool(sqrt_price, 0, 1_000_000, 1);

        let err = pool
            .swap(SwapParams::new(true, I256::ZERO, sqrt_price - U256::ONE))
            .unwrap_err();
        assert!(matches!(err, Error::SwapError(SwapError::AmountSpecifiedIsZero)));
    }

    #[test]
    fn swap_rejects_uninitialized_pool() {
        let pool = make_basic_pool(U256::ZERO, 0, 1_000_000, 1);
        let err = pool.swap(SwapParams::exact_input(true, U256::from(10))).unwrap_err();
        assert!(matches!(err, Error::SwapError(SwapError::PoolNotInitialized)));
    }

    #[test]
    fn swap_rejects_sqrt_price_limit_out_of_bounds_zero_for_one() {
        let sqrt_price = get_sqrt_price_at_tick(0).unwrap();
        let pool = make_basic_pool(sqrt_price, 0, 1_000_000, 1);

        // limit >= current price
        let err = pool
            .swap(SwapParams::new(true, exact_in(1_000), sqrt_price))
            .unwrap_err();
        assert!(matches!(err, Error::SwapError(SwapError::SqrtPriceOutOfBounds)));

        // limit <= MIN_SQRT_PRICE
        let err = pool
            .swap(SwapParams::new(true, exact_in(1_000), MIN_SQRT_PRICE))
            .unwrap_err();
        assert!(matches!(err, Error::SwapError(SwapError::SqrtPriceOutOfBounds)));
    }

    #[test]
    fn swap_rejects_sqrt_price_limit_out_of_bounds_one_for_zero() {
        let sqrt_price = get_sqrt_price_at_tick(0).unwrap();
        let pool = make_basic_pool(sqrt_price, 0, 1_000_000, 1);

        let err = pool
            .swap(SwapParams::new(false, exact_in(1_000), sqrt_price))
            .unwrap_err();
        assert!(matches!(err, Error::SwapError(SwapError::SqrtPriceOutOfBounds)));

        let err = pool
            .swap(SwapParams::new(false, exact_in(1_000), MAX_SQRT_PRICE))
            .unwrap_err();
        assert!(matches!(err, Error::SwapError(SwapError::SqrtPriceOutOfBounds)));
    }

    #[test]
    fn swap_with_zero_liquidity_is_rejected() {
        let sqrt_price = get_sqrt_price_at_tick(0).unwrap();
        let pool = make_basic_pool(sqrt_price, 0, 0, 1);

        let result = pool.swap(SwapParams::new(true, exact_in(1_000_000), sqrt_price - U256::ONE));
        assert!(matches!(result, Err(Error::SwapError(SwapError::LiquidityIsZero))));
    }

    #[test]
    fn price_limit_from_slippage() {
        let sqrt_price = crate::Q96;
        assert_eq!(
            calculate_sqrt_price_limit(sqrt_price, true, 50),
            sqrt_price * U256::from(9950u64) / U256_E4
        );
        assert_eq!(
            calculate_sqrt_price_limit(sqrt_price, false, 50),
            sqrt_price * U256::from(10050u64) / U256_E4
        );
        // below the range the limit is clamped, not scaled
        assert_eq!(
            calculate_sqrt_price_limit(U256::from(1_000_000u64), true, 50),
            MIN_SQRT_PRICE + U256::ONE
        );
        // never outside the valid range
        assert_eq!(
            calculate_sqrt_price_limit(MIN_SQRT_PRICE, true, 10_000),
            MIN_SQRT_PRICE + U256::ONE
        );
        assert_eq!(
            calculate_sqrt_price_limit(MAX_SQRT_PRICE - U256::ONE, false, 100),
            MAX_SQRT_PRICE - U256::ONE
        );
    }

    #[test]
    fn exact_input_never_turns_into_exact_output() {
        let params = SwapParams::exact_input(true, U256::MAX);
        assert_eq!(params.amount_specified, I256::MAX);
        assert!(!params.amount_specified.is_negative());

        let params = SwapParams::exact_input(false, U256::from(42u64));
        assert_eq!(params.amount_specified, exact_in(42));
    }

    // ---------------- Behavioural / invariants tests ----------------

    #[test]
    fn swap_exact_input_one_for_zero_has_expected_signs() {
        let sqrt_price = get_sqrt_price_at_tick(0).unwrap();
        let pool = make_basic_pool(sqrt_price, 0, 1_000_000_000_000_000_000, 1);

        let limit = sqrt_price * U256::from(2u8);
        let result = pool
            .swap(SwapParams::new(false, exact_in(1_000_000), limit))
            .unwrap();

        assert!(result.amount1_delta > I256::ZERO);
        assert!(result.amount0_delta < I256::ZERO);
        assert!(result.fees_paid > U256::ZERO);
        assert!(result.sqrt_price_x96 > sqrt_price);
        assert!(!result.is_partial());
    }

    #[test]
    fn swap_exact_output_zero_for_one() {
        let sqrt_price = get_sqrt_price_at_tick(0).unwrap();
        let pool = make_basic_pool(sqrt_price, 0, 1_000_000_000_000_000_000, 1);

        let wanted = U256::from(1_000_000u64);
        let result = pool
            .swap(SwapParams::new(
                true,
                -I256::from_raw(wanted),
                unbounded_sqrt_price_limit(true),
            ))
            .unwrap();

        assert_eq!(result.amount1_delta, -I256::from_raw(wanted));
        assert!(result.amount0_delta > I256::from_raw(wanted));
        assert!(result.tick < 0);
    }

    fn build_real_example_pool() -> PoolState {
        make_basic_pool(
            U256::from_str("1046706758115479018135889").unwrap(),
            -224701,
            203624297715738503472,
            60,
        )
        .with_ticks([
            (
                -224700,
                TickInfo {
                    liquidity_gross: 203624287356963452704,
                    liquidity_net: -203624287356963452704,
                },
            ),
            (
                887220,
                TickInfo {
                    liquidity_gross: 10358775050768,
                    liquidity_net: -10358775050768,
                },
            ),
        ])
        .unwrap()
    }

    #[test]
    fn real_pool_bitmap_matches_chain() {
        let pool = build_real_example_pool();
        assert_eq!(
            pool.bitmap[&-15],
            U256::from_str("39614081257132168796771975168").unwrap()
        );
        assert_eq!(
            pool.bitmap[&57],
            U256::from_str("50216813883093446110686315385661331328818843555712276103168").unwrap()
        );
    }

    #[test]
    fn swap_matches_onchain_single_case() {
        let pool = build_real_example_pool();

        let zero_for_one = false;
        let sqrt_price_limit_x96 =
            calculate_sqrt_price_limit(pool.slot0.sqrt_price_x96, zero_for_one, 5_000);

        let result = pool
            .swap(SwapParams::new(zero_for_one, exact_in(1_098_120), sqrt_price_limit_x96))
            .unwrap();

        assert_eq!(result.amount0_delta, -I256::from_raw(U256::from(6222896066140743u64)));
        assert_eq!(result.amount1_delta, exact_in(1_098_120));
        assert_eq!(result.fees_paid, U256::from(3296u64));
        assert_eq!(
            result.sqrt_price_x96,
            U256::from_str("1055080413701515132449498").unwrap()
        );
        assert_eq!(result.tick, -224541);
        // crossed -224700 on the way up
        assert_eq!(result.liquidity, 10358775050768);
        assert!(!result.is_partial());
    }

    #[test]
    fn tight_limit_leaves_input_unfilled() {
        let pool = build_real_example_pool();
        let limit = calculate_sqrt_price_limit(pool.slot0.sqrt_price_x96, false, 50);

        let result = pool
            .swap(SwapParams::new(false, exact_in(1_098_120), limit))
            .unwrap();

        assert_eq!(result.sqrt_price_x96, limit);
        assert_eq!(result.amount1_delta, exact_in(686_326));
        assert_eq!(result.amount0_delta, -I256::from_raw(U256::from(3900919522440934u64)));
        assert_eq!(result.fees_paid, U256::from(2060u64));
        assert_eq!(result.amount_remaining, exact_in(1_098_120 - 686_326));
        assert!(result.is_partial());
    }

    #[test]
    fn max_input_amount_matches_full_swap() {
        let pool = build_real_example_pool();
        let zero_for_one = false;

        let max_token_amount = pool.max_input_amount(zero_for_one).unwrap();

        let swap_result = pool
            .swap(SwapParams::new(
                zero_for_one,
                I256::MAX,
                unbounded_sqrt_price_limit(zero_for_one),
            ))
            .unwrap();

        assert!(
            swap_result
                .amount1_delta
                .into_raw()
                .abs_diff(max_token_amount)
                <= U256::from(150u64),
        );
    }
}
