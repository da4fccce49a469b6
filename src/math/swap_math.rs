use crate::U256_E6;
use crate::error::Error;
use crate::math::math_helpers::{mul_div, mul_div_rounding_up};
use crate::math::sqrt_price_math::{
    get_amount_0_delta, get_amount_1_delta, get_next_sqrt_price_from_input,
    get_next_sqrt_price_from_output,
};
use alloy_primitives::{I256, U256};

/// Result of swapping within a single tick range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SwapStep {
    pub sqrt_price_next_x96: U256,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_amount: U256,
}

/// Computes one swap step from `sqrt_price_current_x96` towards
/// `sqrt_price_target_x96` without crossing it.
///
/// `amount_remaining` is positive for exact input and negative for exact
/// output. `fee_pips` is in hundredths of a basis point (3000 = 0.3%).
pub fn compute_swap_step(
    sqrt_price_current_x96: U256,
    sqrt_price_target_x96: U256,
    liquidity: u128,
    amount_remaining: I256,
    fee_pips: u32,
) -> Result<SwapStep, Error> {
    let zero_for_one = sqrt_price_current_x96 >= sqrt_price_target_x96;
    let exact_in = !amount_remaining.is_negative();
    let fee = U256::from(fee_pips);

    let mut amount_in = U256::ZERO;
    let mut amount_out = U256::ZERO;

    let sqrt_price_next_x96 = if exact_in {
        let remaining = amount_remaining.into_raw();
        let remaining_less_fee = mul_div(remaining, U256_E6 - fee, U256_E6)?;
        amount_in = if zero_for_one {
            get_amount_0_delta(sqrt_price_target_x96, sqrt_price_current_x96, liquidity, true)?
        } else {
            get_amount_1_delta(sqrt_price_current_x96, sqrt_price_target_x96, liquidity, true)?
        };
        if remaining_less_fee >= amount_in {
            sqrt_price_target_x96
        } else {
            get_next_sqrt_price_from_input(
                sqrt_price_current_x96,
                liquidity,
                remaining_less_fee,
                zero_for_one,
            )?
        }
    } else {
        let remaining = amount_remaining.unsigned_abs();
        amount_out = if zero_for_one {
            get_amount_1_delta(sqrt_price_target_x96, sqrt_price_current_x96, liquidity, false)?
        } else {
            get_amount_0_delta(sqrt_price_current_x96, sqrt_price_target_x96, liquidity, false)?
        };
        if remaining >= amount_out {
            sqrt_price_target_x96
        } else {
            get_next_sqrt_price_from_output(
                sqrt_price_current_x96,
                liquidity,
                remaining,
                zero_for_one,
            )?
        }
    };

    let reached_target = sqrt_price_target_x96 == sqrt_price_next_x96;

    if zero_for_one {
        if !(reached_target && exact_in) {
            amount_in =
                get_amount_0_delta(sqrt_price_next_x96, sqrt_price_current_x96, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            amount_out =
                get_amount_1_delta(sqrt_price_next_x96, sqrt_price_current_x96, liquidity, false)?;
        }
    } else {
        if !(reached_target && exact_in) {
            amount_in =
                get_amount_1_delta(sqrt_price_current_x96, sqrt_price_next_x96, liquidity, true)?;
        }
        if !(reached_target && !exact_in) {
            amount_out =
                get_amount_0_delta(sqrt_price_current_x96, sqrt_price_next_x96, liquidity, false)?;
        }
    }

    if !exact_in {
        let remaining = amount_remaining.unsigned_abs();
        if amount_out > remaining {
            amount_out = remaining;
        }
    }

    let fee_amount = if exact_in && sqrt_price_next_x96 != sqrt_price_target_x96 {
        // the whole remainder is consumed; what is not swapped is fee
        amount_remaining.into_raw() - amount_in
    } else {
        mul_div_rounding_up(amount_in, fee, U256_E6 - fee)?
    };

    Ok(SwapStep {
        sqrt_price_next_x96,
        amount_in,
        amount_out,
        fee_amount,
    })
}
