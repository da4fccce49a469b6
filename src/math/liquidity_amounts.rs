use crate::Q96;
use crate::RESOLUTION;
use crate::error::MathError;
use crate::math::math_helpers::mul_div;
use alloy_primitives::U256;

#[inline]
fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b { (b, a) } else { (a, b) }
}

#[inline]
fn to_u128(value: U256) -> Result<u128, MathError> {
    u128::try_from(value).map_err(|_| MathError::Overflow)
}

/// Liquidity provided by `amount0` of token0 over `[sqrt_a, sqrt_b]`:
/// `amount0 * (sqrtA * sqrtB) / (sqrtB - sqrtA)`.
pub fn get_liquidity_for_amount0(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: U256,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    let intermediate = mul_div(lower, upper, Q96)?;
    to_u128(mul_div(amount0, intermediate, upper - lower)?)
}

/// Liquidity provided by `amount1` of token1 over `[sqrt_a, sqrt_b]`:
/// `amount1 / (sqrtB - sqrtA)`.
pub fn get_liquidity_for_amount1(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount1: U256,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    to_u128(mul_div(amount1, Q96, upper - lower)?)
}

/// Maximum liquidity mintable from both amounts at the current price.
///
/// Below the range only token0 counts, above it only token1, and inside it
/// the smaller of the two single-sided liquidities wins.
pub fn get_liquidity_for_amounts(
    sqrt_price_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    amount0: U256,
    amount1: U256,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_price_x96 <= lower {
        get_liquidity_for_amount0(lower, upper, amount0)
    } else if sqrt_price_x96 < upper {
        let liquidity0 = get_liquidity_for_amount0(sqrt_price_x96, upper, amount0)?;
        let liquidity1 = get_liquidity_for_amount1(lower, sqrt_price_x96, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        get_liquidity_for_amount1(lower, upper, amount1)
    }
}

/// Token0 represented by `liquidity` over `[sqrt_a, sqrt_b]`, rounded down.
pub fn get_amount0_for_liquidity(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    if lower.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let numerator = U256::from(liquidity) << RESOLUTION;
    Ok(mul_div(numerator, upper - lower, upper)? / lower)
}

/// Token1 represented by `liquidity` over `[sqrt_a, sqrt_b]`, rounded down.
pub fn get_amount1_for_liquidity(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);
    mul_div(U256::from(liquidity), upper - lower, Q96)
}

/// Both token amounts represented by `liquidity` at the current price.
pub fn get_amounts_for_liquidity(
    sqrt_price_x96: U256,
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
) -> Result<(U256, U256), MathError> {
    let (lower, upper) = sorted(sqrt_ratio_a_x96, sqrt_ratio_b_x96);

    if sqrt_price_x96 <= lower {
        Ok((get_amount0_for_liquidity(lower, upper, liquidity)?, U256::ZERO))
    } else if sqrt_price_x96 < upper {
        Ok((
            get_amount0_for_liquidity(sqrt_price_x96, upper, liquidity)?,
            get_amount1_for_liquidity(lower, sqrt_price_x96, liquidity)?,
        ))
    } else {
        Ok((U256::ZERO, get_amount1_for_liquidity(lower, upper, liquidity)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::price_math::encode_sqrt_ratio_x96;
    use crate::math::tick_math::get_sqrt_price_at_tick;
    use proptest::prelude::*;

    fn price(reserve1: u64, reserve0: u64) -> U256 {
        encode_sqrt_ratio_x96(U256::from(reserve1), U256::from(reserve0)).unwrap()
    }

    fn range() -> (U256, U256) {
        (price(100, 110), price(110, 100))
    }

    #[test]
    fn liquidity_for_amounts_inside_range() {
        let (lower, upper) = range();
        let liquidity = get_liquidity_for_amounts(
            price(1, 1),
            lower,
            upper,
            U256::from(100),
            U256::from(200),
        )
        .unwrap();
        assert_eq!(liquidity, 2148);
    }

    #[test]
    fn liquidity_for_amounts_below_and_above_range() {
        let (lower, upper) = range();
        let below =
            get_liquidity_for_amounts(price(99, 110), lower, upper, U256::from(100), U256::from(200))
                .unwrap();
        assert_eq!(below, 1048);

        let above = get_liquidity_for_amounts(
            price(111, 100),
            lower,
            upper,
            U256::from(100),
            U256::from(200),
        )
        .unwrap();
        assert_eq!(above, 2097);
    }

    #[test]
    fn liquidity_for_amounts_on_the_bounds() {
        let (lower, upper) = range();
        let at_lower =
            get_liquidity_for_amounts(lower, lower, upper, U256::from(100), U256::from(200))
                .unwrap();
        assert_eq!(at_lower, 1048);
        let at_upper =
            get_liquidity_for_amounts(upper, lower, upper, U256::from(100), U256::from(200))
                .unwrap();
        assert_eq!(at_upper, 2097);
    }

    #[test]
    fn amounts_for_liquidity_by_branch() {
        let (lower, upper) = range();
        assert_eq!(
            get_amounts_for_liquidity(price(1, 1), lower, upper, 2148).unwrap(),
            (U256::from(99), U256::from(99))
        );
        assert_eq!(
            get_amounts_for_liquidity(price(99, 110), lower, upper, 1048).unwrap(),
            (U256::from(99), U256::ZERO)
        );
        assert_eq!(
            get_amounts_for_liquidity(price(111, 100), lower, upper, 2097).unwrap(),
            (U256::ZERO, U256::from(199))
        );
    }

    #[test]
    fn bound_order_does_not_matter() {
        let (lower, upper) = range();
        let amount = U256::from(1_000_000_000_000_000_000u128);
        assert_eq!(
            get_liquidity_for_amount0(lower, upper, amount).unwrap(),
            get_liquidity_for_amount0(upper, lower, amount).unwrap()
        );
        assert_eq!(
            get_liquidity_for_amount0(lower, upper, amount).unwrap(),
            10488088481701515469
        );
        assert_eq!(
            get_liquidity_for_amount1(lower, upper, amount).unwrap(),
            10488088481701515469
        );
    }

    #[test]
    fn equal_bounds_divide_by_zero() {
        let p = price(1, 1);
        assert_eq!(
            get_liquidity_for_amount0(p, p, U256::from(1)),
            Err(MathError::DivisionByZero)
        );
        assert_eq!(
            get_liquidity_for_amount1(p, p, U256::from(1)),
            Err(MathError::DivisionByZero)
        );
        assert_eq!(
            get_amount0_for_liquidity(U256::ZERO, p, 1),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn liquidity_beyond_u128_overflows() {
        let lower = price(1, 1);
        let upper = lower + U256::ONE;
        assert_eq!(
            get_liquidity_for_amount1(lower, upper, U256::from(u128::MAX)),
            Err(MathError::Overflow)
        );
    }

    proptest! {
        #[test]
        fn amount0_round_trip_never_exceeds_input(
            tick_a in -100_000i32..100_000,
            width in 1i32..50_000,
            amount in 1u64..u64::MAX,
        ) {
            let sqrt_a = get_sqrt_price_at_tick(tick_a).unwrap();
            let sqrt_b = get_sqrt_price_at_tick(tick_a + width).unwrap();
            let amount = U256::from(amount);

            if let Ok(liquidity) = get_liquidity_for_amount0(sqrt_a, sqrt_b, amount) {
                let back = get_amount0_for_liquidity(sqrt_a, sqrt_b, liquidity).unwrap();
                prop_assert!(back <= amount);
                // the lost part is worth less than one unit of liquidity
                let one = get_amount0_for_liquidity(sqrt_a, sqrt_b, 1).unwrap();
                prop_assert!(amount - back <= one + U256::from(2));
            }
        }

        #[test]
        fn amount1_round_trip_never_exceeds_input(
            tick_a in -100_000i32..100_000,
            width in 1i32..50_000,
            amount in 1u64..u64::MAX,
        ) {
            let sqrt_a = get_sqrt_price_at_tick(tick_a).unwrap();
            let sqrt_b = get_sqrt_price_at_tick(tick_a + width).unwrap();
            let amount = U256::from(amount);

            if let Ok(liquidity) = get_liquidity_for_amount1(sqrt_a, sqrt_b, amount) {
                let back = get_amount1_for_liquidity(sqrt_a, sqrt_b, liquidity).unwrap();
                prop_assert!(back <= amount);
                let one = get_amount1_for_liquidity(sqrt_a, sqrt_b, 1).unwrap();
                prop_assert!(amount - back <= one + U256::from(2));
            }
        }
    }
}
