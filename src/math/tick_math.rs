use crate::U256_128;
use crate::error::StateError;
use alloy_primitives::{I256, U256};

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = -MIN_TICK;

pub const MIN_SQRT_PRICE: U256 = U256::from_limbs([4295128739, 0, 0, 0]);
pub const MAX_SQRT_PRICE: U256 =
    U256::from_limbs([6743328256752651558, 17280870778742802505, 4294805859, 0]);

pub const MIN_TICK_SPACING: i32 = 1;
pub const MAX_TICK_SPACING: i32 = i16::MAX as i32;

const SQRT_10001: I256 = I256::from_raw(U256::from_limbs([11745905768312294533, 13863, 0, 0]));
const TICK_LOW: I256 = I256::from_raw(U256::from_limbs([
    6552757943157144234,
    184476617836266586,
    0,
    0,
]));
const TICK_HIGH: I256 = I256::from_raw(U256::from_limbs([
    4998474450511881007,
    15793544031827761793,
    0,
    0,
]));

/// Returns the sqrt price (Q64.96) at `tick`, i.e. `sqrt(1.0001^tick) * 2^96`,
/// or `StateError::TickOutOfBounds` outside `[MIN_TICK, MAX_TICK]`.
///
/// The ratio is accumulated in Q128.128 by multiplying one precomputed
/// factor per set bit of `|tick|`, inverted for positive ticks, then
/// shifted down to Q96 rounding up.
pub fn get_sqrt_price_at_tick(tick: i32) -> Result<U256, StateError> {
    let abs_tick = tick.unsigned_abs();

    if abs_tick > MAX_TICK as u32 {
        return Err(StateError::TickOutOfBounds);
    }

    let mut ratio = if abs_tick & 1 != 0 {
        U256::from_limbs([12262481743371124737, 18445821805675392311, 0, 0])
    } else {
        U256::from_limbs([0, 0, 1, 0])
    };

    macro_rules! apply_multiplier {
        ($bit:expr, $l0:expr, $l1:expr) => {
            if abs_tick & $bit != 0 {
                ratio = ratio.wrapping_mul(U256::from_limbs([$l0, $l1, 0, 0])) >> 128;
            }
        };
    }

    apply_multiplier!(0x2, 6459403834229662010, 18444899583751176498);
    apply_multiplier!(0x4, 17226890335427755468, 18443055278223354162);
    apply_multiplier!(0x8, 2032852871939366096, 18439367220385604838);
    apply_multiplier!(0x10, 14545316742740207172, 18431993317065449817);
    apply_multiplier!(0x20, 5129152022828963008, 18417254355718160513);
    apply_multiplier!(0x40, 4894419605888772193, 18387811781193591352);
    apply_multiplier!(0x80, 1280255884321894483, 18329067761203520168);
    apply_multiplier!(0x100, 15924666964335305636, 18212142134806087854);
    apply_multiplier!(0x200, 8010504389359918676, 17980523815641551639);
    apply_multiplier!(0x400, 10668036004952895731, 17526086738831147013);
    apply_multiplier!(0x800, 4878133418470705625, 16651378430235024244);
    apply_multiplier!(0x1000, 9537173718739605541, 15030750278693429944);
    apply_multiplier!(0x2000, 9972618978014552549, 12247334978882834399);
    apply_multiplier!(0x4000, 10428997489610666743, 8131365268884726200);
    apply_multiplier!(0x8000, 9305304367709015974, 3584323654723342297);
    apply_multiplier!(0x10000, 14301143598189091785, 696457651847595233);
    apply_multiplier!(0x20000, 7393154844743099908, 26294789957452057);
    apply_multiplier!(0x40000, 2209338891292245656, 37481735321082);
    apply_multiplier!(0x80000, 10518117631919034274, 76158723);

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    let round_up = (ratio.as_limbs()[0] & 0xFFFF_FFFF) != 0;
    Ok((ratio >> 32) + U256::from(round_up as u64))
}

/// Position of the most significant bit, with `r` shifted down by it.
#[inline]
fn most_significant_bit_shifted(mut r: U256) -> u32 {
    let mut msb: u32 = 0;
    for shift in [128usize, 64, 32, 16, 8, 4, 2, 1] {
        if r >= (U256::ONE << shift) {
            msb |= shift as u32;
            r >>= shift;
        }
    }
    msb
}

/// Returns the greatest tick whose sqrt price is `<= sqrt_price_x96`.
///
/// Valid inputs are `[MIN_SQRT_PRICE, MAX_SQRT_PRICE)`; anything else is
/// `StateError::SqrtPriceOutOfBounds`.
pub fn get_tick_at_sqrt_price(sqrt_price_x96: U256) -> Result<i32, StateError> {
    if sqrt_price_x96 < MIN_SQRT_PRICE || sqrt_price_x96 >= MAX_SQRT_PRICE {
        return Err(StateError::SqrtPriceOutOfBounds);
    }

    let ratio = sqrt_price_x96 << 32;
    let msb = most_significant_bit_shifted(ratio);

    let mut r = if msb >= 128 {
        ratio >> (msb - 127) as usize
    } else {
        ratio << (127 - msb) as usize
    };

    let mut log_2: I256 = (I256::from_raw(U256::from(msb)) - I256::from_raw(U256_128)) << 64;

    // 14 bits of fractional log2 are enough to pin the tick
    for shift in (50..=63usize).rev() {
        r = r.wrapping_mul(r) >> 127;
        let f: U256 = r >> 128;
        log_2 |= I256::from_raw(f << shift);
        r >>= f.to::<usize>();
    }

    let log_sqrt10001 = log_2.wrapping_mul(SQRT_10001);
    let tick_low = (log_sqrt10001 - TICK_LOW).asr(128).low_i32();
    let tick_high = (log_sqrt10001 + TICK_HIGH).asr(128).low_i32();

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_price_at_tick(tick_high)? <= sqrt_price_x96 {
        tick_high
    } else {
        tick_low
    })
}

/// Lowest tick that is a multiple of `tick_spacing`.
pub fn min_usable_tick(tick_spacing: i32) -> Result<i32, StateError> {
    Ok(-max_usable_tick(tick_spacing)?)
}

/// Highest tick that is a multiple of `tick_spacing`.
pub fn max_usable_tick(tick_spacing: i32) -> Result<i32, StateError> {
    if tick_spacing < MIN_TICK_SPACING {
        return Err(StateError::InvalidTickSpacing(tick_spacing));
    }
    Ok((MAX_TICK / tick_spacing) * tick_spacing)
}

/// Rounds `tick` to the nearest multiple of `tick_spacing` (halves round
/// towards positive infinity), clamped to the usable range.
pub fn nearest_usable_tick(tick: i32, tick_spacing: i32) -> Result<i32, StateError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(StateError::TickOutOfBounds);
    }
    let max = max_usable_tick(tick_spacing)?;

    let quotient = tick.div_euclid(tick_spacing);
    let remainder = tick.rem_euclid(tick_spacing);
    let rounded = if remainder * 2 >= tick_spacing {
        (quotient + 1) * tick_spacing
    } else {
        quotient * tick_spacing
    };

    Ok(rounded.clamp(-max, max))
}
