use crate::FastMap;
use crate::U256_1;
use crate::error::{Error, StateError};
use crate::math::bit_math::{least_significant_bit, most_significant_bit};
use alloy_primitives::U256;

/// Maps a compressed tick (tick / spacing) to its `(word, bit)` position in
/// the sparse tick bitmap.
pub fn position(compressed: i32) -> (i16, u8) {
    ((compressed >> 8) as i16, (compressed & 0xff) as u8)
}

/// Returns the bitmap word stored at `word`, or zero if absent.
pub fn get_word(bitmap: &FastMap<i16, U256>, word: i16) -> U256 {
    bitmap.get(&word).copied().unwrap_or(U256::ZERO)
}

/// Toggles the initialized flag of `tick`, which must be a multiple of
/// `tick_spacing`.
pub fn flip_tick(
    bitmap: &mut FastMap<i16, U256>,
    tick: i32,
    tick_spacing: i32,
) -> Result<(), StateError> {
    if tick_spacing <= 0 {
        return Err(StateError::InvalidTickSpacing(tick_spacing));
    }
    if tick % tick_spacing != 0 {
        return Err(StateError::TickNotAligned { tick, tick_spacing });
    }

    let (word_pos, bit_pos) = position(tick / tick_spacing);
    let word = get_word(bitmap, word_pos) ^ (U256_1 << bit_pos);
    if word.is_zero() {
        bitmap.remove(&word_pos);
    } else {
        bitmap.insert(word_pos, word);
    }
    Ok(())
}

/// Searches the bitmap word containing `tick` for the next initialized tick
/// at or below it (`lte`) or strictly above it.
///
/// Returns the candidate tick and whether it is actually initialized; an
/// uninitialized result is the word boundary the caller should step to.
pub fn next_initialized_tick_within_one_word(
    bitmap: &FastMap<i16, U256>,
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> Result<(i32, bool), Error> {
    let mut compressed: i32 = tick / tick_spacing;
    if tick < 0 && tick % tick_spacing != 0 {
        compressed -= 1;
    }

    if lte {
        let (word_pos, bit_pos) = position(compressed);
        // all bits at or to the right of bit_pos
        let mask: U256 = (U256_1 << bit_pos) - U256_1 + (U256_1 << bit_pos);
        let masked = get_word(bitmap, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            (compressed - (bit_pos - most_significant_bit(masked)?) as i32) * tick_spacing
        } else {
            (compressed - bit_pos as i32) * tick_spacing
        };
        Ok((next, initialized))
    } else {
        let (word_pos, bit_pos) = position(compressed + 1);
        // all bits at or to the left of bit_pos
        let mask: U256 = !((U256_1 << bit_pos) - U256_1);
        let masked = get_word(bitmap, word_pos) & mask;

        let initialized = !masked.is_zero();
        let next = if initialized {
            (compressed + 1 + (least_significant_bit(masked)? - bit_pos) as i32) * tick_spacing
        } else {
            (compressed + 1 + (u8::MAX - bit_pos) as i32) * tick_spacing
        };
        Ok((next, initialized))
    }
}
