use crate::error::MathError;
use alloy_primitives::U256;

/// Index (0–255) of the most significant set bit of a bitmap word.
///
/// Used when scanning a tick bitmap word leftwards (towards lower ticks).
pub fn most_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok((255 - x.leading_zeros()) as u8)
}

/// Index (0–255) of the least significant set bit of a bitmap word.
///
/// Used when scanning a tick bitmap word rightwards (towards higher ticks).
pub fn least_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::ZeroValue);
    }
    Ok(x.trailing_zeros() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_word_has_no_set_bits() {
        assert!(matches!(
            most_significant_bit(U256::ZERO),
            Err(MathError::ZeroValue)
        ));
        assert!(matches!(
            least_significant_bit(U256::ZERO),
            Err(MathError::ZeroValue)
        ));
    }

    #[test]
    fn single_bit_words() {
        for bit in [0usize, 7, 64, 128, 255] {
            let x = U256::ONE << bit;
            assert_eq!(most_significant_bit(x).unwrap() as usize, bit);
            assert_eq!(least_significant_bit(x).unwrap() as usize, bit);
        }
    }

    #[test]
    fn mixed_bit_words() {
        // 0b10_1100_1000: msb 9, lsb 3
        let x = U256::from(0b10_1100_1000u64);
        assert_eq!(most_significant_bit(x).unwrap(), 9);
        assert_eq!(least_significant_bit(x).unwrap(), 3);

        assert_eq!(most_significant_bit(U256::MAX).unwrap(), 255);
        assert_eq!(least_significant_bit(U256::MAX).unwrap(), 0);
    }
}
