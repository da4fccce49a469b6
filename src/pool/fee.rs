use crate::math::tick_math::MAX_TICK_SPACING;

/// Fee value marking a pool whose LP fee is set by its hook.
pub const DYNAMIC_FEE_FLAG: u32 = 0x800000;

/// Largest static LP fee, in hundredths of a bip (100%).
pub const MAX_LP_FEE: u32 = 1_000_000;

/// The standard fee tiers offered when creating a pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FeeTier {
    Lowest,
    Low,
    Medium,
    High,
}

impl FeeTier {
    pub const ALL: [FeeTier; 4] = [FeeTier::Lowest, FeeTier::Low, FeeTier::Medium, FeeTier::High];

    /// Fee in hundredths of a bip.
    pub const fn fee(self) -> u32 {
        match self {
            FeeTier::Lowest => 100,
            FeeTier::Low => 500,
            FeeTier::Medium => 3000,
            FeeTier::High => 10_000,
        }
    }

    pub fn tick_spacing(self) -> i32 {
        calculate_tick_spacing_from_fee_amount(self.fee())
    }

    pub fn from_fee(fee: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.fee() == fee)
    }
}

/// Default tick spacing for a static fee: `1` up to 0.01%, otherwise
/// `fee / 50` rounded half up, capped at the largest valid spacing.
pub fn calculate_tick_spacing_from_fee_amount(fee: u32) -> i32 {
    if fee <= 100 {
        return 1;
    }
    let spacing = (fee as u64 + 25) / 50;
    spacing.min(MAX_TICK_SPACING as u64) as i32
}

/// Renders a fee as a percentage, `3000 -> "0.3%"`.
pub fn fee_to_percent_string(fee: u32) -> String {
    if fee == DYNAMIC_FEE_FLAG {
        return "dynamic".to_string();
    }
    let whole = fee / 10_000;
    let fraction = fee % 10_000;
    if fraction == 0 {
        return format!("{whole}%");
    }
    let digits = format!("{fraction:04}");
    format!("{whole}.{}%", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn spacing_for_standard_tiers() {
        assert_eq!(calculate_tick_spacing_from_fee_amount(100), 1);
        assert_eq!(calculate_tick_spacing_from_fee_amount(500), 10);
        assert_eq!(calculate_tick_spacing_from_fee_amount(3000), 60);
        assert_eq!(calculate_tick_spacing_from_fee_amount(10_000), 200);
        assert_eq!(FeeTier::Medium.tick_spacing(), 60);
    }

    #[test]
    fn spacing_for_odd_fees() {
        assert_eq!(calculate_tick_spacing_from_fee_amount(0), 1);
        assert_eq!(calculate_tick_spacing_from_fee_amount(101), 2);
        assert_eq!(calculate_tick_spacing_from_fee_amount(125), 3);
        assert_eq!(calculate_tick_spacing_from_fee_amount(124), 2);
        assert_eq!(
            calculate_tick_spacing_from_fee_amount(DYNAMIC_FEE_FLAG),
            MAX_TICK_SPACING
        );
    }

    #[test]
    fn tiers_from_fee() {
        assert_eq!(FeeTier::from_fee(500), Some(FeeTier::Low));
        assert_eq!(FeeTier::from_fee(501), None);
    }

    #[test]
    fn percent_strings() {
        assert_eq!(fee_to_percent_string(3000), "0.3%");
        assert_eq!(fee_to_percent_string(100), "0.01%");
        assert_eq!(fee_to_percent_string(500), "0.05%");
        assert_eq!(fee_to_percent_string(10_000), "1%");
        assert_eq!(fee_to_percent_string(12_345), "1.2345%");
        assert_eq!(fee_to_percent_string(0), "0%");
        assert_eq!(fee_to_percent_string(DYNAMIC_FEE_FLAG), "dynamic");
    }

    proptest! {
        #[test]
        fn spacing_is_positive_and_monotonic(fee in 0u32..2_000_000) {
            let here = calculate_tick_spacing_from_fee_amount(fee);
            let next = calculate_tick_spacing_from_fee_amount(fee + 1);
            prop_assert!(here >= 1);
            prop_assert!(next >= here);
        }
    }
}
