use crate::FastMap;
use crate::error::StateError;
use crate::math::tick_bitmap::flip_tick;
use crate::math::tick_math::{MAX_TICK, MIN_TICK, get_tick_at_sqrt_price};
use crate::pool::key::PoolKey;
use alloy_primitives::{B256, U256};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    pub protocol_fee: u32,
    pub lp_fee: u32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickInfo {
    pub liquidity_gross: u128,
    pub liquidity_net: i128,
}

/// In-memory snapshot of a pool, enough to simulate swaps locally.
///
/// Built empty from a key and then populated from the indexer or from
/// on-chain reads. The snapshot is never written back anywhere.
#[derive(Clone, Debug)]
pub struct PoolState {
    pub key: PoolKey,
    pub pool_id: B256,
    pub slot0: Slot0,
    pub liquidity: u128,
    pub bitmap: FastMap<i16, U256>,
    pub ticks: FastMap<i32, TickInfo>,
}

/// Computes the inclusive range of bitmap word indices that should be
/// scanned for initialized ticks around a current tick and spacing.
///
/// Use this before fetching bitmap words to limit reads to the words a
/// swap in the given direction can touch.
pub fn generate_search_range(current_tick: i32, tick_spacing: i32, zero_for_one: bool) -> Vec<i16> {
    let min_word: i16;
    let max_word: i16;

    let mut compressed = current_tick / tick_spacing;
    if current_tick < 0 && (current_tick % tick_spacing) != 0 {
        compressed -= 1;
    }

    if zero_for_one {
        let mut min_compressed = MIN_TICK / tick_spacing;
        if MIN_TICK % tick_spacing != 0 {
            min_compressed -= 1;
        }
        min_word = (min_compressed >> 8) as i16;
        max_word = (compressed >> 8) as i16;
    } else {
        min_word = (compressed >> 8) as i16;
        max_word = ((MAX_TICK / tick_spacing) >> 8) as i16;
    }

    (min_word..=max_word).collect()
}

impl PoolState {
    /// An uninitialized snapshot for `key`.
    pub fn new(key: PoolKey) -> Self {
        Self {
            pool_id: key.pool_id(),
            key,
            slot0: Slot0 {
                lp_fee: if key.is_dynamic_fee() { 0 } else { key.fee },
                ..Slot0::default()
            },
            liquidity: 0,
            bitmap: FastMap::default(),
            ticks: FastMap::default(),
        }
    }

    /// Sets the current price; the tick is derived from it.
    pub fn with_sqrt_price(mut self, sqrt_price_x96: U256) -> Result<Self, StateError> {
        self.slot0.tick = get_tick_at_sqrt_price(sqrt_price_x96)?;
        self.slot0.sqrt_price_x96 = sqrt_price_x96;
        Ok(self)
    }

    pub fn with_slot0(mut self, slot0: Slot0) -> Self {
        self.slot0 = slot0;
        self
    }

    pub fn with_liquidity(mut self, liquidity: u128) -> Self {
        self.liquidity = liquidity;
        self
    }

    /// Adds initialized ticks, flipping each into the bitmap.
    ///
    /// Ticks with zero gross liquidity are skipped. Ticks off the pool's
    /// spacing grid are rejected.
    pub fn with_ticks<I>(mut self, ticks: I) -> Result<Self, StateError>
    where
        I: IntoIterator<Item = (i32, TickInfo)>,
    {
        for (tick, info) in ticks {
            self.insert_tick(tick, info)?;
        }
        Ok(self)
    }

    /// Records one initialized tick. Re-inserting a known tick only updates
    /// its liquidity; zero gross liquidity uninitializes it.
    pub fn insert_tick(&mut self, tick: i32, info: TickInfo) -> Result<(), StateError> {
        if !(MIN_TICK..=MAX_TICK).contains(&tick) {
            return Err(StateError::TickOutOfBounds);
        }
        if info.liquidity_gross == 0 {
            if self.ticks.remove(&tick).is_some() {
                flip_tick(&mut self.bitmap, tick, self.key.tick_spacing)?;
            }
            return Ok(());
        }
        if !self.ticks.contains_key(&tick) {
            flip_tick(&mut self.bitmap, tick, self.key.tick_spacing)?;
        }
        self.ticks.insert(tick, info);
        Ok(())
    }

    /// A pool is initialized once it has a non-zero price.
    pub fn is_initialized(&self) -> bool {
        !self.slot0.sqrt_price_x96.is_zero()
    }

    pub fn tick_spacing(&self) -> i32 {
        self.key.tick_spacing
    }

    /// LP fee charged on swaps, in hundredths of a bip.
    pub fn fee_pips(&self) -> u32 {
        if self.key.is_dynamic_fee() {
            self.slot0.lp_fee
        } else {
            self.key.fee
        }
    }

    /// Returns the net liquidity delta at a given tick, if it exists.
    ///
    /// This is used during swaps to update in-range liquidity when
    /// crossing initialized ticks.
    pub fn get_liquidity_net(&self, tick: &i32) -> Option<i128> {
        self.ticks.get(tick).map(|tick_info| tick_info.liquidity_net)
    }

    /// Bitmap words a swap in the given direction may touch.
    pub fn search_range(&self, zero_for_one: bool) -> Vec<i16> {
        generate_search_range(self.slot0.tick, self.key.tick_spacing, zero_for_one)
    }
}
