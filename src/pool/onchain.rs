//! Reads v4 pool state through the StateView lens contract.

use crate::FastMap;
use crate::error::{Error, OnchainError};
use crate::pool::key::{PoolKey, to_i24};
use crate::pool::state::{PoolState, Slot0, TickInfo, generate_search_range};
use alloy_primitives::{Address, B256, BlockNumber, U256, address};
use alloy_provider::Provider;
use alloy_sol_macro::sol;
use futures::try_join;
use std::sync::Arc;
use tracing::debug;

/// Multicall3, deployed at the same address on every supported chain.
pub const MULTICALL3_ADDRESS: Address = address!("0xcA11bde05977b3631167028862bE2a173976CA11");

sol! {
    #[sol(rpc)]
    interface IStateView {
        function getSlot0(bytes32 poolId)
            external
            view
            returns (uint160 sqrtPriceX96, int24 tick, uint24 protocolFee, uint24 lpFee);
        function getLiquidity(bytes32 poolId) external view returns (uint128 liquidity);
        function getTickBitmap(bytes32 poolId, int16 tick) external view returns (uint256 tickBitmap);
        function getTickInfo(bytes32 poolId, int24 tick)
            external
            view
            returns (
                uint128 liquidityGross,
                int128 liquidityNet,
                uint256 feeGrowthOutside0X128,
                uint256 feeGrowthOutside1X128
            );
    }
}

sol! {
    struct Call {
        address target;
        bytes callData;
    }

    #[sol(rpc)]
    interface IMulticall {
        function aggregate(Call[] calls)
            external
            view
            returns (uint256 blockNumber, bytes[] returnData);
    }
}

pub type OnchainProvider<P> = Arc<P>;

/// Pool reader bound to a StateView deployment.
#[derive(Clone, Debug)]
pub struct StateViewReader<P> {
    pub state_view: Address,
    pub contract: IStateView::IStateViewInstance<OnchainProvider<P>>,
    pub multicall: IMulticall::IMulticallInstance<OnchainProvider<P>>,
}

impl<P> StateViewReader<P>
where
    P: Provider + Send + Sync + 'static,
{
    pub fn new(state_view: Address, provider: OnchainProvider<P>) -> Self {
        let contract = IStateView::IStateViewInstance::new(state_view, provider.clone());
        let multicall = IMulticall::IMulticallInstance::new(MULTICALL3_ADDRESS, provider);
        Self {
            state_view,
            contract,
            multicall,
        }
    }

    /// Reads `slot0` for the pool at the given optional block number.
    pub async fn fetch_slot0(
        &self,
        pool_id: B256,
        block_number: Option<BlockNumber>,
    ) -> Result<Slot0, OnchainError> {
        let mut call = self.contract.getSlot0(pool_id);
        if let Some(bn) = block_number {
            call = call.block(bn.into());
        }

        let slot0 = call
            .call()
            .await
            .map_err(|e| OnchainError::FailedToGetSlot0(e.to_string()))?;

        Ok(Slot0 {
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick: slot0.tick.as_i32(),
            protocol_fee: slot0.protocolFee.to::<u32>(),
            lp_fee: slot0.lpFee.to::<u32>(),
        })
    }

    /// Reads the in-range liquidity of the pool.
    pub async fn fetch_liquidity(
        &self,
        pool_id: B256,
        block_number: Option<BlockNumber>,
    ) -> Result<u128, OnchainError> {
        let mut call = self.contract.getLiquidity(pool_id);
        if let Some(bn) = block_number {
            call = call.block(bn.into());
        }

        call.call()
            .await
            .map_err(|e| OnchainError::FailedToGetLiquidity(e.to_string()))
    }

    /// A pool exists once its price is set; read failures count as absent.
    pub async fn pool_exists(&self, pool_id: B256) -> bool {
        match self.fetch_slot0(pool_id, None).await {
            Ok(slot0) => !slot0.sqrt_price_x96.is_zero(),
            Err(e) => {
                debug!(%pool_id, error = %e, "slot0 read failed, treating pool as absent");
                false
            }
        }
    }

    /// Fetches tick bitmap words through one multicall.
    ///
    /// Returns a sparse map from word index to non-zero bitmap.
    pub async fn fetch_batch_bitmaps(
        &self,
        pool_id: B256,
        word_positions: &[i16],
        block_number: Option<BlockNumber>,
    ) -> Result<FastMap<i16, U256>, OnchainError> {
        let bitmap_calls: Vec<Call> = word_positions
            .iter()
            .map(|wp| Call {
                target: self.state_view,
                callData: self.contract.getTickBitmap(pool_id, *wp).calldata().to_owned(),
            })
            .collect();

        let mut agg = self.multicall.aggregate(bitmap_calls);
        if let Some(bn) = block_number {
            agg = agg.block(bn.into());
        }
        let bitmap_data = agg
            .call()
            .await
            .map_err(|e| OnchainError::FailedToCallMulticall(e.to_string()))?;

        let mut bitmaps: FastMap<i16, U256> = FastMap::default();
        for (wp, raw) in word_positions.iter().zip(bitmap_data.returnData) {
            let bitmap = self
                .contract
                .getTickBitmap(pool_id, *wp)
                .decode_output(raw)
                .map_err(|e| OnchainError::FailedToDecode(e.to_string()))?;

            if !bitmap.is_zero() {
                bitmaps.insert(*wp, bitmap);
            }
        }

        Ok(bitmaps)
    }

    /// Reads tick info for every bit set in `bitmaps`.
    pub async fn fetch_ticks_for_bitmaps(
        &self,
        pool_id: B256,
        tick_spacing: i32,
        bitmaps: &FastMap<i16, U256>,
        block_number: Option<BlockNumber>,
    ) -> Result<Vec<(i32, TickInfo)>, OnchainError> {
        let mut tick_indices: Vec<i32> = Vec::new();
        let mut tick_calls: Vec<Call> = Vec::new();

        for (&wp, bitmap) in bitmaps {
            for bit in 0..256usize {
                if (*bitmap & (U256::ONE << bit)).is_zero() {
                    continue;
                }
                let tick_index = ((wp as i32) * 256 + bit as i32) * tick_spacing;
                tick_indices.push(tick_index);
                tick_calls.push(Call {
                    target: self.state_view,
                    callData: self
                        .contract
                        .getTickInfo(pool_id, to_i24(tick_index))
                        .calldata()
                        .to_owned(),
                });
            }
        }

        // nothing initialized
        if tick_calls.is_empty() {
            return Ok(Vec::new());
        }

        let mut agg = self.multicall.aggregate(tick_calls);
        if let Some(bn) = block_number {
            agg = agg.block(bn.into());
        }
        let return_data = agg
            .call()
            .await
            .map_err(|e| OnchainError::FailedToCallMulticall(e.to_string()))?;

        let mut ticks = Vec::with_capacity(tick_indices.len());
        for (tick_index, raw) in tick_indices.into_iter().zip(return_data.returnData) {
            let decoded = self
                .contract
                .getTickInfo(pool_id, to_i24(tick_index))
                .decode_output(raw)
                .map_err(|e| OnchainError::FailedToGetTickInfo(e.to_string()))?;

            if decoded.liquidityGross != 0 {
                ticks.push((
                    tick_index,
                    TickInfo {
                        liquidity_gross: decoded.liquidityGross,
                        liquidity_net: decoded.liquidityNet,
                    },
                ));
            }
        }

        Ok(ticks)
    }

    /// Loads a swap-ready snapshot for `key`, scanning at most `max_words`
    /// bitmap words from the current tick in the swap direction.
    pub async fn load_pool_state(
        &self,
        key: PoolKey,
        zero_for_one: bool,
        max_words: usize,
        block_number: Option<BlockNumber>,
    ) -> Result<PoolState, Error> {
        let pool_id = key.pool_id();
        let (slot0, liquidity) = try_join!(
            self.fetch_slot0(pool_id, block_number),
            self.fetch_liquidity(pool_id, block_number)
        )?;

        let mut words = generate_search_range(slot0.tick, key.tick_spacing, zero_for_one);
        if zero_for_one {
            let skip = words.len().saturating_sub(max_words);
            words.drain(..skip);
        } else {
            words.truncate(max_words);
        }

        let bitmaps = self
            .fetch_batch_bitmaps(pool_id, &words, block_number)
            .await?;
        let ticks = self
            .fetch_ticks_for_bitmaps(pool_id, key.tick_spacing, &bitmaps, block_number)
            .await?;
        debug!(%pool_id, words = words.len(), ticks = ticks.len(), "loaded pool state");

        Ok(PoolState::new(key)
            .with_slot0(slot0)
            .with_liquidity(liquidity)
            .with_ticks(ticks)?)
    }
}
