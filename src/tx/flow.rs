//! Pool creation, liquidity provision and swap flows.
//!
//! Every flow runs the same sequence: validate, approve Permit2 for each
//! ERC-20 input, sign a Permit2 permit when the current one is short or
//! expired, encode the target call, submit it and poll for the receipt.
//! Progress is reported through a [`FlowObserver`]. Nothing is retried.

use crate::abi::{
    ExactInputSingleParams, IERC20, IPermit2, IPositionManager, IStateView, MintPositionParams,
    PermitBatch, PermitSingle, SettleAllParams, SettlePairParams, SweepParams, TakeAllParams,
};
use crate::config::ClientConfig;
use crate::error::{Error, QuoteError, Result, TxError};
use crate::math::liquidity_amounts::{get_amounts_for_liquidity, get_liquidity_for_amounts};
use crate::math::math_helpers::mul_div;
use crate::math::price_math::price_to_sqrt_price_x96;
use crate::math::tick_math::{
    get_sqrt_price_at_tick, get_tick_at_sqrt_price, max_usable_tick, min_usable_tick,
};
use crate::pool::key::{PoolKey, to_i24};
use crate::quote::{maximum_amount_in, minimum_amount_out, quote_raw_from_sqrt_price_x96};
use crate::storage::{ConfiguredStore, DeployedPools, KeyValueStore};
use crate::token::Token;
use crate::tx::actions::{
    ActionsBuilder, RouterCommands, modify_liquidities_calldata, multicall_calldata,
};
use crate::tx::permit::{
    PermitAllowance, build_permit_batch, build_permit_single, permit_batch_signing_hash,
    permit_details, permit_single_signing_hash, permit2_domain,
};
use crate::tx::wallet::{TxReceipt, TxRequest, WalletClient};
use crate::{Q96, U256_E6};
use alloy_primitives::{Address, B256, Bytes, U160, U256};
use alloy_sol_types::SolCall;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlowKind {
    CreatePool,
    AddLiquidity,
    Swap,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowStep {
    Started(FlowKind),
    CheckingPool { pool_id: B256 },
    Approving { token: Address },
    Approved { token: Address, tx_hash: B256 },
    SigningPermit { spender: Address },
    Submitting { to: Address },
    Submitted { tx_hash: B256 },
    Confirmed { tx_hash: B256, block_number: Option<u64> },
    Failed { kind: FlowKind, reason: String },
}

pub trait FlowObserver: Send + Sync {
    fn on_step(&self, step: &FlowStep);
}

impl<F> FlowObserver for F
where
    F: Fn(&FlowStep) + Send + Sync,
{
    fn on_step(&self, step: &FlowStep) {
        self(step)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoopObserver;

impl FlowObserver for NoopObserver {
    fn on_step(&self, _step: &FlowStep) {}
}

/// Liquidity to mint right after initializing a new pool.
///
/// Ticks are pool ticks, i.e. prices of currency1 in currency0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitialLiquidity {
    pub amount_a: String,
    pub amount_b: String,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreatePoolRequest {
    pub token_a: Token,
    pub token_b: Token,
    pub fee: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
    /// Price of one `token_a` in `token_b`.
    pub initial_price: String,
    pub liquidity: Option<InitialLiquidity>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddLiquidityRequest {
    pub key: PoolKey,
    pub token0: Token,
    pub token1: Token,
    pub amount0: String,
    pub amount1: String,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapRequest {
    pub key: PoolKey,
    pub token_in: Token,
    pub token_out: Token,
    pub amount_in: String,
    /// Quoted output in raw units. When absent the spot price less the pool
    /// fee is used.
    pub expected_amount_out: Option<U256>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowOutcome {
    pub key: PoolKey,
    pub pool_id: B256,
    pub receipt: TxReceipt,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapOutcome {
    pub key: PoolKey,
    pub amount_in: U256,
    pub min_amount_out: U256,
    pub receipt: TxReceipt,
}

/// Liquidity to mint and the token maxima, slippage included.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MintPlan {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub amount0_max: u128,
    pub amount1_max: u128,
}

/// Ticks must be ordered, on the spacing grid and inside the usable range.
pub fn validate_tick_range(tick_lower: i32, tick_upper: i32, tick_spacing: i32) -> Result<()> {
    let min_tick = min_usable_tick(tick_spacing)?;
    let max_tick = max_usable_tick(tick_spacing)?;
    if tick_lower >= tick_upper {
        return Err(TxError::Validation(format!(
            "tick range [{tick_lower}, {tick_upper}] is empty"
        ))
        .into());
    }
    if tick_lower % tick_spacing != 0 || tick_upper % tick_spacing != 0 {
        return Err(TxError::Validation(format!(
            "ticks must be multiples of the tick spacing {tick_spacing}"
        ))
        .into());
    }
    if tick_lower < min_tick || tick_upper > max_tick {
        return Err(TxError::Validation("tick range exceeds the usable range".to_string()).into());
    }
    Ok(())
}

fn to_u128(value: U256, what: &str) -> Result<u128> {
    u128::try_from(value)
        .map_err(|_| TxError::Validation(format!("{what} does not fit in uint128")).into())
}

/// Liquidity for the desired amounts at `sqrt_price_x96`, with maxima
/// covering the amounts the pool will actually pull plus slippage.
pub fn plan_mint(
    sqrt_price_x96: U256,
    tick_lower: i32,
    tick_upper: i32,
    tick_spacing: i32,
    amount0: U256,
    amount1: U256,
    slippage_bps: u32,
) -> Result<MintPlan> {
    validate_tick_range(tick_lower, tick_upper, tick_spacing)?;
    let sqrt_lower = get_sqrt_price_at_tick(tick_lower)?;
    let sqrt_upper = get_sqrt_price_at_tick(tick_upper)?;

    let liquidity =
        get_liquidity_for_amounts(sqrt_price_x96, sqrt_lower, sqrt_upper, amount0, amount1)?;
    if liquidity == 0 {
        return Err(TxError::Validation("amounts are too small to mint liquidity".to_string()).into());
    }

    let (need0, need1) =
        get_amounts_for_liquidity(sqrt_price_x96, sqrt_lower, sqrt_upper, liquidity)?;
    // the pool rounds owed amounts up
    let with_slippage = |need: U256| -> Result<U256> {
        if need.is_zero() {
            return Ok(U256::ZERO);
        }
        Ok(maximum_amount_in(need + U256::ONE, slippage_bps)?)
    };

    Ok(MintPlan {
        tick_lower,
        tick_upper,
        liquidity,
        amount0_max: to_u128(with_slippage(need0)?, "amount0 maximum")?,
        amount1_max: to_u128(with_slippage(need1)?, "amount1 maximum")?,
    })
}

/// Pool sqrt price for a price of `token_a` in `token_b`, given whether
/// `token_a` sorts as currency1.
pub fn initial_sqrt_price(
    price: &str,
    token_a: &Token,
    token_b: &Token,
    a_is_currency1: bool,
) -> Result<U256> {
    let sqrt_b_per_a = price_to_sqrt_price_x96(price, token_a.decimals, token_b.decimals)?;
    let sqrt_price = if a_is_currency1 {
        mul_div(Q96, Q96, sqrt_b_per_a)?
    } else {
        sqrt_b_per_a
    };
    get_tick_at_sqrt_price(sqrt_price).map_err(|_| QuoteError::InvalidPrice(price.to_string()))?;
    Ok(sqrt_price)
}

/// `modifyLiquidities` payload minting `plan` for `owner`. Native currency0
/// leftovers are swept back to the owner.
pub fn mint_unlock_data(key: &PoolKey, plan: &MintPlan, owner: Address) -> Bytes {
    let mut actions = ActionsBuilder::new()
        .mint_position(&MintPositionParams {
            poolKey: key.into(),
            tickLower: to_i24(plan.tick_lower),
            tickUpper: to_i24(plan.tick_upper),
            liquidity: U256::from(plan.liquidity),
            amount0Max: plan.amount0_max,
            amount1Max: plan.amount1_max,
            owner,
            hookData: Bytes::new(),
        })
        .settle_pair(&SettlePairParams {
            currency0: key.currency0,
            currency1: key.currency1,
        });
    if key.is_native() {
        actions = actions.sweep(&SweepParams {
            currency: Address::ZERO,
            to: owner,
        });
    }
    actions.build()
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Clears the in-flight flag on drop.
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, TxError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TxError::Busy)?;
        Ok(Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs transaction flows for one connected wallet. At most one flow is in
/// flight at a time.
pub struct TxClient<W, S> {
    wallet: W,
    config: ClientConfig,
    pools: DeployedPools<S>,
    observer: Arc<dyn FlowObserver>,
    in_flight: AtomicBool,
}

impl<W: WalletClient> TxClient<W, ConfiguredStore> {
    /// Client whose deployed-pools list lives where `config` says.
    pub fn from_config(wallet: W, config: ClientConfig) -> Self {
        let store = config.deployed_pools_store();
        Self::new(wallet, config, store)
    }
}

impl<W, S> TxClient<W, S>
where
    W: WalletClient,
    S: KeyValueStore,
{
    pub fn new(wallet: W, config: ClientConfig, store: S) -> Self {
        Self {
            wallet,
            config,
            pools: DeployedPools::new(store),
            observer: Arc::new(NoopObserver),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn FlowObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn deployed_pools(&self) -> &DeployedPools<S> {
        &self.pools
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn notify(&self, step: FlowStep) {
        self.observer.on_step(&step);
    }

    async fn run<T, F>(&self, kind: FlowKind, flow: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _guard = FlightGuard::acquire(&self.in_flight)?;
        info!(?kind, account = %self.wallet.account(), "flow started");
        self.notify(FlowStep::Started(kind));

        match flow.await {
            Ok(outcome) => {
                info!(?kind, "flow completed");
                Ok(outcome)
            }
            Err(e) => {
                if matches!(e, Error::TxError(TxError::Rejected)) {
                    info!(?kind, "user rejected the request");
                } else {
                    warn!(?kind, error = %e, "flow failed");
                }
                self.notify(FlowStep::Failed {
                    kind,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn ensure_chain(&self) -> Result<()> {
        let wallet_chain = self.wallet.chain_id();
        if wallet_chain != self.config.chain_id {
            return Err(TxError::Validation(format!(
                "wallet is on chain {wallet_chain}, client is configured for {}",
                self.config.chain_id
            ))
            .into());
        }
        Ok(())
    }

    fn deadline(&self) -> U256 {
        U256::from(now_secs() + self.config.deadline_secs)
    }

    async fn read<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, TxError> {
        let raw = self.wallet.call(to, call.abi_encode().into()).await?;
        C::abi_decode_returns(&raw).map_err(|e| TxError::Decode(e.to_string()))
    }

    /// Current sqrt price, or `None` when the pool is not initialized. A
    /// failed read counts as not initialized.
    pub async fn pool_sqrt_price(&self, pool_id: B256) -> Option<U256> {
        let call = IStateView::getSlot0Call { poolId: pool_id };
        match self.read(self.config.contracts.state_view, call).await {
            Ok(slot0) => {
                let sqrt_price = U256::from(slot0.sqrtPriceX96);
                (!sqrt_price.is_zero()).then_some(sqrt_price)
            }
            Err(e) => {
                debug!(%pool_id, error = %e, "slot0 read failed, treating pool as absent");
                None
            }
        }
    }

    /// Polls for the receipt of `hash` until it appears or the configured
    /// timeout passes.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<TxReceipt, TxError> {
        let deadline = Instant::now() + self.config.receipt_timeout;
        loop {
            if let Some(receipt) = self.wallet.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                warn!(%hash, "timed out waiting for receipt");
                return Err(TxError::ReceiptTimeout(hash));
            }
            debug!(%hash, "receipt pending");
            sleep(self.config.receipt_poll_interval).await;
        }
    }

    async fn submit(&self, tx: TxRequest) -> Result<TxReceipt, TxError> {
        self.notify(FlowStep::Submitting { to: tx.to });
        let tx_hash = self.wallet.send_transaction(tx).await?;
        info!(%tx_hash, "transaction submitted");
        self.notify(FlowStep::Submitted { tx_hash });

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.status {
            return Err(TxError::Reverted(tx_hash));
        }
        self.notify(FlowStep::Confirmed {
            tx_hash,
            block_number: receipt.block_number,
        });
        Ok(receipt)
    }

    /// Approves Permit2 for the maximum amount when its ERC-20 allowance is
    /// below `required`.
    async fn ensure_token_approval(&self, token: Address, required: U256) -> Result<(), TxError> {
        if token.is_zero() || required.is_zero() {
            return Ok(());
        }
        let permit2 = self.config.contracts.permit2;
        let allowance = self
            .read(
                token,
                IERC20::allowanceCall {
                    owner: self.wallet.account(),
                    spender: permit2,
                },
            )
            .await?;
        if allowance >= required {
            debug!(%token, %allowance, "permit2 allowance sufficient");
            return Ok(());
        }

        self.notify(FlowStep::Approving { token });
        let data = IERC20::approveCall {
            spender: permit2,
            amount: U256::MAX,
        }
        .abi_encode();
        let receipt = self
            .submit(TxRequest {
                to: token,
                data: data.into(),
                value: U256::ZERO,
            })
            .await?;
        self.notify(FlowStep::Approved {
            token,
            tx_hash: receipt.transaction_hash,
        });
        Ok(())
    }

    async fn permit2_allowance(&self, token: Address, spender: Address) -> Result<PermitAllowance, TxError> {
        let allowance = self
            .read(
                self.config.contracts.permit2,
                IPermit2::allowanceCall {
                    user: self.wallet.account(),
                    token,
                    spender,
                },
            )
            .await?;
        Ok(allowance.into())
    }

    async fn sign_permit_batch(
        &self,
        tokens: &[(Address, U256)],
        spender: Address,
    ) -> Result<Option<(PermitBatch, Bytes)>, TxError> {
        let now = now_secs();
        let mut details = Vec::new();
        for &(token, required) in tokens {
            if token.is_zero() || required.is_zero() {
                continue;
            }
            let allowance = self.permit2_allowance(token, spender).await?;
            if allowance.needs_permit(required, now) {
                details.push(permit_details(
                    token,
                    now + self.config.permit_expiration_secs,
                    allowance.nonce,
                ));
            }
        }
        if details.is_empty() {
            return Ok(None);
        }

        self.notify(FlowStep::SigningPermit { spender });
        let batch = build_permit_batch(details, spender, now + self.config.permit_sig_deadline_secs);
        let domain = permit2_domain(self.config.chain_id, self.config.contracts.permit2);
        let signature = self
            .wallet
            .sign_hash(permit_batch_signing_hash(&batch, &domain))
            .await?;
        Ok(Some((batch, signature)))
    }

    async fn sign_permit_single(
        &self,
        token: Address,
        required: U256,
        spender: Address,
    ) -> Result<Option<(PermitSingle, Bytes)>, TxError> {
        let now = now_secs();
        let allowance = self.permit2_allowance(token, spender).await?;
        if !allowance.needs_permit(required, now) {
            return Ok(None);
        }

        self.notify(FlowStep::SigningPermit { spender });
        let details = permit_details(token, now + self.config.permit_expiration_secs, allowance.nonce);
        let permit = build_permit_single(details, spender, now + self.config.permit_sig_deadline_secs);
        let domain = permit2_domain(self.config.chain_id, self.config.contracts.permit2);
        let signature = self
            .wallet
            .sign_hash(permit_single_signing_hash(&permit, &domain))
            .await?;
        Ok(Some((permit, signature)))
    }

    /// Approvals, optional `permitBatch` and the minting `modifyLiquidities`
    /// call for the position manager multicall.
    async fn position_manager_calls(&self, key: &PoolKey, plan: &MintPlan) -> Result<Vec<Bytes>> {
        let position_manager = self.config.contracts.position_manager;
        let owner = self.wallet.account();
        let tokens = [
            (key.currency0, U256::from(plan.amount0_max)),
            (key.currency1, U256::from(plan.amount1_max)),
        ];
        for (token, required) in tokens {
            self.ensure_token_approval(token, required).await?;
        }

        let mut calls = Vec::with_capacity(2);
        if let Some((batch, signature)) = self.sign_permit_batch(&tokens, position_manager).await? {
            calls.push(
                IPositionManager::permitBatchCall {
                    owner,
                    _permitBatch: batch,
                    signature,
                }
                .abi_encode()
                .into(),
            );
        }
        calls.push(modify_liquidities_calldata(
            mint_unlock_data(key, plan, owner),
            self.deadline(),
        ));
        Ok(calls)
    }

    fn mint_value(key: &PoolKey, plan: &MintPlan) -> U256 {
        if key.is_native() {
            U256::from(plan.amount0_max)
        } else {
            U256::ZERO
        }
    }

    /// Initializes a pool, minting initial liquidity in the same
    /// transaction when requested, and records it as deployed.
    pub async fn create_pool(&self, request: CreatePoolRequest) -> Result<FlowOutcome> {
        self.run(FlowKind::CreatePool, self.create_pool_inner(request))
            .await
    }

    async fn create_pool_inner(&self, request: CreatePoolRequest) -> Result<FlowOutcome> {
        self.ensure_chain()?;
        let key = PoolKey::new(
            request.token_a.address,
            request.token_b.address,
            request.fee,
            request.tick_spacing,
            request.hooks,
        )?;
        let a_is_currency1 = key.currency0 != request.token_a.address;
        let sqrt_price = initial_sqrt_price(
            &request.initial_price,
            &request.token_a,
            &request.token_b,
            a_is_currency1,
        )?;

        let pool_id = key.pool_id();
        self.notify(FlowStep::CheckingPool { pool_id });
        if self.pool_sqrt_price(pool_id).await.is_some() {
            return Err(TxError::PoolAlreadyExists(pool_id).into());
        }

        let initialize: Bytes = IPositionManager::initializePoolCall {
            key: (&key).into(),
            sqrtPriceX96: U160::saturating_from(sqrt_price),
        }
        .abi_encode()
        .into();

        let (data, value) = match &request.liquidity {
            None => (initialize, U256::ZERO),
            Some(liquidity) => {
                let (token0, token1, amount0, amount1) = if a_is_currency1 {
                    (&request.token_b, &request.token_a, &liquidity.amount_b, &liquidity.amount_a)
                } else {
                    (&request.token_a, &request.token_b, &liquidity.amount_a, &liquidity.amount_b)
                };
                let plan = plan_mint(
                    sqrt_price,
                    liquidity.tick_lower,
                    liquidity.tick_upper,
                    key.tick_spacing,
                    token0.parse_amount(amount0)?,
                    token1.parse_amount(amount1)?,
                    self.config.slippage_bps,
                )?;
                let mut calls = vec![initialize];
                calls.extend(self.position_manager_calls(&key, &plan).await?);
                (multicall_calldata(calls), Self::mint_value(&key, &plan))
            }
        };

        let receipt = self
            .submit(TxRequest {
                to: self.config.contracts.position_manager,
                data,
                value,
            })
            .await?;

        match self.pools.add(&key) {
            Ok(inserted) => debug!(%pool_id, inserted, "recorded deployed pool"),
            Err(e) => warn!(%pool_id, error = %e, "failed to record deployed pool"),
        }
        info!(%pool_id, %sqrt_price, "pool created");

        Ok(FlowOutcome {
            key,
            pool_id,
            receipt,
        })
    }

    /// Mints a new position in an existing pool.
    pub async fn add_liquidity(&self, request: AddLiquidityRequest) -> Result<FlowOutcome> {
        self.run(FlowKind::AddLiquidity, self.add_liquidity_inner(request))
            .await
    }

    async fn add_liquidity_inner(&self, request: AddLiquidityRequest) -> Result<FlowOutcome> {
        self.ensure_chain()?;
        let key = request.key;
        key.validate()?;
        if request.token0.address != key.currency0 || request.token1.address != key.currency1 {
            return Err(TxError::Validation("tokens do not match the pool key".to_string()).into());
        }

        let pool_id = key.pool_id();
        self.notify(FlowStep::CheckingPool { pool_id });
        let sqrt_price = self
            .pool_sqrt_price(pool_id)
            .await
            .ok_or(TxError::PoolNotFound(pool_id))?;

        let plan = plan_mint(
            sqrt_price,
            request.tick_lower,
            request.tick_upper,
            key.tick_spacing,
            request.token0.parse_amount(&request.amount0)?,
            request.token1.parse_amount(&request.amount1)?,
            self.config.slippage_bps,
        )?;
        let calls = self.position_manager_calls(&key, &plan).await?;

        let receipt = self
            .submit(TxRequest {
                to: self.config.contracts.position_manager,
                data: multicall_calldata(calls),
                value: Self::mint_value(&key, &plan),
            })
            .await?;
        info!(%pool_id, liquidity = plan.liquidity, "liquidity added");

        Ok(FlowOutcome {
            key,
            pool_id,
            receipt,
        })
    }

    /// Exact-input single-pool swap through the universal router.
    pub async fn swap(&self, request: SwapRequest) -> Result<SwapOutcome> {
        self.run(FlowKind::Swap, self.swap_inner(request)).await
    }

    async fn swap_inner(&self, request: SwapRequest) -> Result<SwapOutcome> {
        self.ensure_chain()?;
        let key = request.key;
        key.validate()?;
        let token_in = request.token_in.address;
        let token_out = request.token_out.address;
        let zero_for_one = if token_in == key.currency0 && token_out == key.currency1 {
            true
        } else if token_in == key.currency1 && token_out == key.currency0 {
            false
        } else {
            return Err(TxError::Validation("tokens do not match the pool key".to_string()).into());
        };

        let amount_in = request.token_in.parse_amount(&request.amount_in)?;
        if amount_in.is_zero() {
            return Err(TxError::Validation("swap amount must be positive".to_string()).into());
        }
        let amount_in_u128 = to_u128(amount_in, "swap amount")?;

        let pool_id = key.pool_id();
        self.notify(FlowStep::CheckingPool { pool_id });
        let expected_out = match request.expected_amount_out {
            Some(expected) => expected,
            None => {
                let sqrt_price = self
                    .pool_sqrt_price(pool_id)
                    .await
                    .ok_or(TxError::PoolNotFound(pool_id))?;
                let spot = quote_raw_from_sqrt_price_x96(sqrt_price, amount_in, zero_for_one)?;
                let fee = if key.is_dynamic_fee() { 0 } else { key.fee };
                mul_div(spot, U256_E6 - U256::from(fee), U256_E6)?
            }
        };
        let min_amount_out = minimum_amount_out(expected_out, self.config.slippage_bps)?;
        let min_amount_out_u128 = to_u128(min_amount_out, "minimum output")?;

        let router = self.config.contracts.universal_router;
        let mut commands = RouterCommands::new();
        if !request.token_in.is_native() {
            self.ensure_token_approval(token_in, amount_in).await?;
            if let Some((permit, signature)) = self.sign_permit_single(token_in, amount_in, router).await? {
                commands = commands.permit2_permit(permit, signature);
            }
        }

        let actions = ActionsBuilder::new()
            .swap_exact_in_single(&ExactInputSingleParams {
                poolKey: (&key).into(),
                zeroForOne: zero_for_one,
                amountIn: amount_in_u128,
                amountOutMinimum: min_amount_out_u128,
                hookData: Bytes::new(),
            })
            .settle_all(&SettleAllParams {
                currency: token_in,
                maxAmount: amount_in,
            })
            .take_all(&TakeAllParams {
                currency: token_out,
                minAmount: min_amount_out,
            });
        let data = commands.v4_swap(actions).execute_calldata(self.deadline());
        let value = if request.token_in.is_native() {
            amount_in
        } else {
            U256::ZERO
        };

        let receipt = self.submit(TxRequest { to: router, data, value }).await?;
        info!(%pool_id, %amount_in, %min_amount_out, zero_for_one, "swap executed");

        Ok(SwapOutcome {
            key,
            amount_in,
            min_amount_out,
            receipt,
        })
    }
}
