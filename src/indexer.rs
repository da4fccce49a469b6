//! GraphQL client for the pool indexer.
//!
//! The plain `fetch_*` methods never fail: transport, status and GraphQL
//! errors are logged and read as an empty list. The `try_fetch_*` variants
//! return them instead.

use crate::config::ClientConfig;
use crate::error::{Error, IndexerError, PoolKeyError, QuoteError};
use crate::pool::key::PoolKey;
use crate::pool::state::{PoolState, TickInfo};
use crate::token::Token;
use alloy_primitives::{Address, B256, U256};
use reqwest::Client;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, warn};

const POOLS_QUERY: &str = r#"
query Pools($first: Int!) {
  pools(first: $first, orderBy: liquidity, orderDirection: desc) {
    id
    token0 { id symbol name decimals }
    token1 { id symbol name decimals }
    feeTier
    tickSpacing
    hooks
    liquidity
    sqrtPrice
    tick
  }
}"#;

const POOL_TICKS_QUERY: &str = r#"
query PoolTicks($pool: String!, $first: Int!) {
  ticks(first: $first, where: { pool: $pool }, orderBy: tickIdx) {
    tickIdx
    liquidityGross
    liquidityNet
  }
}"#;

const TOKENS_QUERY: &str = r#"
query Tokens($first: Int!) {
  tokens(first: $first) {
    id
    symbol
    name
    decimals
  }
}"#;

/// Accepts a JSON string or number and parses it with `FromStr`.
fn de_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse().map_err(D::Error::custom),
        Value::Number(n) => n.to_string().parse().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected number, got {other}"))),
    }
}

fn de_opt_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => s.parse().map(Some).map_err(D::Error::custom),
        Value::Number(n) => n.to_string().parse().map(Some).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected number, got {other}"))),
    }
}

fn de_opt_address<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Address>::deserialize(deserializer)?.unwrap_or(Address::ZERO))
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct IndexedToken {
    pub id: Address,
    pub symbol: String,
    pub name: String,
    #[serde(deserialize_with = "de_from_str")]
    pub decimals: u8,
}

impl IndexedToken {
    pub fn to_token(&self, chain_id: u64) -> Result<Token, QuoteError> {
        Ok(Token::new(self.id, &self.symbol, &self.name, self.decimals)?.with_chain_id(chain_id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedPool {
    pub id: B256,
    pub token0: IndexedToken,
    pub token1: IndexedToken,
    #[serde(deserialize_with = "de_from_str")]
    pub fee_tier: u32,
    #[serde(deserialize_with = "de_from_str")]
    pub tick_spacing: i32,
    #[serde(default, deserialize_with = "de_opt_address")]
    pub hooks: Address,
    #[serde(deserialize_with = "de_from_str")]
    pub liquidity: u128,
    #[serde(deserialize_with = "de_from_str")]
    pub sqrt_price: U256,
    /// `None` until the pool is initialized.
    #[serde(default, deserialize_with = "de_opt_from_str")]
    pub tick: Option<i32>,
}

impl IndexedPool {
    /// Rebuilds the key and checks it hashes to the indexed id.
    pub fn pool_key(&self) -> Result<PoolKey, PoolKeyError> {
        let key = PoolKey::new(
            self.token0.id,
            self.token1.id,
            self.fee_tier,
            self.tick_spacing,
            self.hooks,
        )?;
        if key.pool_id() != self.id {
            return Err(PoolKeyError::Malformed(format!(
                "indexed id {} does not match key id {}",
                self.id,
                key.pool_id()
            )));
        }
        Ok(key)
    }

    /// Swap-ready snapshot from the indexed price, liquidity and ticks.
    pub fn to_pool_state(&self, ticks: &[IndexedTick]) -> Result<PoolState, Error> {
        let mut state = PoolState::new(self.pool_key()?).with_liquidity(self.liquidity);
        if !self.sqrt_price.is_zero() {
            state = state.with_sqrt_price(self.sqrt_price)?;
        }
        Ok(state.with_ticks(ticks.iter().map(IndexedTick::to_tick_info))?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedTick {
    #[serde(deserialize_with = "de_from_str")]
    pub tick_idx: i32,
    #[serde(deserialize_with = "de_from_str")]
    pub liquidity_gross: u128,
    #[serde(deserialize_with = "de_from_str")]
    pub liquidity_net: i128,
}

impl IndexedTick {
    pub fn to_tick_info(&self) -> (i32, TickInfo) {
        (
            self.tick_idx,
            TickInfo {
                liquidity_gross: self.liquidity_gross,
                liquidity_net: self.liquidity_net,
            },
        )
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PoolsData {
    pools: Vec<IndexedPool>,
}

#[derive(Debug, Deserialize)]
struct TicksData {
    ticks: Vec<IndexedTick>,
}

#[derive(Debug, Deserialize)]
struct TokensData {
    tokens: Vec<IndexedToken>,
}

/// Indexer endpoint for one chain.
#[derive(Clone, Debug)]
pub struct IndexerClient {
    client: Client,
    url: String,
    chain_id: u64,
}

impl IndexerClient {
    pub fn new(url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            chain_id,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, IndexerError> {
        let url = config
            .indexer_url
            .clone()
            .ok_or(IndexerError::UnsupportedChain(config.chain_id))?;
        Ok(Self::new(url, config.chain_id))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, IndexerError> {
        let body = json!({ "query": query, "variables": variables });
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexerError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IndexerError::Http(format!("status {status}: {body}")));
        }

        let response: GraphqlResponse<T> = resp
            .json()
            .await
            .map_err(|e| IndexerError::Decode(e.to_string()))?;
        if !response.errors.is_empty() {
            let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
            return Err(IndexerError::Graphql(messages.join("; ")));
        }
        response.data.ok_or(IndexerError::MissingData)
    }

    pub async fn try_fetch_pools(&self, first: usize) -> Result<Vec<IndexedPool>, IndexerError> {
        let data: PoolsData = self.query(POOLS_QUERY, json!({ "first": first })).await?;
        debug!(url = %self.url, count = data.pools.len(), "fetched pools");
        Ok(data.pools)
    }

    pub async fn fetch_pools(&self, first: usize) -> Vec<IndexedPool> {
        self.try_fetch_pools(first).await.unwrap_or_else(|e| {
            warn!(url = %self.url, error = %e, "failed to fetch pools from indexer");
            Vec::new()
        })
    }

    pub async fn try_fetch_pool_ticks(
        &self,
        pool_id: B256,
        first: usize,
    ) -> Result<Vec<IndexedTick>, IndexerError> {
        let data: TicksData = self
            .query(
                POOL_TICKS_QUERY,
                json!({ "pool": pool_id.to_string(), "first": first }),
            )
            .await?;
        debug!(%pool_id, count = data.ticks.len(), "fetched ticks");
        Ok(data.ticks)
    }

    pub async fn fetch_pool_ticks(&self, pool_id: B256, first: usize) -> Vec<IndexedTick> {
        self.try_fetch_pool_ticks(pool_id, first)
            .await
            .unwrap_or_else(|e| {
                warn!(%pool_id, error = %e, "failed to fetch ticks from indexer");
                Vec::new()
            })
    }

    pub async fn try_fetch_tokens(&self, first: usize) -> Result<Vec<Token>, IndexerError> {
        let data: TokensData = self.query(TOKENS_QUERY, json!({ "first": first })).await?;
        let tokens = data
            .tokens
            .iter()
            .filter_map(|t| match t.to_token(self.chain_id) {
                Ok(token) => Some(token),
                Err(e) => {
                    warn!(address = %t.id, error = %e, "skipping indexed token");
                    None
                }
            })
            .collect();
        Ok(tokens)
    }

    pub async fn fetch_tokens(&self, first: usize) -> Vec<Token> {
        self.try_fetch_tokens(first).await.unwrap_or_else(|e| {
            warn!(url = %self.url, error = %e, "failed to fetch tokens from indexer");
            Vec::new()
        })
    }
}
