//! Client-side pool math, quoting and transaction flows for Uniswap v4‑style
//! concentrated‑liquidity AMMs.
//!
//! This crate exposes:
//! - Low‑level math primitives (`math::*`) for ticks, prices, liquidity and
//!   swap steps, all on 256‑bit integers.
//! - Pool identity (`pool::key`), fee tiers and an in‑memory `PoolState`
//!   that can simulate swaps for quoting.
//! - Quote estimation with a sqrt‑price fallback (`quote`).
//! - Transaction orchestration for pool creation, liquidity provision and
//!   swaps behind a [`tx::WalletClient`] seam (`tx`).
//! - Glue for the GraphQL indexer (`indexer`) and a local deployed‑pools
//!   store (`storage`).
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use clmm_v4_client::{math::tick_math, RESOLUTION, U256};
//!
//! let sqrt_price = tick_math::get_sqrt_price_at_tick(0).unwrap();
//! assert!(sqrt_price > U256::ZERO);
//! assert_eq!(RESOLUTION, 96);
//! ```
//!
//! ## Pool identity and a fallback quote
//! ```no_run
//! use clmm_v4_client::{pool::PoolKey, quote::get_quote_from_sqrt_price_x96, Address, Q96};
//!
//! let key = PoolKey::new(
//!     Address::repeat_byte(0x22),
//!     Address::repeat_byte(0x11),
//!     3000,
//!     60,
//!     Address::ZERO,
//! )
//! .unwrap();
//! assert!(key.currency0 < key.currency1);
//! println!("pool id: {}", key.pool_id());
//!
//! let out = get_quote_from_sqrt_price_x96(Q96, "100", 18, 18, true).unwrap();
//! assert_eq!(out, "100");
//! ```

pub use alloy_primitives::{Address, B256, Bytes, I256, U160, U256};

pub mod abi;
pub mod chain;
pub mod config;
pub mod error;
mod hash;
pub mod indexer;
pub mod math;
pub mod pool;
pub mod quote;
pub mod storage;
pub mod token;
pub mod tx;

pub use error::Error;
pub use hash::FastMap;
pub use pool::{PoolKey, PoolState};
pub use token::Token;

const U256_1: U256 = U256::from_limbs([1, 0, 0, 0]);
const U256_128: U256 = U256::from_limbs([128, 0, 0, 0]);

const U160_MAX: U256 = U256::from_limbs([u64::MAX, u64::MAX, 4294967295, 0]);
const U256_E4: U256 = U256::from_limbs([10000, 0, 0, 0]);
const U256_E6: U256 = U256::from_limbs([1000000, 0, 0, 0]);

pub const RESOLUTION: u8 = 96;
pub const Q96: U256 = U256::from_limbs([0, 4294967296, 0, 0]);
pub const Q192: U256 = U256::from_limbs([0, 0, 0, 1]);
