use crate::abi;
use crate::error::PoolKeyError;
use crate::math::tick_math::{MAX_TICK_SPACING, MIN_TICK_SPACING};
use crate::pool::fee::{DYNAMIC_FEE_FLAG, MAX_LP_FEE};
use alloy_primitives::aliases::{I24, U24};
use alloy_primitives::{Address, B256, U160, keccak256};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identity of a v4 pool. Two keys with the same fields are the same pool.
///
/// `currency0 < currency1` always holds for keys built through
/// [`PoolKey::new`]; the zero address stands for the native asset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub hooks: Address,
}

/// Converts an `Address` into its `U160` numeric representation.
#[inline(always)]
pub fn address_to_u160(address: Address) -> U160 {
    address.into()
}

/// Returns the pair sorted by numeric address value.
///
/// Symmetric: `order_pool_tokens(a, b) == order_pool_tokens(b, a)`.
pub fn order_pool_tokens(token_a: Address, token_b: Address) -> (Address, Address) {
    if address_to_u160(token_a) < address_to_u160(token_b) {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    }
}

/// Parses a user-entered `0x`-prefixed, 40-hex-digit address.
pub fn parse_address(input: &str) -> Result<Address, PoolKeyError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PoolKeyError::EmptyAddress);
    }
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| PoolKeyError::InvalidAddress(trimmed.to_string()))?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(PoolKeyError::InvalidAddress(trimmed.to_string()));
    }
    Address::from_str(trimmed).map_err(|_| PoolKeyError::InvalidAddress(trimmed.to_string()))
}

impl PoolKey {
    /// Builds a validated key, ordering the two tokens canonically.
    pub fn new(
        token_a: Address,
        token_b: Address,
        fee: u32,
        tick_spacing: i32,
        hooks: Address,
    ) -> Result<Self, PoolKeyError> {
        let (currency0, currency1) = order_pool_tokens(token_a, token_b);
        let key = Self {
            currency0,
            currency1,
            fee,
            tick_spacing,
            hooks,
        };
        key.validate()?;
        Ok(key)
    }

    /// String-level constructor for form input. An empty `hooks` means the
    /// pool has no hooks.
    pub fn from_input(
        token_a: &str,
        token_b: &str,
        fee: u32,
        tick_spacing: i32,
        hooks: &str,
    ) -> Result<Self, PoolKeyError> {
        let token_a = parse_address(token_a)?;
        let token_b = parse_address(token_b)?;
        let hooks = if hooks.trim().is_empty() {
            Address::ZERO
        } else {
            parse_address(hooks).map_err(|_| PoolKeyError::InvalidHooks(hooks.to_string()))?
        };
        Self::new(token_a, token_b, fee, tick_spacing, hooks)
    }

    /// Checks ordering, spacing range and fee bounds.
    pub fn validate(&self) -> Result<(), PoolKeyError> {
        if self.currency0 == self.currency1 {
            return Err(PoolKeyError::IdenticalCurrencies);
        }
        if address_to_u160(self.currency0) > address_to_u160(self.currency1) {
            return Err(PoolKeyError::Malformed(
                "currency0 must sort below currency1".to_string(),
            ));
        }
        if !(MIN_TICK_SPACING..=MAX_TICK_SPACING).contains(&self.tick_spacing) {
            return Err(PoolKeyError::TickSpacingOutOfRange(self.tick_spacing));
        }
        if self.fee != DYNAMIC_FEE_FLAG && self.fee > MAX_LP_FEE {
            return Err(PoolKeyError::FeeTooLarge(self.fee));
        }
        Ok(())
    }

    /// Whether the fee is set per swap by the hook.
    pub fn is_dynamic_fee(&self) -> bool {
        self.fee == DYNAMIC_FEE_FLAG
    }

    /// Whether currency0 is the chain's native asset.
    pub fn is_native(&self) -> bool {
        self.currency0.is_zero()
    }

    pub fn has_hooks(&self) -> bool {
        !self.hooks.is_zero()
    }

    /// `keccak256(abi.encode(key))`, the id the pool manager stores the pool
    /// under.
    pub fn pool_id(&self) -> B256 {
        generate_pool_id(self)
    }

    /// Serialized form used by the deployed-pools store.
    pub fn to_json(&self) -> Result<String, PoolKeyError> {
        serde_json::to_string(self).map_err(|e| PoolKeyError::Malformed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, PoolKeyError> {
        let key: Self =
            serde_json::from_str(json).map_err(|e| PoolKeyError::Malformed(e.to_string()))?;
        key.validate()?;
        Ok(key)
    }
}

pub(crate) fn to_i24(value: i32) -> I24 {
    I24::try_from(value).unwrap_or(if value < 0 { I24::MIN } else { I24::MAX })
}

impl From<&PoolKey> for abi::PoolKey {
    fn from(key: &PoolKey) -> Self {
        Self {
            currency0: key.currency0,
            currency1: key.currency1,
            fee: U24::saturating_from(key.fee),
            tickSpacing: to_i24(key.tick_spacing),
            hooks: key.hooks,
        }
    }
}

/// Computes the pool id of `key`.
pub fn generate_pool_id(key: &PoolKey) -> B256 {
    keccak256(abi::PoolKey::from(key).abi_encode())
}
