//! Token metadata and the token lists the client offers for selection.

use crate::chain::{MAINNET, SEPOLIA};
use crate::error::{QuoteError, Result};
use crate::math::price_math::{MAX_DECIMALS, format_decimal, parse_decimal};
use alloy_primitives::{Address, U256, address};
use serde::{Deserialize, Serialize};

/// An ERC-20 token, or the native asset when `address` is zero.
///
/// Serializes in the standard token-list shape (`logoURI`, `chainId`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(rename = "chainId", default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
}

impl Token {
    pub fn new(
        address: Address,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Result<Self, QuoteError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(QuoteError::InvalidToken("symbol is empty".to_string()));
        }
        if decimals > MAX_DECIMALS {
            return Err(QuoteError::UnsupportedDecimals(decimals));
        }
        Ok(Self {
            address,
            symbol,
            name: name.into(),
            decimals,
            logo_uri: None,
            chain_id: None,
        })
    }

    /// The chain's native asset (address zero, 18 decimals).
    pub fn native(chain_id: u64) -> Self {
        Self {
            address: Address::ZERO,
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            decimals: 18,
            logo_uri: None,
            chain_id: Some(chain_id),
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_logo_uri(mut self, logo_uri: impl Into<String>) -> Self {
        self.logo_uri = Some(logo_uri.into());
        self
    }

    pub fn is_native(&self) -> bool {
        self.address.is_zero()
    }

    /// Converts a human amount ("1.5") to raw units of this token.
    pub fn parse_amount(&self, amount: &str) -> Result<U256, QuoteError> {
        parse_decimal(amount, self.decimals)
    }

    /// Converts raw units of this token to a human amount.
    pub fn format_amount(&self, raw: U256) -> Result<String, QuoteError> {
        format_decimal(raw, self.decimals)
    }
}

/// A token list document: `{ "name": ..., "tokens": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub name: String,
    pub tokens: Vec<Token>,
}

impl TokenList {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| QuoteError::InvalidToken(e.to_string()).into())
    }

    /// Tokens tagged with `chain_id`. Untagged tokens match every chain.
    pub fn for_chain(&self, chain_id: u64) -> Vec<&Token> {
        self.tokens
            .iter()
            .filter(|t| t.chain_id.is_none_or(|id| id == chain_id))
            .collect()
    }

    pub fn find_by_address(&self, address: Address) -> Option<&Token> {
        self.tokens.iter().find(|t| t.address == address)
    }

    /// Case-insensitive symbol lookup.
    pub fn find_by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }
}

fn erc20(chain_id: u64, address: Address, symbol: &str, name: &str, decimals: u8) -> Token {
    Token {
        address,
        symbol: symbol.to_string(),
        name: name.to_string(),
        decimals,
        logo_uri: None,
        chain_id: Some(chain_id),
    }
}

/// Built-in tokens for a chain: the native asset plus WETH and USDC where
/// their deployments are known.
pub fn default_tokens(chain_id: u64) -> TokenList {
    let mut tokens = vec![Token::native(chain_id)];
    match chain_id {
        MAINNET => {
            tokens.push(erc20(
                chain_id,
                address!("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
                "WETH",
                "Wrapped Ether",
                18,
            ));
            tokens.push(erc20(
                chain_id,
                address!("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                "USDC",
                "USD Coin",
                6,
            ));
        }
        SEPOLIA => {
            tokens.push(erc20(
                chain_id,
                address!("0xfff9976782d46cc05630d1f6ebab18b2324d6b14"),
                "WETH",
                "Wrapped Ether",
                18,
            ));
            tokens.push(erc20(
                chain_id,
                address!("0x1c7d4b196cb0c7b01d743fbc6116a902379c7238"),
                "USDC",
                "USD Coin",
                6,
            ));
        }
        _ => {}
    }
    TokenList {
        name: "Default".to_string(),
        tokens,
    }
}
