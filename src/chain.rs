//! Per-chain contract deployments and indexer endpoints.

use alloy_primitives::{Address, address};
use serde::Deserialize;

pub const MAINNET: u64 = 1;
pub const SEPOLIA: u64 = 11_155_111;
pub const BASE: u64 = 8_453;

/// Permit2 is deployed at the same address on every chain.
pub const PERMIT2_ADDRESS: Address = address!("0x000000000022d473030f116ddee9f6b43ac78ba3");

/// Addresses of the v4 contracts the client calls on one chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAddresses {
    pub pool_manager: Address,
    pub position_manager: Address,
    pub state_view: Address,
    pub universal_router: Address,
    #[serde(default = "default_permit2")]
    pub permit2: Address,
}

fn default_permit2() -> Address {
    PERMIT2_ADDRESS
}

/// Known deployments, or `None` for an unsupported chain.
pub fn contract_addresses(chain_id: u64) -> Option<ContractAddresses> {
    match chain_id {
        MAINNET => Some(ContractAddresses {
            pool_manager: address!("0x000000000004444c5dc75cb358380d2e3de08a90"),
            position_manager: address!("0xbd216513d74c8cf14cf4747e6aaa6420ff64ee9e"),
            state_view: address!("0x7ffe42c4a5deea5b0fec41c94c136cf115597227"),
            universal_router: address!("0x66a9893cc07d91d95644aedd05d03f95e1dba8af"),
            permit2: PERMIT2_ADDRESS,
        }),
        SEPOLIA => Some(ContractAddresses {
            pool_manager: address!("0xe03a1074c86cfedd5c142c4f04f1a1536e203543"),
            position_manager: address!("0x429ba70129df741b2ca2a85bc3a2a3328e5c09b4"),
            state_view: address!("0xe1dd9c3fa50edb962e442f60dfbc432e24537e4c"),
            universal_router: address!("0x3a9d48ab9751398bbfa63ad67599bb04e4bdf98b"),
            permit2: PERMIT2_ADDRESS,
        }),
        BASE => Some(ContractAddresses {
            pool_manager: address!("0x498581ff718922c3f8e6a244956af099b2652b2b"),
            position_manager: address!("0x7c5f5a4bbd8fd63184577525326123b519429bdc"),
            state_view: address!("0xa3c0c9b65bad0b08107aa264b0f3db444b867a71"),
            universal_router: address!("0x6ff5693b99212da76ad316178a184ab56d299b43"),
            permit2: PERMIT2_ADDRESS,
        }),
        _ => None,
    }
}

/// Short network name used in indexer subgraph paths.
pub fn network_name(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        MAINNET => Some("mainnet"),
        SEPOLIA => Some("sepolia"),
        BASE => Some("base"),
        _ => None,
    }
}

/// Default GraphQL endpoint of the local graph-node for a chain.
pub fn indexer_url(chain_id: u64) -> Option<String> {
    network_name(chain_id)
        .map(|network| format!("http://localhost:8000/subgraphs/name/uniswap-v4-{network}"))
}
