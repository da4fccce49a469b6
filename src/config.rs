use crate::chain::{ContractAddresses, contract_addresses, indexer_url};
use crate::error::ConfigError;
use crate::storage::ConfiguredStore;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;
pub const DEFAULT_DEADLINE_SECS: u64 = 1_200;
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_PERMIT_EXPIRATION_SECS: u64 = 30 * 24 * 60 * 60;
pub const DEFAULT_PERMIT_SIG_DEADLINE_SECS: u64 = 1_800;

/// Runtime configuration of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    /// GraphQL endpoint; `None` when the chain has no known indexer.
    pub indexer_url: Option<String>,
    /// Where the deployed-pools store persists; in-memory when `None`.
    pub deployed_pools_path: Option<PathBuf>,
    pub contracts: ContractAddresses,
    /// Slippage tolerance applied to quotes and liquidity maxima.
    pub slippage_bps: u32,
    /// Lifetime of submitted transactions.
    pub deadline_secs: u64,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
    /// Lifetime of a Permit2 allowance.
    pub permit_expiration_secs: u64,
    /// Lifetime of a Permit2 signature.
    pub permit_sig_deadline_secs: u64,
}

impl ClientConfig {
    /// Defaults for a chain with a built-in deployment.
    pub fn for_chain(chain_id: u64, rpc_url: impl Into<String>) -> Result<Self, ConfigError> {
        let contracts = contract_addresses(chain_id).ok_or_else(|| ConfigError::InvalidValue {
            name: "CHAIN_ID".to_string(),
            value: format!("{chain_id} (no known deployment)"),
        })?;
        Ok(Self {
            chain_id,
            rpc_url: rpc_url.into(),
            indexer_url: indexer_url(chain_id),
            deployed_pools_path: None,
            contracts,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            deadline_secs: DEFAULT_DEADLINE_SECS,
            receipt_timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
            receipt_poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_INTERVAL_MS),
            permit_expiration_secs: DEFAULT_PERMIT_EXPIRATION_SECS,
            permit_sig_deadline_secs: DEFAULT_PERMIT_SIG_DEADLINE_SECS,
        })
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let chain_id: u64 = required(&lookup, "CHAIN_ID")
            .and_then(|raw| parse_value("CHAIN_ID", &raw))?;
        let rpc_url = sanitize_url(&required(&lookup, "RPC_URL")?);

        let contracts = match lookup("DEPLOYMENT_FILE") {
            Some(path) => load_deployment(Path::new(sanitize_url(&path).as_str()))?,
            None => contract_addresses(chain_id).ok_or_else(|| ConfigError::InvalidValue {
                name: "CHAIN_ID".to_string(),
                value: format!("{chain_id} (no known deployment, set DEPLOYMENT_FILE)"),
            })?,
        };

        let indexer_url = lookup("INDEXER_URL")
            .map(|url| sanitize_url(&url))
            .filter(|url| !url.is_empty())
            .or_else(|| indexer_url(chain_id));

        let deployed_pools_path = lookup("DEPLOYED_POOLS_PATH")
            .map(|path| PathBuf::from(sanitize_url(&path)));

        let config = Self {
            chain_id,
            rpc_url,
            indexer_url,
            deployed_pools_path,
            contracts,
            slippage_bps: optional(&lookup, "SLIPPAGE_BPS", DEFAULT_SLIPPAGE_BPS)?,
            deadline_secs: optional(&lookup, "DEADLINE_SECS", DEFAULT_DEADLINE_SECS)?,
            receipt_timeout: Duration::from_secs(optional(
                &lookup,
                "RECEIPT_TIMEOUT_SECS",
                DEFAULT_RECEIPT_TIMEOUT_SECS,
            )?),
            receipt_poll_interval: Duration::from_millis(optional(
                &lookup,
                "RECEIPT_POLL_INTERVAL_MS",
                DEFAULT_RECEIPT_POLL_INTERVAL_MS,
            )?),
            permit_expiration_secs: optional(
                &lookup,
                "PERMIT_EXPIRATION_SECS",
                DEFAULT_PERMIT_EXPIRATION_SECS,
            )?,
            permit_sig_deadline_secs: optional(
                &lookup,
                "PERMIT_SIG_DEADLINE_SECS",
                DEFAULT_PERMIT_SIG_DEADLINE_SECS,
            )?,
        };

        if config.slippage_bps > 10_000 {
            return Err(ConfigError::InvalidValue {
                name: "SLIPPAGE_BPS".to_string(),
                value: config.slippage_bps.to_string(),
            });
        }

        info!(
            chain_id = config.chain_id,
            rpc_url = %config.rpc_url,
            indexer_url = config.indexer_url.as_deref().unwrap_or("-"),
            "loaded client config"
        );
        Ok(config)
    }

    /// Backing store for the deployed-pools list: the file at
    /// `deployed_pools_path`, or memory when no path is configured.
    pub fn deployed_pools_store(&self) -> ConfiguredStore {
        ConfiguredStore::from_path(self.deployed_pools_path.as_deref())
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => parse_value(name, &raw),
        _ => Ok(default),
    }
}

fn parse_value<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        value: raw.to_string(),
    })
}

/// Sanitize URL by removing surrounding quotes and whitespace
pub fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim();
    let without_quotes = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    without_quotes.to_string()
}

/// Load contract addresses from a JSON deployment file
pub fn load_deployment(path: &Path) -> Result<ContractAddresses, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::DeploymentFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| ConfigError::DeploymentFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
