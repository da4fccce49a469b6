//! The wallet seam: everything the transaction flows need from a connected
//! account and its RPC endpoint.

use crate::error::TxError;
use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;

/// Provider error fragments that mean the user declined in their wallet.
const REJECTION_MARKERS: [&str; 5] = [
    "user rejected",
    "user denied",
    "action_rejected",
    "rejected the request",
    "request rejected",
];

/// Maps a provider error message to [`TxError::Rejected`] when it reports
/// a user rejection, [`TxError::Rpc`] otherwise.
pub fn classify_rpc_error(message: impl Into<String>) -> TxError {
    let message = message.into();
    let lower = message.to_lowercase();
    if REJECTION_MARKERS.iter().any(|m| lower.contains(m)) {
        TxError::Rejected
    } else {
        TxError::Rpc(message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub data: Bytes,
    /// Native value attached to the call.
    pub value: U256,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    /// `false` when the transaction reverted.
    pub status: bool,
}

#[async_trait]
pub trait WalletClient: Send + Sync {
    fn account(&self) -> Address;

    fn chain_id(&self) -> u64;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, TxError>;

    /// Signs a 32-byte digest, returning the 65-byte `r || s || v` signature.
    async fn sign_hash(&self, hash: B256) -> Result<Bytes, TxError>;

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, TxError>;

    /// `None` while the transaction is pending.
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, TxError>;
}

#[cfg(feature = "onchain")]
pub use alloy_impl::AlloyWallet;

#[cfg(feature = "onchain")]
mod alloy_impl {
    use super::*;
    use alloy_provider::Provider;
    use alloy_rpc_types_eth::TransactionRequest;
    use alloy_signer::Signer;
    use tracing::debug;

    /// [`WalletClient`] over an alloy provider. The provider must carry a
    /// wallet filler for the signer's account so it can send transactions.
    pub struct AlloyWallet<P, S> {
        provider: P,
        signer: S,
        chain_id: u64,
    }

    impl<P, S> AlloyWallet<P, S>
    where
        P: Provider + Send + Sync,
        S: Signer + Send + Sync,
    {
        pub fn new(provider: P, signer: S, chain_id: u64) -> Self {
            Self {
                provider,
                signer,
                chain_id,
            }
        }
    }

    #[async_trait]
    impl<P, S> WalletClient for AlloyWallet<P, S>
    where
        P: Provider + Send + Sync,
        S: Signer + Send + Sync,
    {
        fn account(&self) -> Address {
            self.signer.address()
        }

        fn chain_id(&self) -> u64 {
            self.chain_id
        }

        async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, TxError> {
            let tx = TransactionRequest::default()
                .from(self.account())
                .to(to)
                .input(data.into());
            self.provider
                .call(tx)
                .await
                .map_err(|e| classify_rpc_error(e.to_string()))
        }

        async fn sign_hash(&self, hash: B256) -> Result<Bytes, TxError> {
            let signature = self
                .signer
                .sign_hash(&hash)
                .await
                .map_err(|e| match classify_rpc_error(e.to_string()) {
                    TxError::Rejected => TxError::Rejected,
                    _ => TxError::Signing(e.to_string()),
                })?;
            Ok(Bytes::from(signature.as_bytes().to_vec()))
        }

        async fn send_transaction(&self, tx: TxRequest) -> Result<B256, TxError> {
            let request = TransactionRequest::default()
                .from(self.account())
                .to(tx.to)
                .value(tx.value)
                .input(tx.data.into());
            let pending = self
                .provider
                .send_transaction(request)
                .await
                .map_err(|e| classify_rpc_error(e.to_string()))?;
            let hash = *pending.tx_hash();
            debug!(%hash, "transaction sent");
            Ok(hash)
        }

        async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, TxError> {
            let receipt = self
                .provider
                .get_transaction_receipt(hash)
                .await
                .map_err(|e| classify_rpc_error(e.to_string()))?;
            Ok(receipt.map(|r| TxReceipt {
                transaction_hash: r.transaction_hash,
                block_number: r.block_number,
                status: r.status(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_recognised() {
        for message in [
            "User rejected the request.",
            "MetaMask Tx Signature: User denied transaction signature.",
            "ethers-user-denied: ACTION_REJECTED",
            "code 4001: request rejected",
        ] {
            assert_eq!(classify_rpc_error(message), TxError::Rejected, "{message}");
        }
    }

    #[test]
    fn other_errors_are_rpc() {
        assert_eq!(
            classify_rpc_error("execution reverted: STF"),
            TxError::Rpc("execution reverted: STF".to_string())
        );
        assert_eq!(
            classify_rpc_error("connection refused"),
            TxError::Rpc("connection refused".to_string())
        );
    }
}
