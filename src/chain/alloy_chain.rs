//! [`ChainClient`] implementation backed by an alloy HTTP provider.

use std::time::Duration;

use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::sleep;
use url::Url;

use super::{ChainClient, PendingTransaction, Receipt};
use crate::error::{Result, SubsError};

/// Default interval between `eth_getTransactionReceipt` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct AlloyChainConfig {
    pub rpc_url: Url,
    pub poll_interval: Duration,
}

impl AlloyChainConfig {
    pub fn new(rpc_url: Url) -> Self {
        Self {
            rpc_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Signs locally and submits over JSON-RPC.
///
/// Submissions are serialised through `next_nonce`: the lock is held while a
/// transaction is being sent, so two calls can never race for the same nonce.
pub struct AlloyChain {
    provider: DynProvider,
    signer: Address,
    poll_interval: Duration,
    next_nonce: Mutex<Option<u64>>,
}

impl AlloyChain {
    pub fn new(signer: PrivateKeySigner, config: AlloyChainConfig) -> Self {
        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(config.rpc_url.clone())
            .erased();

        tracing::info!(
            target: "optisubs::chain",
            rpc_url = %config.rpc_url,
            signer = %address,
            "Connected alloy provider"
        );

        Self::from_provider(provider, address, config.poll_interval)
    }

    /// Wraps an already built provider that signs (or has the node sign) for
    /// `signer`.
    pub fn from_provider(provider: DynProvider, signer: Address, poll_interval: Duration) -> Self {
        Self {
            provider,
            signer,
            poll_interval,
            next_nonce: Mutex::new(None),
        }
    }

    async fn submit(&self, tx: TransactionRequest) -> Result<PendingTransaction> {
        let mut next_nonce = self.next_nonce.lock().await;

        let nonce = match *next_nonce {
            Some(nonce) => nonce,
            None => self
                .provider
                .get_transaction_count(self.signer)
                .pending()
                .await
                .map_err(SubsError::transport)?,
        };

        let tx = tx.with_from(self.signer).with_nonce(nonce);
        match self.provider.send_transaction(tx).await {
            Ok(pending) => {
                *next_nonce = Some(nonce + 1);
                let tx_hash = *pending.tx_hash();
                tracing::debug!(
                    target: "optisubs::chain",
                    tx_hash = %tx_hash,
                    nonce,
                    "Submitted transaction"
                );
                Ok(PendingTransaction::new(tx_hash))
            }
            Err(err) => {
                // Re-read the nonce from the node on the next submission.
                *next_nonce = None;
                Err(SubsError::transport(err))
            }
        }
    }
}

#[async_trait]
impl ChainClient for AlloyChain {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn send_deploy(&self, init_code: Bytes) -> Result<PendingTransaction> {
        self.submit(TransactionRequest::default().with_deploy_code(init_code))
            .await
    }

    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<PendingTransaction> {
        self.submit(TransactionRequest::default().with_to(to).with_input(calldata))
            .await
    }

    async fn wait_for_receipt(&self, pending: PendingTransaction) -> Result<Receipt> {
        let mut polls: u64 = 0;
        loop {
            let receipt = self
                .provider
                .get_transaction_receipt(pending.tx_hash)
                .await
                .map_err(SubsError::transport)?;

            if let Some(receipt) = receipt {
                tracing::debug!(
                    target: "optisubs::chain",
                    tx_hash = %pending.tx_hash,
                    polls,
                    "Transaction mined"
                );
                return Ok(into_receipt(&receipt));
            }

            polls += 1;
            tracing::trace!(
                target: "optisubs::chain",
                tx_hash = %pending.tx_hash,
                polls,
                "Receipt not available yet"
            );
            sleep(self.poll_interval).await;
        }
    }
}

fn into_receipt(receipt: &TransactionReceipt) -> Receipt {
    Receipt {
        transaction_hash: ReceiptResponse::transaction_hash(receipt),
        success: ReceiptResponse::status(receipt),
        contract_address: ReceiptResponse::contract_address(receipt),
        logs: receipt
            .inner
            .logs()
            .iter()
            .map(|log| log.inner.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{b256, B256};
    use alloy::transports::mock::Asserter;
    use serde_json::{json, Value};

    const SIGNER: Address = Address::repeat_byte(0xa1);
    const TX_A: B256 = b256!("00000000000000000000000000000000000000000000000000000000000000aa");
    const TX_B: B256 = b256!("00000000000000000000000000000000000000000000000000000000000000bb");

    /// Node-signed chain over a mocked transport; responses are consumed in
    /// request order.
    fn mocked_chain() -> (Asserter, AlloyChain) {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone())
            .erased();
        let chain = AlloyChain::from_provider(provider, SIGNER, Duration::from_millis(1));
        (asserter, chain)
    }

    async fn cached_nonce(chain: &AlloyChain) -> Option<u64> {
        *chain.next_nonce.lock().await
    }

    fn rpc_log(address: Address, topic: B256, index: u64, tx_hash: B256) -> Value {
        json!({
            "address": address,
            "topics": [topic],
            "data": "0x",
            "blockHash": B256::repeat_byte(0x0b),
            "blockNumber": "0x1",
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "logIndex": format!("{index:#x}"),
            "removed": false
        })
    }

    fn rpc_receipt(tx_hash: B256, status: bool, contract: Option<Address>, logs: Vec<Value>) -> Value {
        json!({
            "type": "0x2",
            "status": if status { "0x1" } else { "0x0" },
            "cumulativeGasUsed": "0x5208",
            "logs": logs,
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "transactionHash": tx_hash,
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0x0b),
            "blockNumber": "0x1",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x1",
            "from": SIGNER,
            "to": contract.map_or(Some(Address::repeat_byte(0xcc)), |_| None),
            "contractAddress": contract
        })
    }

    #[tokio::test]
    async fn test_consecutive_submissions_use_consecutive_nonces() {
        let (asserter, chain) = mocked_chain();
        asserter.push_success(&"0x5");
        asserter.push_success(&TX_A);
        asserter.push_success(&TX_B);

        let first = chain
            .send_call(Address::repeat_byte(0xcc), Bytes::from(vec![1u8]))
            .await
            .unwrap();
        assert_eq!(first.tx_hash, TX_A);
        assert_eq!(cached_nonce(&chain).await, Some(6));

        // The second submission reuses the cached nonce instead of asking the
        // node again; a second count request would have consumed TX_B.
        let second = chain
            .send_call(Address::repeat_byte(0xcc), Bytes::from(vec![2u8]))
            .await
            .unwrap();
        assert_eq!(second.tx_hash, TX_B);
        assert_eq!(cached_nonce(&chain).await, Some(7));
    }

    #[tokio::test]
    async fn test_failed_send_rereads_nonce() {
        let (asserter, chain) = mocked_chain();
        asserter.push_success(&"0x5");
        asserter.push_failure_msg("nonce too low");
        asserter.push_success(&"0x9");
        asserter.push_success(&TX_A);

        let err = chain.send_deploy(Bytes::from(vec![0x60])).await.unwrap_err();
        assert!(matches!(err, SubsError::Transport(_)));
        assert_eq!(cached_nonce(&chain).await, None);

        let pending = chain.send_deploy(Bytes::from(vec![0x60])).await.unwrap();
        assert_eq!(pending.tx_hash, TX_A);
        assert_eq!(cached_nonce(&chain).await, Some(10));
    }

    #[tokio::test]
    async fn test_missing_receipt_is_polled_again() {
        let (asserter, chain) = mocked_chain();
        asserter.push_success(&Value::Null);
        asserter.push_success(&Value::Null);
        asserter.push_success(&rpc_receipt(TX_A, true, None, Vec::new()));

        let receipt = chain
            .wait_for_receipt(PendingTransaction::new(TX_A))
            .await
            .unwrap();
        assert_eq!(receipt.transaction_hash, TX_A);
        assert!(receipt.success);
    }

    #[tokio::test]
    async fn test_receipt_conversion() {
        let (asserter, chain) = mocked_chain();
        let contract = Address::repeat_byte(0xc0);
        asserter.push_success(&rpc_receipt(
            TX_A,
            false,
            Some(contract),
            vec![
                rpc_log(contract, B256::repeat_byte(0x01), 0, TX_A),
                rpc_log(Address::repeat_byte(0xdd), B256::repeat_byte(0x02), 1, TX_A),
            ],
        ));

        let receipt = chain
            .wait_for_receipt(PendingTransaction::new(TX_A))
            .await
            .unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.contract_address, Some(contract));
        assert_eq!(receipt.logs.len(), 2);
        assert_eq!(receipt.logs[0].address, contract);
        assert_eq!(receipt.logs[0].topics(), &[B256::repeat_byte(0x01)]);
        assert_eq!(receipt.logs[1].address, Address::repeat_byte(0xdd));
    }

    #[tokio::test]
    async fn test_transport_error_while_polling() {
        let (asserter, chain) = mocked_chain();
        asserter.push_failure_msg("connection reset");

        let err = chain
            .wait_for_receipt(PendingTransaction::new(TX_A))
            .await
            .unwrap_err();
        assert!(matches!(err, SubsError::Transport(_)));
    }
}
