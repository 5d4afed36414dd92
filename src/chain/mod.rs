//! Transport seam between the subscription client and an EVM node.
//!
//! Components never talk to a provider directly. They go through
//! [`ChainClient`], which is implemented over alloy by [`AlloyChain`] and by
//! the in-memory [`MockChain`](crate::mock::MockChain) used in tests.

pub mod alloy_chain;

use alloy::primitives::{Address, Bytes, Log, TxHash};
use async_trait::async_trait;

use crate::error::Result;

pub use alloy_chain::{AlloyChain, AlloyChainConfig};

/// Mined transaction, reduced to what the client consumes.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    /// `false` when the transaction reverted.
    pub success: bool,
    /// Set for contract-creation transactions.
    pub contract_address: Option<Address>,
    /// Log entries in emission order.
    pub logs: Vec<Log>,
}

/// A submitted transaction whose receipt has not been observed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingTransaction {
    pub tx_hash: TxHash,
}

impl PendingTransaction {
    pub fn new(tx_hash: TxHash) -> Self {
        Self { tx_hash }
    }
}

/// Minimal chain access needed by the subscription workflow.
///
/// Implementations must submit transactions one at a time from a single
/// signing identity, handing out nonces in submission order.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the signing identity every transaction is sent from.
    fn signer_address(&self) -> Address;

    /// Submits a contract-creation transaction carrying `init_code`.
    async fn send_deploy(&self, init_code: Bytes) -> Result<PendingTransaction>;

    /// Submits a call to `to` with the given calldata.
    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<PendingTransaction>;

    /// Blocks until the transaction is mined and returns its receipt.
    ///
    /// There is no deadline: a transaction that never lands blocks forever.
    async fn wait_for_receipt(&self, pending: PendingTransaction) -> Result<Receipt>;
}
