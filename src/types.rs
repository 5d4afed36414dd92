//! Client-side values exchanged with the subscription contract.

use std::fmt;

use alloy::primitives::{Address, TxHash, B256, U256};

/// Opaque subscription identifier, taken verbatim from the `Subscribed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubId(pub B256);

impl SubId {
    pub fn as_b256(&self) -> B256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for SubId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<B256> for SubId {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

/// A subscription as reported by the contract's `Subscribed` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub sub_id: SubId,
    pub subscriber: Address,
    /// Fixed-point amount per period.
    pub amount: U256,
    pub period_count: U256,
}

/// Constructor arguments of the subscription contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub period_length_seconds: u64,
    /// Fee token (or payout recipient) the contract is bound to.
    pub token_or_recipient: Address,
    pub owner: Address,
    /// Unix seconds at which the first period starts.
    pub start_timestamp: u64,
}

/// A deployed subscription contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractHandle {
    pub address: Address,
    pub deployment_tx: TxHash,
}
