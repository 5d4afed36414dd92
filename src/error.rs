use alloy::primitives::{B256, TxHash};

use crate::lifecycle::SubscriptionState;

/// Errors surfaced by the subscription client.
///
/// Nothing is recovered locally: every variant aborts the remaining sequence
/// and is propagated to the caller.
#[derive(Debug, thiserror::Error)]
pub enum SubsError {
    #[error("Invalid amount {input}: {reason}")]
    InvalidAmount { input: String, reason: String },
    #[error("Contract deployment failed: {0}")]
    DeploymentFailed(String),
    #[error("Transaction {tx_hash:#x} reverted ({context})")]
    TransactionReverted { tx_hash: TxHash, context: String },
    #[error("No event with signature {signature:#x} in transaction {tx_hash:#x} (reverted: {reverted})")]
    EventNotFound {
        tx_hash: TxHash,
        signature: B256,
        reverted: bool,
    },
    #[error("Invalid subscription transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: SubscriptionState,
        to: SubscriptionState,
    },
    #[error("Artifact error: {0}")]
    Artifact(String),
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SubsError {
    pub fn invalid_amount(input: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, SubsError>;
