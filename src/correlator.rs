//! Resolves the subscription created by a transaction from its receipt.
//!
//! `subscribe` does not return the identifier it assigns; the only place it
//! appears is the `Subscribed` event in the mined receipt. The correlator
//! waits for that receipt, decodes its logs in emission order and keeps the
//! first one carrying the expected signature. When the emitting contract is
//! known, logs from any other address are ignored.

use alloy::primitives::{Address, B256};

use crate::chain::{PendingTransaction, Receipt};
use crate::context::ClientContext;
use crate::error::{Result, SubsError};
use crate::events::{ContractEvent, DecodedLog};
use crate::types::Subscription;

#[derive(Debug, Clone)]
pub struct EventCorrelator {
    ctx: ClientContext,
}

impl EventCorrelator {
    pub fn new(ctx: ClientContext) -> Self {
        Self { ctx }
    }

    /// Waits for `pending` to be mined and returns the subscription announced
    /// by the first log whose signature is `expected_signature`.
    ///
    /// Fails with [`SubsError::EventNotFound`] when no such log decodes,
    /// including when the transaction reverted.
    pub async fn correlate(
        &self,
        pending: PendingTransaction,
        expected_signature: B256,
    ) -> Result<Subscription> {
        let receipt = self.ctx.chain().wait_for_receipt(pending).await?;
        self.correlate_receipt(&receipt, expected_signature)
    }

    /// Like [`correlate`](Self::correlate), but only logs emitted by
    /// `emitter` are considered.
    pub async fn correlate_from(
        &self,
        pending: PendingTransaction,
        emitter: Address,
        expected_signature: B256,
    ) -> Result<Subscription> {
        let receipt = self.ctx.chain().wait_for_receipt(pending).await?;
        self.correlate_receipt_from(&receipt, emitter, expected_signature)
    }

    /// Correlation over an already mined receipt.
    pub fn correlate_receipt(
        &self,
        receipt: &Receipt,
        expected_signature: B256,
    ) -> Result<Subscription> {
        self.find_subscription(receipt, None, expected_signature)
    }

    /// Correlation over an already mined receipt, restricted to `emitter`.
    pub fn correlate_receipt_from(
        &self,
        receipt: &Receipt,
        emitter: Address,
        expected_signature: B256,
    ) -> Result<Subscription> {
        self.find_subscription(receipt, Some(emitter), expected_signature)
    }

    fn find_subscription(
        &self,
        receipt: &Receipt,
        emitter: Option<Address>,
        expected_signature: B256,
    ) -> Result<Subscription> {
        let not_found = || SubsError::EventNotFound {
            tx_hash: receipt.transaction_hash,
            signature: expected_signature,
            reverted: !receipt.success,
        };

        if !receipt.success {
            tracing::warn!(
                target: "optisubs::correlator",
                tx_hash = %receipt.transaction_hash,
                "Transaction reverted, no event to correlate"
            );
            return Err(not_found());
        }

        let matched = self
            .ctx
            .decoders()
            .decode_receipt(receipt)
            .into_iter()
            .filter(|decoded| emitter.is_none_or(|address| decoded.emitter == address))
            .find(|decoded| decoded.event.signature() == expected_signature);

        match matched {
            Some(DecodedLog {
                index,
                emitter,
                event: ContractEvent::Subscribed(subscription),
            }) => {
                tracing::info!(
                    target: "optisubs::correlator",
                    tx_hash = %receipt.transaction_hash,
                    log_index = index,
                    contract = %emitter,
                    sub_id = %subscription.sub_id,
                    "Correlated subscription"
                );
                Ok(subscription)
            }
            Some(other) => {
                tracing::warn!(
                    target: "optisubs::correlator",
                    tx_hash = %receipt.transaction_hash,
                    log_index = other.index,
                    "Matched event does not describe a subscription"
                );
                Err(not_found())
            }
            None => {
                tracing::warn!(
                    target: "optisubs::correlator",
                    tx_hash = %receipt.transaction_hash,
                    signature = %expected_signature,
                    logs = receipt.logs.len(),
                    "No matching event in receipt"
                );
                Err(not_found())
            }
        }
    }
}
