//! Subscription contract client: deployment, subscribe and unsubscribe.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;

use crate::chain::PendingTransaction;
use crate::context::ClientContext;
use crate::contracts::{encode_constructor_args, IOptimisticSubs};
use crate::correlator::EventCorrelator;
use crate::error::{Result, SubsError};
use crate::lifecycle::{SubscriptionLifecycle, SubscriptionState};
use crate::types::{ContractHandle, DeploymentConfig, SubId, Subscription};

/// Drives one subscription contract on behalf of the context's signer.
///
/// Every blocking method waits for its transaction to be mined before
/// returning, so calls made one after another never overlap on chain.
#[derive(Debug, Clone)]
pub struct SubscriptionClient {
    ctx: ClientContext,
    correlator: EventCorrelator,
    bytecode: Option<Bytes>,
}

impl SubscriptionClient {
    pub fn new(ctx: ClientContext) -> Self {
        let correlator = EventCorrelator::new(ctx.clone());
        Self {
            ctx,
            correlator,
            bytecode: None,
        }
    }

    /// Sets the creation bytecode used by [`deploy`](Self::deploy).
    pub fn with_bytecode(mut self, bytecode: Bytes) -> Self {
        self.bytecode = Some(bytecode);
        self
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    pub fn correlator(&self) -> &EventCorrelator {
        &self.correlator
    }

    /// Deploys the contract and waits for the creation transaction to be mined.
    pub async fn deploy(&self, config: &DeploymentConfig) -> Result<ContractHandle> {
        let bytecode = self
            .bytecode
            .as_ref()
            .ok_or_else(|| SubsError::DeploymentFailed("no contract bytecode configured".into()))?;

        let mut init_code = bytecode.to_vec();
        init_code.extend(encode_constructor_args(
            config.period_length_seconds,
            config.token_or_recipient,
            config.owner,
            config.start_timestamp,
        ));

        tracing::info!(
            target: "optisubs::client",
            period_length = config.period_length_seconds,
            token_or_recipient = %config.token_or_recipient,
            owner = %config.owner,
            start = config.start_timestamp,
            code_len = init_code.len(),
            "Deploying subscription contract"
        );

        let pending = self
            .ctx
            .chain()
            .send_deploy(init_code.into())
            .await
            .map_err(|e| SubsError::DeploymentFailed(e.to_string()))?;

        let receipt = self
            .ctx
            .chain()
            .wait_for_receipt(pending)
            .await
            .map_err(|e| SubsError::DeploymentFailed(e.to_string()))?;

        if !receipt.success {
            return Err(SubsError::DeploymentFailed(format!(
                "creation transaction {:#x} reverted",
                receipt.transaction_hash
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            SubsError::DeploymentFailed(format!(
                "receipt of {:#x} carries no contract address",
                receipt.transaction_hash
            ))
        })?;

        tracing::info!(
            target: "optisubs::client",
            contract = %address,
            tx_hash = %receipt.transaction_hash,
            "Subscription contract deployed"
        );

        Ok(ContractHandle {
            address,
            deployment_tx: receipt.transaction_hash,
        })
    }

    /// Submits `subscribe` without waiting for it to be mined.
    pub async fn subscribe(
        &self,
        handle: &ContractHandle,
        subscriber: Address,
        amount: U256,
        period_count: u64,
    ) -> Result<PendingTransaction> {
        let calldata = IOptimisticSubs::subscribeCall {
            subscriber,
            amount,
            periodCount: U256::from(period_count),
        }
        .abi_encode();

        let pending = self
            .ctx
            .chain()
            .send_call(handle.address, calldata.into())
            .await?;

        tracing::info!(
            target: "optisubs::client",
            contract = %handle.address,
            subscriber = %subscriber,
            amount = %amount,
            period_count,
            tx_hash = %pending.tx_hash,
            "Submitted subscribe"
        );

        Ok(pending)
    }

    /// Submits `unsubscribe(subId)` and waits for it to be mined.
    ///
    /// Fails with [`SubsError::TransactionReverted`] when the contract rejects
    /// the identifier (unknown, or owned by someone else).
    pub async fn unsubscribe(&self, handle: &ContractHandle, sub_id: SubId) -> Result<()> {
        let calldata = IOptimisticSubs::unsubscribeCall {
            subId: sub_id.as_b256(),
        }
        .abi_encode();

        let pending = self
            .ctx
            .chain()
            .send_call(handle.address, calldata.into())
            .await?;

        tracing::info!(
            target: "optisubs::client",
            contract = %handle.address,
            sub_id = %sub_id,
            tx_hash = %pending.tx_hash,
            "Submitted unsubscribe"
        );

        let receipt = self.ctx.chain().wait_for_receipt(pending).await?;
        if !receipt.success {
            return Err(SubsError::TransactionReverted {
                tx_hash: receipt.transaction_hash,
                context: format!("unsubscribe({sub_id}) on {}", handle.address),
            });
        }

        Ok(())
    }

    /// Resolves the subscription created by a `subscribe` transaction.
    ///
    /// Only events emitted by `handle`'s contract are considered.
    pub async fn resolve(
        &self,
        handle: &ContractHandle,
        pending: PendingTransaction,
        expected_signature: B256,
    ) -> Result<Subscription> {
        self.correlator
            .correlate_from(pending, handle.address, expected_signature)
            .await
    }

    /// Submits `subscribe` and records it as pending in `lifecycle`.
    ///
    /// `lifecycle` must not have been used yet.
    pub async fn subscribe_tracked(
        &self,
        handle: &ContractHandle,
        lifecycle: &mut SubscriptionLifecycle,
        subscriber: Address,
        amount: U256,
        period_count: u64,
    ) -> Result<PendingTransaction> {
        lifecycle.ensure(SubscriptionState::NotCreated, SubscriptionState::Pending)?;
        let pending = self
            .subscribe(handle, subscriber, amount, period_count)
            .await?;
        lifecycle.mark_pending(pending)?;
        Ok(pending)
    }

    /// Moves a pending subscription to active by correlating its event.
    ///
    /// On failure the lifecycle stays pending.
    pub async fn activate(
        &self,
        handle: &ContractHandle,
        lifecycle: &mut SubscriptionLifecycle,
        expected_signature: B256,
    ) -> Result<Subscription> {
        let pending = lifecycle.pending_transaction().ok_or(SubsError::InvalidTransition {
            from: lifecycle.state(),
            to: SubscriptionState::Active,
        })?;

        let subscription = self.resolve(handle, pending, expected_signature).await?;
        lifecycle.mark_active(subscription.clone())?;
        Ok(subscription)
    }

    /// Unsubscribes an active subscription and marks it cancelled.
    ///
    /// On failure the lifecycle stays active.
    pub async fn cancel(
        &self,
        handle: &ContractHandle,
        lifecycle: &mut SubscriptionLifecycle,
    ) -> Result<()> {
        lifecycle.ensure(SubscriptionState::Active, SubscriptionState::Cancelled)?;
        let sub_id = match lifecycle.subscription() {
            Some(sub) => sub.sub_id,
            None => {
                return Err(SubsError::InvalidTransition {
                    from: lifecycle.state(),
                    to: SubscriptionState::Cancelled,
                })
            }
        };

        self.unsubscribe(handle, sub_id).await?;
        lifecycle.mark_cancelled()?;

        tracing::info!(
            target: "optisubs::client",
            contract = %handle.address,
            sub_id = %sub_id,
            "Subscription cancelled"
        );
        Ok(())
    }
}
