//! The fixed end-to-end exercise of a freshly deployed subscription contract.
//!
//! deploy -> approve -> subscribe (untracked) -> subscribe (tracked)
//! -> correlate -> unsubscribe
//!
//! Each step starts only once the previous one has been submitted (and mined,
//! where the step waits for it). The first error aborts the run; nothing is
//! rolled back.

use alloy::primitives::{address, Address, Bytes, TxHash, B256};

use crate::amount::{encode, DEFAULT_DECIMALS};
use crate::approver::TokenApprover;
use crate::client::SubscriptionClient;
use crate::context::ClientContext;
use crate::contracts::SUBSCRIBED_SIGNATURE;
use crate::error::Result;
use crate::lifecycle::{SubscriptionLifecycle, SubscriptionState};
use crate::types::{ContractHandle, DeploymentConfig, Subscription};

/// DAI on Optimism.
pub const DEFAULT_FEE_TOKEN: Address = address!("da10009cbd5d07dd0cecc66161fc93d7c9000da1");

/// Token (or payout recipient) the deployed contract is bound to.
pub const DEFAULT_TOKEN_OR_RECIPIENT: Address =
    address!("85c6Cd5fC71AF35e6941d7b53564AC0A68E09f5C");

/// Eight days.
pub const DEFAULT_PERIOD_LENGTH_SECONDS: u64 = 8 * 24 * 60 * 60;

pub const DEFAULT_START_TIMESTAMP: u64 = 1_694_919_024;

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Token the allowance is granted on.
    pub fee_token: Address,
    pub token_decimals: u8,
    pub period_length_seconds: u64,
    pub token_or_recipient: Address,
    pub start_timestamp: u64,
    /// Allowance granted to the deployed contract, in whole tokens.
    pub allowance: f64,
    /// Amount of the untracked subscription.
    pub first_amount: f64,
    /// Amount of the subscription that is resolved and cancelled.
    pub tracked_amount: f64,
    pub period_count: u64,
    pub subscribed_signature: B256,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            fee_token: DEFAULT_FEE_TOKEN,
            token_decimals: DEFAULT_DECIMALS,
            period_length_seconds: DEFAULT_PERIOD_LENGTH_SECONDS,
            token_or_recipient: DEFAULT_TOKEN_OR_RECIPIENT,
            start_timestamp: DEFAULT_START_TIMESTAMP,
            allowance: 1.0,
            first_amount: 0.1,
            tracked_amount: 0.15,
            period_count: 2,
            subscribed_signature: SUBSCRIBED_SIGNATURE,
        }
    }
}

/// Observer notified as the run crosses its visible step boundaries.
///
/// Each hook fires as soon as its step completes, so a later failure does
/// not hide the progress already made.
pub trait ScenarioProgress: Send + Sync {
    fn deployed(&self, _contract: &ContractHandle) {}

    fn unsubscribed(&self, _subscription: &Subscription) {}
}

/// Discards all progress.
impl ScenarioProgress for () {}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub contract: ContractHandle,
    /// Hash of the fire-and-forget subscribe; its receipt is never awaited.
    pub untracked_subscribe_tx: TxHash,
    pub subscription: Subscription,
    pub final_state: SubscriptionState,
}

/// Runs the whole sequence against `bytecode`, deployed from the context's signer.
pub async fn run_scenario(
    ctx: &ClientContext,
    bytecode: Bytes,
    config: &ScenarioConfig,
    progress: &dyn ScenarioProgress,
) -> Result<ScenarioReport> {
    let signer = ctx.signer();

    // Encode everything up front so bad amounts fail before any transaction.
    let allowance = encode(config.allowance, config.token_decimals)?;
    let first_amount = encode(config.first_amount, config.token_decimals)?;
    let tracked_amount = encode(config.tracked_amount, config.token_decimals)?;

    let client = SubscriptionClient::new(ctx.clone()).with_bytecode(bytecode);
    let contract = client
        .deploy(&DeploymentConfig {
            period_length_seconds: config.period_length_seconds,
            token_or_recipient: config.token_or_recipient,
            owner: signer,
            start_timestamp: config.start_timestamp,
        })
        .await?;
    tracing::info!(target: "optisubs::scenario", "deployed to {}", contract.address);
    progress.deployed(&contract);

    TokenApprover::new(ctx.clone(), config.fee_token)
        .approve(contract.address, allowance)
        .await?;

    let untracked = client
        .subscribe(&contract, signer, first_amount, config.period_count)
        .await?;

    let mut lifecycle = SubscriptionLifecycle::new();
    client
        .subscribe_tracked(
            &contract,
            &mut lifecycle,
            signer,
            tracked_amount,
            config.period_count,
        )
        .await?;

    let subscription = client
        .activate(&contract, &mut lifecycle, config.subscribed_signature)
        .await?;

    client.cancel(&contract, &mut lifecycle).await?;
    tracing::info!(
        target: "optisubs::scenario",
        sub_id = %subscription.sub_id,
        "unsubscribed"
    );
    progress.unsubscribed(&subscription);

    Ok(ScenarioReport {
        contract,
        untracked_subscribe_tx: untracked.tx_hash,
        subscription,
        final_state: lifecycle.state(),
    })
}
