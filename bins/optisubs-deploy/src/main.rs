//! optisubs-deploy - deploys the subscription contract and exercises it once.
//!
//! ```bash
//! PRIVATEKEY=0x... optisubs-deploy
//! ```
//!
//! Sequence: deploy, approve the fee token, subscribe twice, resolve the
//! second subscription from its `Subscribed` event, then unsubscribe it.
//! Any failure aborts the run with exit status 1.

mod config;

use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use config::Config;
use optisubs::{
    run_scenario, AlloyChain, AlloyChainConfig, ClientContext, ContractArtifact, ContractHandle,
    ScenarioConfig, ScenarioProgress, Subscription,
};

/// Prints each completed step to stdout as it happens.
struct StdoutProgress;

impl ScenarioProgress for StdoutProgress {
    fn deployed(&self, contract: &ContractHandle) {
        println!("deployed to {}", contract.address);
    }

    fn unsubscribed(&self, subscription: &Subscription) {
        println!("unsubscribed {}", subscription.sub_id);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let signer: PrivateKeySigner = config
        .private_key()?
        .parse()
        .context("PRIVATEKEY is not a valid private key")?;
    let rpc_url = config.rpc_url()?;

    tracing::info!("Starting optisubs deployment");
    tracing::info!("RPC URL: {}", rpc_url);
    tracing::info!("Signer: {}", signer.address());
    tracing::info!("Artifact: {}", config.artifact.display());

    let artifact = ContractArtifact::load(&config.artifact)
        .with_context(|| format!("Failed to load {}", config.artifact.display()))?;

    let chain = Arc::new(AlloyChain::new(
        signer,
        AlloyChainConfig {
            rpc_url,
            poll_interval: config.poll_interval(),
        },
    ));
    let ctx = ClientContext::new(chain);

    let report = run_scenario(
        &ctx,
        artifact.bytecode,
        &ScenarioConfig::default(),
        &StdoutProgress,
    )
    .await?;

    tracing::info!(
        contract = %report.contract.address,
        sub_id = %report.subscription.sub_id,
        state = ?report.final_state,
        "Scenario complete"
    );

    Ok(())
}
