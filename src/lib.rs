//! optisubs - client for an on-chain subscription contract.
//!
//! Deploys the contract, funds it through an ERC20 allowance, creates
//! subscriptions and recovers their identifiers from emitted events.
//!
//! # Components
//!
//! - [`amount`]: decimal to fixed-point conversion
//! - [`TokenApprover`]: ERC20 `approve` and wait
//! - [`EventCorrelator`]: transaction -> `Subscribed` event -> [`Subscription`]
//! - [`SubscriptionClient`]: deploy / subscribe / unsubscribe, lifecycle tracking
//! - [`ChainClient`]: transport seam, implemented by [`AlloyChain`] and [`mock::MockChain`]
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use optisubs::{AlloyChain, AlloyChainConfig, ClientContext, ScenarioConfig, run_scenario};
//!
//! let chain = Arc::new(AlloyChain::new(signer, AlloyChainConfig::new(rpc_url)));
//! let ctx = ClientContext::new(chain);
//! let report = run_scenario(&ctx, bytecode, &ScenarioConfig::default(), &()).await?;
//! println!("cancelled {}", report.subscription.sub_id);
//! ```

pub mod amount;
pub mod approver;
pub mod artifact;
pub mod chain;
pub mod client;
pub mod context;
pub mod contracts;
pub mod correlator;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod mock;
pub mod scenario;
pub mod types;

pub use approver::TokenApprover;
pub use artifact::ContractArtifact;
pub use chain::{AlloyChain, AlloyChainConfig, ChainClient, PendingTransaction, Receipt};
pub use client::SubscriptionClient;
pub use context::ClientContext;
pub use contracts::SUBSCRIBED_SIGNATURE;
pub use correlator::EventCorrelator;
pub use error::{Result, SubsError};
pub use events::{ContractEvent, EventDecoders, LogDecoder};
pub use lifecycle::{SubscriptionLifecycle, SubscriptionState};
pub use scenario::{run_scenario, ScenarioConfig, ScenarioProgress, ScenarioReport};
pub use types::{ContractHandle, DeploymentConfig, SubId, Subscription};
