//! Client-side view of a subscription's life.
//!
//! ```text
//! NotCreated -> Pending -> Active -> Cancelled
//! ```
//!
//! Every transition is checked; an illegal one returns
//! [`SubsError::InvalidTransition`] and leaves the value untouched.

use crate::chain::PendingTransaction;
use crate::error::{Result, SubsError};
use crate::types::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    NotCreated,
    /// `subscribe` submitted, identifier not known yet.
    Pending,
    /// `Subscribed` event correlated, identifier known.
    Active,
    /// `unsubscribe` mined.
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubscriptionLifecycle {
    #[default]
    NotCreated,
    Pending(PendingTransaction),
    Active(Subscription),
    Cancelled(Subscription),
}

impl SubscriptionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubscriptionState {
        match self {
            Self::NotCreated => SubscriptionState::NotCreated,
            Self::Pending(_) => SubscriptionState::Pending,
            Self::Active(_) => SubscriptionState::Active,
            Self::Cancelled(_) => SubscriptionState::Cancelled,
        }
    }

    pub fn pending_transaction(&self) -> Option<PendingTransaction> {
        match self {
            Self::Pending(pending) => Some(*pending),
            _ => None,
        }
    }

    /// The correlated subscription, once known.
    pub fn subscription(&self) -> Option<&Subscription> {
        match self {
            Self::Active(sub) | Self::Cancelled(sub) => Some(sub),
            _ => None,
        }
    }

    /// Fails unless the current state is `expected`.
    pub fn ensure(&self, expected: SubscriptionState, target: SubscriptionState) -> Result<()> {
        let from = self.state();
        if from == expected {
            Ok(())
        } else {
            Err(SubsError::InvalidTransition { from, to: target })
        }
    }

    pub fn mark_pending(&mut self, pending: PendingTransaction) -> Result<()> {
        self.ensure(SubscriptionState::NotCreated, SubscriptionState::Pending)?;
        *self = Self::Pending(pending);
        Ok(())
    }

    pub fn mark_active(&mut self, subscription: Subscription) -> Result<()> {
        self.ensure(SubscriptionState::Pending, SubscriptionState::Active)?;
        *self = Self::Active(subscription);
        Ok(())
    }

    pub fn mark_cancelled(&mut self) -> Result<()> {
        self.ensure(SubscriptionState::Active, SubscriptionState::Cancelled)?;
        if let Self::Active(sub) = std::mem::take(self) {
            *self = Self::Cancelled(sub);
        }
        Ok(())
    }
}
