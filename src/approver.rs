//! ERC20 allowance granting.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;

use crate::context::ClientContext;
use crate::contracts::IERC20;
use crate::error::{Result, SubsError};
use crate::events::ContractEvent;

/// Grants allowances on a single token contract.
#[derive(Debug, Clone)]
pub struct TokenApprover {
    ctx: ClientContext,
    token: Address,
}

impl TokenApprover {
    pub fn new(ctx: ClientContext, token: Address) -> Self {
        Self { ctx, token }
    }

    pub fn token(&self) -> Address {
        self.token
    }

    /// Calls `approve(spender, amount)` on the token and waits until it is mined.
    ///
    /// Fails with [`SubsError::TransactionReverted`] if the token rejects the
    /// call. The call's `bool` return value is not part of the receipt, so a
    /// token that answers `false` without reverting is caught by the missing
    /// `Approval(owner, spender, amount)` event instead.
    pub async fn approve(&self, spender: Address, amount: U256) -> Result<()> {
        let calldata = IERC20::approveCall { spender, amount }.abi_encode();

        let pending = self
            .ctx
            .chain()
            .send_call(self.token, calldata.into())
            .await?;

        tracing::info!(
            target: "optisubs::approver",
            token = %self.token,
            spender = %spender,
            amount = %amount,
            tx_hash = %pending.tx_hash,
            "Submitted approve"
        );

        let receipt = self.ctx.chain().wait_for_receipt(pending).await?;
        if !receipt.success {
            return Err(SubsError::TransactionReverted {
                tx_hash: receipt.transaction_hash,
                context: format!("approve({spender}, {amount}) on token {}", self.token),
            });
        }

        let owner = self.ctx.signer();
        let approval = self
            .ctx
            .decoders()
            .decode_receipt(&receipt)
            .into_iter()
            .find_map(|decoded| match decoded.event {
                ContractEvent::Approval(approval)
                    if approval.token == self.token
                        && approval.owner == owner
                        && approval.spender == spender =>
                {
                    Some(approval)
                }
                _ => None,
            });

        let Some(approval) = approval else {
            tracing::warn!(
                target: "optisubs::approver",
                tx_hash = %receipt.transaction_hash,
                token = %self.token,
                spender = %spender,
                "Approve mined without an Approval event"
            );
            return Err(SubsError::TransactionReverted {
                tx_hash: receipt.transaction_hash,
                context: format!(
                    "approve({spender}, {amount}) on token {} emitted no Approval event",
                    self.token
                ),
            });
        };

        tracing::debug!(
            target: "optisubs::approver",
            owner = %approval.owner,
            spender = %approval.spender,
            value = %approval.value,
            "Allowance confirmed by Approval event"
        );

        Ok(())
    }
}
