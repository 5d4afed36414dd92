//! In-memory [`ChainClient`] that plays both the subscription contract and
//! its fee token.
//!
//! Transactions are "mined" as soon as they are submitted: the receipt is
//! computed at submission time and handed out by `wait_for_receipt`. Every
//! call is recorded in an operation journal so tests can check ordering.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use alloy::primitives::{keccak256, Address, Bytes, Log, TxHash, B256, U256};
use alloy::sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;

use crate::chain::{ChainClient, PendingTransaction, Receipt};
use crate::contracts::{SubscribedPayload, IERC20, IOptimisticSubs, SUBSCRIBED_SIGNATURE};
use crate::error::{Result, SubsError};

/// One entry of the mock's operation journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Deploy { tx_hash: TxHash, nonce: u64 },
    Approve { tx_hash: TxHash, nonce: u64, spender: Address, amount: U256 },
    Subscribe { tx_hash: TxHash, nonce: u64, amount: U256 },
    Unsubscribe { tx_hash: TxHash, nonce: u64, sub_id: B256 },
    Call { tx_hash: TxHash, nonce: u64, to: Address },
    Awaited { tx_hash: TxHash },
}

#[derive(Debug, Default)]
struct MockState {
    nonce: u64,
    journal: Vec<MockOp>,
    receipts: HashMap<TxHash, Receipt>,
    contracts: HashSet<Address>,
    /// subId -> owner
    subscriptions: HashMap<B256, Address>,
    allowances: HashMap<(Address, Address), U256>,
    revert_deployments: bool,
    silence_subscribed: bool,
    refuse_approvals: bool,
    fail_submissions: bool,
}

#[derive(Debug)]
pub struct MockChain {
    signer: Address,
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new(signer: Address) -> Self {
        Self {
            signer,
            state: Mutex::new(MockState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every creation transaction revert.
    pub fn revert_deployments(&self) {
        self.state().revert_deployments = true;
    }

    /// Makes `subscribe` succeed without emitting `Subscribed`.
    pub fn silence_subscribed(&self) {
        self.state().silence_subscribed = true;
    }

    /// Makes the token answer `approve` with `false` instead of reverting.
    pub fn refuse_approvals(&self) {
        self.state().refuse_approvals = true;
    }

    /// Makes every submission fail at the transport level.
    pub fn fail_submissions(&self) {
        self.state().fail_submissions = true;
    }

    /// Stores a hand-built receipt and returns a handle to it.
    pub fn insert_receipt(&self, receipt: Receipt) -> PendingTransaction {
        let tx_hash = receipt.transaction_hash;
        self.state().receipts.insert(tx_hash, receipt);
        PendingTransaction::new(tx_hash)
    }

    pub fn journal(&self) -> Vec<MockOp> {
        self.state().journal.clone()
    }

    pub fn allowance(&self, token: Address, spender: Address) -> U256 {
        self.state()
            .allowances
            .get(&(token, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Identifiers of subscriptions that are still live.
    pub fn live_subscriptions(&self) -> Vec<B256> {
        self.state().subscriptions.keys().copied().collect()
    }

    fn next_tx(&self, state: &mut MockState) -> Result<(TxHash, u64)> {
        if state.fail_submissions {
            return Err(SubsError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock transport down",
            )));
        }
        let nonce = state.nonce;
        state.nonce += 1;
        let tx_hash = keccak256((self.signer, U256::from(nonce)).abi_encode());
        Ok((tx_hash, nonce))
    }

    fn execute_call(
        &self,
        state: &mut MockState,
        tx_hash: TxHash,
        nonce: u64,
        to: Address,
        calldata: &[u8],
    ) -> Receipt {
        let mut receipt = Receipt {
            transaction_hash: tx_hash,
            success: false,
            contract_address: None,
            logs: Vec::new(),
        };

        if state.contracts.contains(&to) {
            if let Ok(call) = IOptimisticSubs::subscribeCall::abi_decode(calldata) {
                state.journal.push(MockOp::Subscribe {
                    tx_hash,
                    nonce,
                    amount: call.amount,
                });
                let sub_id = keccak256((to, tx_hash).abi_encode());
                state.subscriptions.insert(sub_id, self.signer);
                receipt.success = true;
                if !state.silence_subscribed {
                    let payload: SubscribedPayload =
                        (sub_id, call.subscriber, call.amount, call.periodCount);
                    receipt.logs.push(Log::new_unchecked(
                        to,
                        vec![SUBSCRIBED_SIGNATURE],
                        Bytes::from(payload.abi_encode()),
                    ));
                }
                return receipt;
            }

            if let Ok(call) = IOptimisticSubs::unsubscribeCall::abi_decode(calldata) {
                state.journal.push(MockOp::Unsubscribe {
                    tx_hash,
                    nonce,
                    sub_id: call.subId,
                });
                if state.subscriptions.get(&call.subId) == Some(&self.signer) {
                    state.subscriptions.remove(&call.subId);
                    receipt.success = true;
                }
                return receipt;
            }
        } else if let Ok(call) = IERC20::approveCall::abi_decode(calldata) {
            state.journal.push(MockOp::Approve {
                tx_hash,
                nonce,
                spender: call.spender,
                amount: call.amount,
            });
            if state.refuse_approvals {
                // Mined fine, but nothing changes and no event is emitted.
                receipt.success = true;
            } else if call.spender != Address::ZERO {
                state.allowances.insert((to, call.spender), call.amount);
                receipt.success = true;
                receipt.logs.push(Log::new_unchecked(
                    to,
                    vec![
                        IERC20::Approval::SIGNATURE_HASH,
                        self.signer.into_word(),
                        call.spender.into_word(),
                    ],
                    Bytes::from(call.amount.to_be_bytes::<32>().to_vec()),
                ));
            }
            return receipt;
        }

        state.journal.push(MockOp::Call { tx_hash, nonce, to });
        receipt
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn signer_address(&self) -> Address {
        self.signer
    }

    async fn send_deploy(&self, init_code: Bytes) -> Result<PendingTransaction> {
        let mut state = self.state();
        let (tx_hash, nonce) = self.next_tx(&mut state)?;
        state.journal.push(MockOp::Deploy { tx_hash, nonce });

        let success = !state.revert_deployments && !init_code.is_empty();
        let contract_address = success.then(|| self.signer.create(nonce));
        if let Some(address) = contract_address {
            state.contracts.insert(address);
        }

        state.receipts.insert(
            tx_hash,
            Receipt {
                transaction_hash: tx_hash,
                success,
                contract_address,
                logs: Vec::new(),
            },
        );
        Ok(PendingTransaction::new(tx_hash))
    }

    async fn send_call(&self, to: Address, calldata: Bytes) -> Result<PendingTransaction> {
        let mut state = self.state();
        let (tx_hash, nonce) = self.next_tx(&mut state)?;
        let receipt = self.execute_call(&mut state, tx_hash, nonce, to, &calldata);
        state.receipts.insert(tx_hash, receipt);
        Ok(PendingTransaction::new(tx_hash))
    }

    async fn wait_for_receipt(&self, pending: PendingTransaction) -> Result<Receipt> {
        let mut state = self.state();
        state.journal.push(MockOp::Awaited {
            tx_hash: pending.tx_hash,
        });
        state.receipts.get(&pending.tx_hash).cloned().ok_or_else(|| {
            SubsError::transport(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unknown transaction {:#x}", pending.tx_hash),
            ))
        })
    }
}
