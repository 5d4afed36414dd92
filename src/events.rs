//! Typed decoding of receipt logs.
//!
//! Receipt logs are never matched by raw bytes outside this module. Each
//! [`LogDecoder`] recognises its own signatures and turns a log into one of
//! the closed set of [`ContractEvent`] variants; consumers filter on that set.

use std::sync::Arc;

use alloy::primitives::{Address, Log, B256, U256};
use alloy::sol_types::{SolEvent, SolValue};

use crate::chain::Receipt;
use crate::contracts::{SubscribedPayload, IERC20, SUBSCRIBED_SIGNATURE};
use crate::types::{SubId, Subscription};

/// ERC20 allowance change observed in a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenApproval {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
}

/// Every event the client knows how to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractEvent {
    Subscribed(Subscription),
    Approval(TokenApproval),
}

impl ContractEvent {
    /// topic0 this variant is emitted under.
    pub fn signature(&self) -> B256 {
        match self {
            Self::Subscribed(_) => SUBSCRIBED_SIGNATURE,
            Self::Approval(_) => IERC20::Approval::SIGNATURE_HASH,
        }
    }
}

/// A decoded log together with where it sat in the receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLog {
    /// Position of the log in the receipt.
    pub index: usize,
    pub emitter: Address,
    pub event: ContractEvent,
}

/// Maps a raw log to a [`ContractEvent`].
///
/// Returns `None` for logs the decoder does not handle, and for logs whose
/// signature it handles but whose payload is malformed (logged as a warning).
pub trait LogDecoder: Send + Sync {
    fn decoder_name(&self) -> &str;

    fn decode_log(&self, log: &Log) -> Option<ContractEvent>;
}

/// Decodes the subscription contract's `Subscribed` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubscriptionDecoder;

impl LogDecoder for SubscriptionDecoder {
    fn decoder_name(&self) -> &str {
        "subscription"
    }

    fn decode_log(&self, log: &Log) -> Option<ContractEvent> {
        if log.topics().first() != Some(&SUBSCRIBED_SIGNATURE) {
            return None;
        }

        match <SubscribedPayload as SolValue>::abi_decode(&log.data.data) {
            Ok((sub_id, subscriber, amount, period_count)) => {
                tracing::trace!(
                    target: "optisubs::events",
                    contract = %log.address,
                    sub_id = %sub_id,
                    "Decoded Subscribed event"
                );
                Some(ContractEvent::Subscribed(Subscription {
                    sub_id: SubId(sub_id),
                    subscriber,
                    amount,
                    period_count,
                }))
            }
            Err(err) => {
                tracing::warn!(
                    target: "optisubs::events",
                    contract = %log.address,
                    data_len = log.data.data.len(),
                    error = %err,
                    "Malformed Subscribed event"
                );
                None
            }
        }
    }
}

/// Decodes ERC20 `Approval`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Erc20Decoder;

impl LogDecoder for Erc20Decoder {
    fn decoder_name(&self) -> &str {
        "erc20"
    }

    fn decode_log(&self, log: &Log) -> Option<ContractEvent> {
        if log.topics().first() != Some(&IERC20::Approval::SIGNATURE_HASH) {
            return None;
        }

        match IERC20::Approval::decode_log_data(&log.data) {
            Ok(approval) => Some(ContractEvent::Approval(TokenApproval {
                token: log.address,
                owner: approval.owner,
                spender: approval.spender,
                value: approval.value,
            })),
            Err(err) => {
                tracing::warn!(
                    target: "optisubs::events",
                    token = %log.address,
                    topics_len = log.topics().len(),
                    error = %err,
                    "Malformed Approval event"
                );
                None
            }
        }
    }
}

/// Runs every registered decoder over receipt logs.
///
/// Decoders are tried in registration order; the first one that recognises a
/// log wins.
#[derive(Clone)]
pub struct EventDecoders {
    decoders: Vec<Arc<dyn LogDecoder>>,
}

impl EventDecoders {
    pub fn new(decoders: Vec<Arc<dyn LogDecoder>>) -> Self {
        Self { decoders }
    }

    /// Decoders for the subscription contract and its fee token.
    pub fn standard() -> Self {
        Self::new(vec![Arc::new(SubscriptionDecoder), Arc::new(Erc20Decoder)])
    }

    pub fn decode_log(&self, log: &Log) -> Option<ContractEvent> {
        self.decoders
            .iter()
            .find_map(|decoder| decoder.decode_log(log))
    }

    /// Decodes all recognised logs of a receipt, preserving emission order.
    pub fn decode_receipt(&self, receipt: &Receipt) -> Vec<DecodedLog> {
        receipt
            .logs
            .iter()
            .enumerate()
            .filter_map(|(index, log)| {
                self.decode_log(log).map(|event| DecodedLog {
                    index,
                    emitter: log.address,
                    event,
                })
            })
            .collect()
    }
}

impl Default for EventDecoders {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for EventDecoders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.decoders.iter().map(|d| d.decoder_name()).collect();
        f.debug_struct("EventDecoders").field("decoders", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, LogData};

    fn subscribed_log(contract: Address, sub: &Subscription) -> Log {
        let payload: SubscribedPayload = (
            sub.sub_id.as_b256(),
            sub.subscriber,
            sub.amount,
            sub.period_count,
        );
        Log::new_unchecked(
            contract,
            vec![SUBSCRIBED_SIGNATURE],
            Bytes::from(payload.abi_encode()),
        )
    }

    fn sample_subscription() -> Subscription {
        Subscription {
            sub_id: SubId(B256::repeat_byte(0xab)),
            subscriber: Address::repeat_byte(0x01),
            amount: U256::from(150_000_000_000_000_000u64),
            period_count: U256::from(2u64),
        }
    }

    #[test]
    fn test_decode_subscribed() {
        let sub = sample_subscription();
        let log = subscribed_log(Address::repeat_byte(0xcc), &sub);

        let event = SubscriptionDecoder.decode_log(&log).unwrap();
        assert_eq!(event, ContractEvent::Subscribed(sub));
        assert_eq!(event.signature(), SUBSCRIBED_SIGNATURE);
    }

    #[test]
    fn test_subscribed_with_short_payload_is_skipped() {
        let log = Log::new_unchecked(
            Address::repeat_byte(0xcc),
            vec![SUBSCRIBED_SIGNATURE],
            Bytes::from(vec![0u8; 40]),
        );
        assert!(SubscriptionDecoder.decode_log(&log).is_none());
    }

    #[test]
    fn test_decode_approval() {
        let owner = Address::repeat_byte(0x01);
        let spender = Address::repeat_byte(0x02);
        let token = Address::repeat_byte(0x03);
        let log = Log {
            address: token,
            data: LogData::new_unchecked(
                vec![
                    IERC20::Approval::SIGNATURE_HASH,
                    owner.into_word(),
                    spender.into_word(),
                ],
                Bytes::from(U256::from(42u64).to_be_bytes::<32>().to_vec()),
            ),
        };

        let event = Erc20Decoder.decode_log(&log).unwrap();
        assert_eq!(
            event,
            ContractEvent::Approval(TokenApproval {
                token,
                owner,
                spender,
                value: U256::from(42u64),
            })
        );
    }

    #[test]
    fn test_unknown_logs_are_ignored() {
        let log = Log::new_unchecked(
            Address::repeat_byte(0xcc),
            vec![B256::repeat_byte(0x99)],
            Bytes::new(),
        );
        let decoders = EventDecoders::standard();
        assert!(decoders.decode_log(&log).is_none());

        let empty = Log::new_unchecked(Address::ZERO, vec![], Bytes::new());
        assert!(decoders.decode_log(&empty).is_none());
    }

    #[test]
    fn test_decode_receipt_keeps_order_and_index() {
        let sub = sample_subscription();
        let contract = Address::repeat_byte(0xcc);
        let receipt = Receipt {
            transaction_hash: B256::repeat_byte(0x10),
            success: true,
            contract_address: None,
            logs: vec![
                Log::new_unchecked(contract, vec![B256::repeat_byte(0x99)], Bytes::new()),
                subscribed_log(contract, &sub),
            ],
        };

        let decoded = EventDecoders::standard().decode_receipt(&receipt);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].index, 1);
        assert_eq!(decoded[0].emitter, contract);
        assert_eq!(decoded[0].event, ContractEvent::Subscribed(sub));
    }

    #[test]
    fn test_debug_lists_decoder_names() {
        let rendered = format!("{:?}", EventDecoders::standard());
        assert!(rendered.contains("subscription"));
        assert!(rendered.contains("erc20"));
    }
}
