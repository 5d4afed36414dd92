//! ABI surface of the external contracts this client talks to.

use alloy::primitives::{b256, Address, B256, U256};
use alloy::sol;
use alloy::sol_types::SolValue;

sol! {
    /// Subscription contract entry points used by the client.
    interface IOptimisticSubs {
        function subscribe(address subscriber, uint256 amount, uint256 periodCount);
        function unsubscribe(bytes32 subId);
    }

    /// Subset of ERC20 needed to fund a subscription.
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);

        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}

/// topic0 of the `Subscribed` event emitted by `subscribe`.
pub const SUBSCRIBED_SIGNATURE: B256 =
    b256!("4eea731ae1fda3da326d839452cf98ef0b814e2e0c09bc8122100e44c4f0649b");

/// Non-indexed payload of `Subscribed`: `(subId, subscriber, amount, periodCount)`.
pub type SubscribedPayload = (B256, Address, U256, U256);

/// ABI-encodes the constructor arguments
/// `(periodLength, tokenOrRecipient, owner, startTimestamp)`.
pub fn encode_constructor_args(
    period_length_seconds: u64,
    token_or_recipient: Address,
    owner: Address,
    start_timestamp: u64,
) -> Vec<u8> {
    (
        U256::from(period_length_seconds),
        token_or_recipient,
        owner,
        U256::from(start_timestamp),
    )
        .abi_encode_params()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use alloy::sol_types::{SolCall, SolEvent};

    #[test]
    fn test_constructor_args_are_four_words() {
        let encoded = encode_constructor_args(
            691_200,
            address!("85c6Cd5fC71AF35e6941d7b53564AC0A68E09f5C"),
            Address::repeat_byte(0x11),
            1_694_919_024,
        );
        assert_eq!(encoded.len(), 4 * 32);
        assert_eq!(U256::from_be_slice(&encoded[..32]), U256::from(691_200u64));
        assert_eq!(&encoded[44..64], address!("85c6Cd5fC71AF35e6941d7b53564AC0A68E09f5C").as_slice());
        assert_eq!(U256::from_be_slice(&encoded[96..]), U256::from(1_694_919_024u64));
    }

    #[test]
    fn test_approve_selector() {
        // keccak("approve(address,uint256)")[..4]
        assert_eq!(IERC20::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
    }

    #[test]
    fn test_approval_signature() {
        assert_eq!(
            IERC20::Approval::SIGNATURE_HASH,
            b256!("8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925")
        );
    }
}
