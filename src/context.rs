use std::sync::Arc;

use alloy::primitives::Address;

use crate::chain::ChainClient;
use crate::events::EventDecoders;

/// Signing and connection context shared by every component of one flow.
///
/// Built explicitly and passed down, so independent flows (e.g. tests) never
/// share a connection or a nonce sequence by accident.
#[derive(Clone)]
pub struct ClientContext {
    chain: Arc<dyn ChainClient>,
    decoders: EventDecoders,
}

impl ClientContext {
    /// Creates a context using the standard event decoders.
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self {
            chain,
            decoders: EventDecoders::standard(),
        }
    }

    pub fn with_decoders(mut self, decoders: EventDecoders) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    pub fn decoders(&self) -> &EventDecoders {
        &self.decoders
    }

    pub fn signer(&self) -> Address {
        self.chain.signer_address()
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("signer", &self.signer())
            .field("decoders", &self.decoders)
            .finish()
    }
}
