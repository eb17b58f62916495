use alloy::{
    primitives::Address,
    rpc::types::{TransactionInput, TransactionRequest},
};
use async_trait::async_trait;
use launchpad_common::{
    errors::SignerError,
    models::{TransactionIntent, TxHandle},
    traits::{Inclusion, Signer},
};
use tracing::{debug, info, instrument};

use crate::{classifier::classify_signer_rpc_error, rpc::EthereumRpcClient};

/// [`Signer`] that delegates signing to the account `from` managed by the JSON-RPC endpoint,
/// e.g. a local node with an unlocked account or a wallet bridge speaking `eth_sendTransaction`.
#[derive(Clone, Debug)]
pub struct JsonRpcSigner {
    client: EthereumRpcClient,
    from: Address,
}

impl JsonRpcSigner {
    pub fn new(client: EthereumRpcClient, from: Address) -> Self {
        Self { client, from }
    }

    pub fn address(&self) -> Address {
        self.from
    }
}

#[async_trait]
impl Signer for JsonRpcSigner {
    #[instrument(level = "debug", skip_all, fields(to = %intent.to, value = %intent.value))]
    async fn submit(&self, intent: &TransactionIntent) -> Result<TxHandle, SignerError> {
        let request = TransactionRequest::default()
            .from(self.from)
            .to(intent.to)
            .value(intent.value)
            .input(TransactionInput::new(intent.data.clone()));

        let hash = self
            .client
            .send_transaction(request)
            .await
            .map_err(|e| classify_signer_rpc_error(&e))?;

        info!(%hash, from = %self.from, "Transaction accepted by signer");
        Ok(hash)
    }

    #[instrument(level = "debug", skip(self))]
    async fn wait_for_inclusion(&self, handle: &TxHandle) -> Result<Inclusion, SignerError> {
        let receipt = self
            .client
            .get_transaction_receipt(*handle)
            .await
            .map_err(|e| classify_signer_rpc_error(&e))?;

        let inclusion = match receipt {
            None => Inclusion::Pending,
            Some(receipt) if receipt.succeeded() => {
                Inclusion::Confirmed { block_number: receipt.block_number() }
            }
            Some(receipt) => Inclusion::Reverted {
                reason: format!("status 0x0 in block {}", receipt.block_number()),
            },
        };
        debug!(?inclusion, "Polled transaction receipt");
        Ok(inclusion)
    }
}
