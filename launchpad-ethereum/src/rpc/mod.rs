use std::time::Duration;

use alloy::{
    primitives::{Address, Bytes, TxHash, U64},
    rpc::{
        client::{ClientBuilder, ReqwestClient},
        types::{BlockNumberOrTag, TransactionInput, TransactionRequest},
    },
    transports::http::reqwest,
};
use serde::Deserialize;
use tracing::{debug, instrument};

pub mod config;
pub mod errors;
pub(crate) mod retry;

use crate::rpc::{
    config::RPCRetryConfig,
    errors::{RPCError, RequestError, RpcResultExt},
    retry::RetryPolicy,
};

/// Upper bound of a single read request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// This struct wraps the ReqwestClient and provides the Ethereum RPC methods a launch needs,
/// with retry logic on every read.
/// It is cheap to clone, as the `inner` internally uses an Arc for the ReqwestClient.
#[derive(Clone, Debug)]
pub struct EthereumRpcClient {
    inner: ReqwestClient,
    /// Used for `eth_sendTransaction` only. The endpoint answers once the account holder has
    /// decided, which may take arbitrarily long, so there is no request timeout.
    signing: ReqwestClient,
    retry_policy: RetryPolicy,
    url: String,
}

fn build_http_client(request_timeout: Option<Duration>) -> Result<reqwest::Client, RPCError> {
    let mut builder = reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .tcp_nodelay(true);
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| RPCError::SetupError(format!("Failed to create HTTP client: {e}")))
}

/// The parts of a block header we read.
#[derive(Debug, Deserialize)]
struct BlockHeaderWrapper {
    number: U64,
    timestamp: U64,
}

/// The parts of a transaction receipt we read.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    /// `0x1` on success, `0x0` on revert. Missing on pre-Byzantium receipts.
    pub status: Option<U64>,
    pub block_number: Option<U64>,
}

impl ReceiptSummary {
    pub fn succeeded(&self) -> bool {
        self.status != Some(U64::ZERO)
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
            .map(|n| n.to::<u64>())
            .unwrap_or_default()
    }
}

impl EthereumRpcClient {
    /// Creates a new EthereumRpcClient with the given RPC URL.
    ///
    /// Retry: enabled with defaults (max retries 3, initial backoff 100ms, max backoff 5000ms).
    pub fn new(rpc_url: &str) -> Result<Self, RPCError> {
        Self::with_request_timeout(rpc_url, REQUEST_TIMEOUT)
    }

    /// Like [`EthereumRpcClient::new`], bounding every request except `eth_sendTransaction` by
    /// `request_timeout`.
    pub fn with_request_timeout(
        rpc_url: &str,
        request_timeout: Duration,
    ) -> Result<Self, RPCError> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| RPCError::SetupError(format!("Invalid RPC URL: {e}")))?;

        let rpc = ClientBuilder::default()
            .http_with_client(build_http_client(Some(request_timeout))?, url.clone());
        let signing = ClientBuilder::default().http_with_client(build_http_client(None)?, url);

        let retry_policy = RPCRetryConfig::default().into();

        Ok(Self { inner: rpc, signing, retry_policy, url: rpc_url.to_string() })
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }

    pub fn get_retry_config(&self) -> RPCRetryConfig {
        (&self.retry_policy).into()
    }

    pub fn with_retry(mut self, retry_config: RPCRetryConfig) -> Self {
        self.retry_policy = retry_config.into();
        self
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn chain_id(&self) -> Result<u64, RPCError> {
        let chain_id: U64 = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request_noparams("eth_chainId")
                    .await
            })
            .await
            .rpc_context("Failed to get chain id")?;

        Ok(chain_id.to::<u64>())
    }

    /// Number and timestamp of the latest block.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_latest_block(&self) -> Result<(u64, u64), RPCError> {
        let full_tx_objects = false;

        let block: Option<BlockHeaderWrapper> = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_getBlockByNumber", (BlockNumberOrTag::Latest, full_tx_objects))
                    .await
            })
            .await
            .rpc_context("Failed to get latest block")?;

        let block = block.ok_or_else(|| {
            RPCError::RequestError(RequestError::Other(
                "Failed to get latest block: Block not found".to_string(),
            ))
        })?;

        Ok((block.number.to::<u64>(), block.timestamp.to::<u64>()))
    }

    /// Executes a new message call immediately without creating a transaction on the blockchain.
    /// See https://ethereum.org/en/developers/docs/apis/json-rpc/#eth_call
    ///
    /// Always evaluated against the latest block.
    #[instrument(level = "debug", skip(self, data))]
    pub async fn eth_call(&self, to: Address, data: Bytes) -> Result<Bytes, RPCError> {
        let request = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(data));
        let block = BlockNumberOrTag::Latest;

        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_call", (&request, block))
                    .await
            })
            .await
            .with_rpc_context(|| format!("Failed to send an eth_call request to {to}"))
    }

    /// Asks the node to sign and broadcast `request` with one of its unlocked accounts.
    ///
    /// Not retried: a failed request may still have been broadcast, and resubmitting it could
    /// execute the same operation twice. Waits as long as the signing account takes to answer.
    #[instrument(level = "debug", skip(self, request), fields(to = ?request.to))]
    pub async fn send_transaction(&self, request: TransactionRequest) -> Result<TxHash, RPCError> {
        let hash: TxHash = self
            .signing
            .request("eth_sendTransaction", (&request,))
            .await
            .rpc_context("Failed to send transaction")?;

        debug!(%hash, "Transaction submitted");
        Ok(hash)
    }

    /// Receipt of `hash`, or `None` while the transaction is not included.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<ReceiptSummary>, RPCError> {
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_getTransactionReceipt", (hash,))
                    .await
            })
            .await
            .with_rpc_context(|| format!("Failed to get receipt for {hash}"))
    }
}
