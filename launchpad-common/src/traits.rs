use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{ReadError, SignerError},
    models::{PairReserves, TransactionIntent, TxHandle},
};

/// Read-only queries against the ledger.
///
/// Implementations hold no memory between calls: every call reflects the latest state and has
/// no side effects. A failed query must surface as an error, never as a zero value.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ChainStateReader: Send + Sync {
    /// Amount of `token` that `spender` may move on behalf of `owner`.
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ReadError>;

    /// Pair of `token_a` and `token_b` known to `factory`. The zero address means no pair.
    async fn get_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, ReadError>;

    /// Reserves of `pair` in the pair's canonical token order.
    async fn reserves(&self, pair: Address) -> Result<PairReserves, ReadError>;

    /// LP token balance `holder` has in `pair`.
    async fn liquidity_balance(&self, pair: Address, holder: Address) -> Result<U256, ReadError>;

    /// Timestamp of the latest block.
    async fn block_timestamp(&self) -> Result<u64, ReadError>;
}

/// Result of asking the signer whether a transaction made it into the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Inclusion {
    /// Not included yet.
    Pending,
    Confirmed { block_number: u64 },
    /// Included, but contract logic rejected it.
    Reverted { reason: String },
}

/// The external capability that signs and broadcasts transactions. The account holder may take
/// arbitrarily long to answer `submit`.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait Signer: Send + Sync {
    /// Signs and broadcasts `intent`, returning the transaction hash.
    async fn submit(&self, intent: &TransactionIntent) -> Result<TxHandle, SignerError>;

    /// Checks once whether `handle` has been included. Does not block until inclusion.
    async fn wait_for_inclusion(&self, handle: &TxHandle) -> Result<Inclusion, SignerError>;
}
