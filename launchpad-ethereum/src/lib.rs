//! Ethereum JSON-RPC plumbing for launching liquidity pools: a retrying RPC client, the contract
//! bindings, and the RPC-backed implementations of the launchpad collaborator traits.

pub mod classifier;
pub mod contracts;
pub mod reader;
pub mod rpc;
pub mod signer;
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use reader::RpcChainStateReader;
pub use rpc::{
    config::RPCRetryConfig,
    errors::{RPCError, RequestError},
    EthereumRpcClient,
};
pub use signer::JsonRpcSigner;
