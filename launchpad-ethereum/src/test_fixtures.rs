//! Common test fixtures and utilities for launchpad-ethereum tests
//!
//! Mocked JSON-RPC endpoints answer by method name, and `eth_call` mocks additionally match on
//! the function selector at the start of the calldata.

use alloy::primitives::{address, Address, U256};
use mockito::{Matcher, Mock, ServerGuard};

// Common Ethereum mainnet contract addresses for testing
pub const OWNER: Address = address!("000000000004444c5dc75cB358380D2e3dE08A90");
pub const TOKEN: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
pub const PAIR: Address = address!("A478c2975Ab1Ea89e8196811F51A7B7Ade33eB11");

/// A 32 byte ABI word holding `value`, without `0x` prefix.
pub fn abi_word(value: U256) -> String {
    format!("{value:064x}")
}

/// A 32 byte ABI word holding `address`, without `0x` prefix.
pub fn abi_address(address: Address) -> String {
    format!("{:0>64}", alloy::primitives::hex::encode(address))
}

/// Mocks a single successful response to `method`. `result` is raw JSON.
pub async fn mock_rpc_result(server: &mut ServerGuard, method: &str, result: &str) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::Regex(format!(r#""method":"{method}""#)))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"jsonrpc":"2.0","id":0,"result":{result}}}"#))
        .create_async()
        .await
}

/// Mocks a JSON-RPC error response to `method`.
pub async fn mock_rpc_error(
    server: &mut ServerGuard,
    method: &str,
    code: i64,
    message: &str,
) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::Regex(format!(r#""method":"{method}""#)))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"jsonrpc":"2.0","id":0,"error":{{"code":{code},"message":"{message}"}}}}"#
        ))
        .create_async()
        .await
}

/// Mocks an `eth_call` to `to` whose calldata starts with `selector`. `words` are the
/// concatenated return words, without `0x` prefix.
pub async fn mock_eth_call(
    server: &mut ServerGuard,
    to: Address,
    selector: [u8; 4],
    words: &str,
) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""method":"eth_call""#.to_string()),
            Matcher::Regex(format!(r#"(?i)"to":"{to}""#)),
            Matcher::Regex(format!(
                r#""input":"0x{}"#,
                alloy::primitives::hex::encode(selector)
            )),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"jsonrpc":"2.0","id":0,"result":"0x{words}"}}"#))
        .create_async()
        .await
}
