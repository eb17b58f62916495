//! Maps raw JSON-RPC failures onto the launchpad failure taxonomy.

use alloy::transports::RpcError;
use launchpad_common::errors::{ReadError, SignerError};

use crate::rpc::errors::{extract_error_chain, RPCError};

/// EIP-1193 error code for a request the user declined in the wallet.
pub const USER_REJECTED_CODE: i64 = 4001;
/// Error code geth and most wallets use for `execution reverted`.
pub const EXECUTION_REVERTED_CODE: i64 = 3;

const USER_REJECTED_MESSAGES: [&str; 2] = ["user rejected", "user denied"];
const EXECUTION_REVERTED_MESSAGE: &str = "execution reverted";

/// Classifies a failure of a signer request (`eth_sendTransaction`, receipt polling).
pub fn classify_signer_rpc_error(error: &RPCError) -> SignerError {
    let Some(RpcError::ErrorResp(payload)) = error.alloy_source() else {
        return SignerError::Transport(extract_error_chain(error));
    };

    let message = payload.message.to_lowercase();
    if payload.code == USER_REJECTED_CODE ||
        USER_REJECTED_MESSAGES
            .iter()
            .any(|m| message.contains(m))
    {
        SignerError::Rejected(payload.message.to_string())
    } else if payload.code == EXECUTION_REVERTED_CODE ||
        message.contains(EXECUTION_REVERTED_MESSAGE)
    {
        SignerError::Reverted(payload.message.to_string())
    } else {
        SignerError::Transport(extract_error_chain(error))
    }
}

/// A failed read keeps its full error chain so the caller sees which call failed and why.
pub fn classify_read_error(error: &RPCError) -> ReadError {
    ReadError::Rpc(extract_error_chain(error))
}

#[cfg(test)]
mod tests {
    use alloy::{
        rpc::json_rpc::ErrorPayload,
        transports::{HttpError, TransportErrorKind},
    };
    use rstest::rstest;

    use super::*;

    fn error_resp(code: i64, message: &str) -> RPCError {
        RPCError::from_alloy(
            "Failed to send transaction",
            RpcError::ErrorResp(ErrorPayload {
                code,
                message: message.to_string().into(),
                data: None,
            }),
        )
    }

    #[rstest]
    #[case::eip1193_code(4001, "Request rejected")]
    #[case::metamask_message(-32603, "MetaMask Tx Signature: User denied transaction signature.")]
    #[case::rejected_message(-32000, "User rejected the request.")]
    fn test_user_rejection(#[case] code: i64, #[case] message: &str) {
        let classified = classify_signer_rpc_error(&error_resp(code, message));

        assert_eq!(classified, SignerError::Rejected(message.to_string()));
    }

    #[rstest]
    #[case::revert_code(3, "execution reverted: UniswapV2: PAIR_EXISTS")]
    #[case::revert_message(-32000, "Execution reverted: TransferHelper: TRANSFER_FROM_FAILED")]
    fn test_revert(#[case] code: i64, #[case] message: &str) {
        let classified = classify_signer_rpc_error(&error_resp(code, message));

        assert_eq!(classified, SignerError::Reverted(message.to_string()));
    }

    #[test]
    fn test_other_node_errors_are_transport() {
        let classified = classify_signer_rpc_error(&error_resp(-32000, "nonce too low"));

        assert!(matches!(classified, SignerError::Transport(msg) if msg.contains("nonce too low")));
    }

    #[test]
    fn test_http_failure_is_transport() {
        let error = RPCError::from_alloy(
            "Failed to send transaction",
            RpcError::Transport(TransportErrorKind::HttpError(HttpError {
                status: 502,
                body: "bad gateway".to_string(),
            })),
        );

        assert!(matches!(classify_signer_rpc_error(&error), SignerError::Transport(_)));
    }

    #[test]
    fn test_read_error_keeps_context() {
        let error = error_resp(-32000, "header not found");

        let ReadError::Rpc(msg) = classify_read_error(&error) else {
            panic!("expected an RPC read error");
        };

        assert!(msg.contains("Failed to send transaction"));
        assert!(msg.contains("header not found"));
    }
}
