//! RPC retry logic and error classification
//!
//! Transient RPC failures (rate limits, unavailable backends, null responses) are retried with
//! exponential backoff. Everything else, including contract reverts and wallet rejections, is
//! returned on the first occurrence.

use std::{future::Future, time::Duration};

use alloy::{
    rpc::json_rpc::ErrorPayload,
    transports::{RpcError, TransportErrorKind},
};
use backoff::{backoff::Backoff, exponential::ExponentialBackoffBuilder, ExponentialBackoff};
use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::debug;

use crate::rpc::{config::RPCRetryConfig, errors::AlloyError};

/// Extension trait to implement retry logic for [`RpcError<TransportErrorKind>`].
///
/// # Attribution
/// Adapted from alloy-transport:
/// https://github.com/alloy-rs/alloy/blob/a3899575fbc0c789275f95661516b99e9a92838d/crates/transport/src/error.rs#L156
/// License: MIT OR Apache-2.0
pub(crate) trait RpcErrorExt {
    /// Analyzes whether to retry the request depending on the error.
    ///
    /// Returns `true` for transient errors that are likely to succeed on retry:
    /// - Rate limiting (429) errors
    /// - Service unavailable (503) errors
    /// - Null responses
    /// - Certain JSON-RPC error codes
    fn is_retryable(&self) -> bool;

    /// Fetches the backoff hint from the error message if present.
    ///
    /// Some RPC providers (e.g., Infura) include a suggested backoff duration
    /// in their rate limit error responses under `data.rate.backoff_seconds`.
    fn backoff_hint(&self) -> Option<Duration>;
}

impl<E: std::borrow::Borrow<RawValue>> RpcErrorExt for RpcError<TransportErrorKind, E> {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_retry_err(),
            Self::SerError(_) => false,
            Self::DeserError { text, .. } => {
                if let Ok(resp) = serde_json::from_str::<ErrorPayload>(text) {
                    return resp.is_retry_err();
                }

                // some providers send invalid JSON RPC in the error case (no `id:u64`), but the
                // text should be a `JsonRpcError`
                #[derive(Deserialize)]
                struct Resp {
                    error: ErrorPayload,
                }

                if let Ok(resp) = serde_json::from_str::<Resp>(text) {
                    return resp.error.is_retry_err();
                }

                false
            }
            Self::ErrorResp(err) => err.is_retry_err(),
            Self::NullResp => true,
            _ => false,
        }
    }

    fn backoff_hint(&self) -> Option<Duration> {
        if let Self::ErrorResp(resp) = self {
            let data = resp.try_data_as::<serde_json::Value>();
            if let Some(Ok(data)) = data {
                let backoff_seconds = &data["rate"]["backoff_seconds"];
                if let Some(seconds) = backoff_seconds.as_u64() {
                    return Some(Duration::from_secs(seconds));
                }
                // Round decimals up
                if let Some(seconds) = backoff_seconds.as_f64() {
                    return Some(Duration::from_secs(seconds.ceil() as u64));
                }
            }
        }
        None
    }
}

/// Retry behavior for RPC requests: a bounded number of retries spaced by exponential backoff.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    backoff: ExponentialBackoff,
    config: RPCRetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RPCRetryConfig::default().into()
    }
}

impl From<RPCRetryConfig> for RetryPolicy {
    fn from(config: RPCRetryConfig) -> Self {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(config.initial_backoff_ms))
            .with_multiplier(2.0)
            .with_max_interval(Duration::from_millis(config.max_backoff_ms))
            // Retries are bounded by count, not by wall clock.
            .with_max_elapsed_time(None)
            .build();

        Self { backoff, config }
    }
}

impl From<&RetryPolicy> for RPCRetryConfig {
    fn from(policy: &RetryPolicy) -> Self {
        policy.config.clone()
    }
}

impl RetryPolicy {
    /// Creates a retry policy optimized for testing (very short intervals).
    #[cfg(test)]
    pub fn for_testing() -> Self {
        RPCRetryConfig::new(3, 1, 5).into()
    }

    pub fn max_retries(&self) -> usize {
        self.config.max_retries
    }

    /// Executes an RPC request, retrying transient failures.
    ///
    /// A provider supplied backoff hint takes precedence over the exponential schedule.
    pub(crate) async fn retry_request<F, Fut, T>(&self, mut operation: F) -> Result<T, AlloyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AlloyError>>,
    {
        let mut backoff = self.backoff.clone();
        backoff.reset();
        let mut attempt = 0;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if attempt >= self.config.max_retries || !err.is_retryable() {
                return Err(err);
            }

            let Some(delay) = err
                .backoff_hint()
                .or_else(|| backoff.next_backoff())
            else {
                return Err(err);
            };

            attempt += 1;
            debug!(attempt, ?delay, error = %err, "Retrying RPC request after transient failure");
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use alloy::{rpc::client::ClientBuilder, transports::HttpError};
    use mockito::{Mock, ServerGuard};
    use rstest::rstest;
    use serde::de::Error;

    use super::*;

    async fn mock_success(server: &mut ServerGuard) -> Mock {
        server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":0,"result":"0x1"}"#)
            .expect(1)
            .create_async()
            .await
    }

    async fn mock_rate_limited(server: &mut ServerGuard, times: usize) -> Mock {
        server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Any)
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":0,"error":{"code":429,"message":"Too Many Requests"}}"#,
            )
            .expect(times)
            .create_async()
            .await
    }

    #[test]
    fn test_policy_roundtrips_config() {
        let config = RPCRetryConfig::new(7, 200, 10_000);
        let policy: RetryPolicy = config.clone().into();

        assert_eq!(RPCRetryConfig::from(&policy), config);
        assert_eq!(policy.backoff.initial_interval, Duration::from_millis(200));
        assert_eq!(policy.backoff.max_interval, Duration::from_millis(10_000));
        assert_eq!(policy.backoff.max_elapsed_time, None);
    }

    #[test]
    fn test_error_classification_retryable() {
        let rate_limit_err =
            RpcError::<TransportErrorKind>::Transport(TransportErrorKind::HttpError(HttpError {
                status: 429,
                body: "".to_string(),
            }));
        assert!(rate_limit_err.is_retryable());

        let unavailable_err =
            RpcError::<TransportErrorKind>::Transport(TransportErrorKind::HttpError(HttpError {
                status: 503,
                body: "".to_string(),
            }));
        assert!(unavailable_err.is_retryable());

        let null_err = RpcError::<TransportErrorKind>::NullResp;
        assert!(null_err.is_retryable());
    }

    #[rstest]
    #[case::user_rejected(4001, "User rejected the request.")]
    #[case::reverted(3, "execution reverted: UniswapV2: PAIR_EXISTS")]
    #[case::invalid_request(-32600, "Invalid Request")]
    fn test_wallet_and_contract_errors_are_not_retried(#[case] code: i64, #[case] message: &str) {
        let err = RpcError::<TransportErrorKind>::ErrorResp(ErrorPayload {
            code,
            message: message.to_string().into(),
            data: None,
        });

        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_classification_non_retryable() {
        let ser_err =
            RpcError::<TransportErrorKind>::SerError(serde_json::Error::custom("test error"));
        assert!(!ser_err.is_retryable());

        let backend_gone =
            RpcError::<TransportErrorKind>::Transport(TransportErrorKind::BackendGone);
        assert!(!backend_gone.is_retryable());
    }

    #[rstest]
    #[case::integer(10_f64, Duration::from_secs(10))]
    #[case::float(5.7, Duration::from_secs(6))]
    fn test_backoff_hint_extraction(#[case] backoff_value: f64, #[case] duration: Duration) {
        let data_json = serde_json::json!({
            "rate": {
                "backoff_seconds": backoff_value
            }
        });
        let data = serde_json::value::to_raw_value(&data_json).unwrap();

        let error_payload =
            ErrorPayload { code: -32005, message: "Rate limited".into(), data: Some(data) };

        let err = RpcError::ErrorResp(error_payload);

        assert_eq!(err.backoff_hint(), Some(duration));
    }

    #[test]
    fn test_backoff_hint_missing() {
        let error_payload = ErrorPayload { code: -32005, message: "Some error".into(), data: None };

        let err = RpcError::<TransportErrorKind>::ErrorResp(error_payload);

        assert_eq!(err.backoff_hint(), None);
    }

    #[tokio::test]
    async fn test_retry_on_rate_limit_then_succeed() {
        let mut server = mockito::Server::new_async().await;
        let request_count = Arc::new(AtomicUsize::new(0));
        let request_count_clone = request_count.clone();

        let _mock_rate_limit = mock_rate_limited(&mut server, 3).await;
        let _mock_success = mock_success(&mut server).await;

        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let policy = RetryPolicy::for_testing();

        let result = policy
            .retry_request(|| async {
                request_count_clone.fetch_add(1, Ordering::SeqCst);
                client
                    .request_noparams::<String>("eth_chainId")
                    .await
            })
            .await;

        assert_eq!(result.unwrap(), "0x1");
        assert_eq!(
            request_count.load(Ordering::SeqCst),
            4,
            "Expected 4 requests (3 failures + 1 success)"
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mut server = mockito::Server::new_async().await;
        let request_count = Arc::new(AtomicUsize::new(0));
        let request_count_clone = request_count.clone();

        let _mock_rate_limit = mock_rate_limited(&mut server, 4).await;

        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let policy = RetryPolicy::for_testing();

        let result = policy
            .retry_request(|| async {
                request_count_clone.fetch_add(1, Ordering::SeqCst);
                client
                    .request_noparams::<String>("eth_chainId")
                    .await
            })
            .await;

        assert!(result.is_err());
        assert_eq!(request_count.load(Ordering::SeqCst), 1 + policy.max_retries());
    }

    #[tokio::test]
    async fn test_no_retry_on_permanent_error() {
        let mut server = mockito::Server::new_async().await;
        let request_count = Arc::new(AtomicUsize::new(0));
        let request_count_clone = request_count.clone();

        let _mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Any)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32600,"message":"Invalid Request"}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = ClientBuilder::default().http(server.url().parse().unwrap());
        let policy = RetryPolicy::for_testing();

        let result = policy
            .retry_request(|| async {
                request_count_clone.fetch_add(1, Ordering::SeqCst);
                client
                    .request_noparams::<String>("eth_chainId")
                    .await
            })
            .await;

        assert!(result.is_err(), "Expected immediate failure on non-retryable error");
        assert_eq!(request_count.load(Ordering::SeqCst), 1);
    }
}
