use std::{error::Error, fmt::Display};

use alloy::transports::{RpcError as AlloyRpcError, TransportErrorKind};
use thiserror::Error;

/// Alloy RPC error type alias for convenience.
pub type AlloyError = AlloyRpcError<TransportErrorKind>;

#[derive(Error, Debug)]
pub struct ReqwestError {
    pub msg: String,
    #[source]
    pub source: AlloyError,
}

impl Display for ReqwestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.msg, self.source)
    }
}

#[derive(Error, Debug)]
pub enum RequestError {
    Reqwest(ReqwestError),
    Other(String),
}

impl Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::Reqwest(e) => write!(f, "{}: {}", e.msg, e.source),
            RequestError::Other(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RPCError {
    #[error("RPC setup error: {0}")]
    SetupError(String),
    #[error("Request error: {0}")]
    RequestError(RequestError),
    #[error("Unknown error: {0}")]
    UnknownError(String),
}

impl RPCError {
    pub(crate) fn from_alloy<S: ToString>(msg: S, error: AlloyError) -> Self {
        RPCError::RequestError(RequestError::Reqwest(ReqwestError {
            msg: msg.to_string(),
            source: error,
        }))
    }

    /// The underlying alloy error, if the failure came from the transport or the node.
    pub fn alloy_source(&self) -> Option<&AlloyError> {
        match self {
            RPCError::RequestError(RequestError::Reqwest(e)) => Some(&e.source),
            _ => None,
        }
    }
}

/// Extension trait for adding RPC context to Results containing Alloy errors.
///
/// Similar to `anyhow::Context`, this trait provides ergonomic error wrapping
/// that converts Alloy RPC errors into `RPCError` with contextual messages.
///
/// # Example
/// ```ignore
/// use crate::rpc::errors::RpcResultExt;
///
/// result.rpc_context("Failed to get chain id")?;
///
/// // Lazily evaluated, avoids the format! on the success path:
/// result.with_rpc_context(|| format!("Failed to call {to}"))?;
/// ```
pub(crate) trait RpcResultExt<T> {
    /// Wraps the error with context, converting it to an `RPCError`.
    fn rpc_context<C: Display>(self, context: C) -> Result<T, RPCError>;

    /// Wraps the error with lazily-evaluated context.
    fn with_rpc_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T, RPCError>;
}

impl<T> RpcResultExt<T> for Result<T, AlloyError> {
    fn rpc_context<C: Display>(self, context: C) -> Result<T, RPCError> {
        self.map_err(|e| RPCError::from_alloy(context.to_string(), e))
    }

    fn with_rpc_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T, RPCError> {
        self.map_err(|e| RPCError::from_alloy(f().to_string(), e))
    }
}

/// Renders an error together with its chain of sources.
pub(crate) fn extract_error_chain(error: &dyn Error) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();

    while let Some(err) = source {
        chain.push(err.to_string());
        source = err.source();
    }

    if chain.len() == 1 {
        chain[0].clone()
    } else {
        format!("{} (caused by: {})", chain[0], chain[1..].join(" -> "))
    }
}
