//! Failure taxonomy of a launch run.
//!
//! Collaborators report raw failures ([`ReadError`] from chain reads, [`SignerError`] from the
//! signer). The classifier functions in this module fold them into [`LaunchError`], whose
//! [`FailureKind`] is the closed set of outcomes a caller has to handle.

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

use crate::models::StepKind;

/// A chain read that could not complete. Never to be confused with a zero value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("Failed to decode {call} result: {reason}")]
    Decode { call: String, reason: String },
    #[error("Unexpected chain data: {0}")]
    Inconsistent(String),
}

/// Raw failures reported by a [`crate::traits::Signer`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// The account holder declined to sign.
    #[error("Signature request rejected: {0}")]
    Rejected(String),
    /// The node refused the transaction because contract logic would revert.
    #[error("Transaction reverted: {0}")]
    Reverted(String),
    /// The signer endpoint could not be reached or answered with an unexpected error.
    #[error("Signer transport error: {0}")]
    Transport(String),
}

/// Closed set of failure classes surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ReadFailed,
    UserRejected,
    Reverted,
    TimedOut,
    InvalidRequest,
}

impl FailureKind {
    /// Whether the failure can be resolved by querying the ledger again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::ReadFailed | FailureKind::TimedOut)
    }

    /// Whether the caller must change something before starting another run.
    pub fn requires_intervention(&self) -> bool {
        !self.is_retryable()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Chain read failed: {0}")]
    ReadFailed(#[from] ReadError),

    #[error("{step} was rejected at the signer")]
    UserRejected { step: StepKind },

    #[error("{step} reverted: {reason}")]
    Reverted { step: StepKind, reason: String },

    #[error("{step} not observed on chain after {attempts} verification attempts")]
    TimedOut { step: StepKind, attempts: u32 },

    #[error("Invalid pool creation request: {0}")]
    InvalidRequest(String),

    #[error("Run stopped after {steps} steps without reaching a completed state")]
    StepBudgetExhausted { steps: u32 },
}

impl LaunchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LaunchError::ReadFailed(_) => FailureKind::ReadFailed,
            LaunchError::UserRejected { .. } => FailureKind::UserRejected,
            LaunchError::Reverted { .. } => FailureKind::Reverted,
            LaunchError::TimedOut { .. } => FailureKind::TimedOut,
            LaunchError::InvalidRequest(_) => FailureKind::InvalidRequest,
            // The ledger keeps undoing our steps, the inputs need to be looked at again.
            LaunchError::StepBudgetExhausted { .. } => FailureKind::Reverted,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// The step the failure is attributed to, if any.
    pub fn step(&self) -> Option<StepKind> {
        match self {
            LaunchError::UserRejected { step } |
            LaunchError::Reverted { step, .. } |
            LaunchError::TimedOut { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Classifies a failure reported by the signer while running `step`.
///
/// A transport failure before a transaction handle exists means nothing reached the ledger, so
/// it is retryable like any other failed read.
pub fn classify_signer_error(step: StepKind, error: SignerError) -> LaunchError {
    match error {
        SignerError::Rejected(_) => LaunchError::UserRejected { step },
        SignerError::Reverted(reason) => LaunchError::Reverted { step, reason },
        SignerError::Transport(msg) => LaunchError::ReadFailed(ReadError::Rpc(msg)),
    }
}
